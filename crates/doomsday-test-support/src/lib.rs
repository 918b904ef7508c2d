//! In-memory host fakes shared by the ui and app integration tests.
//!
//! The fakes model the browser event loop explicitly: requests wait in a
//! queue until a test completes them, and timers wait until a test fires them.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use doomsday_client::{
    ApiRequest, ApiResponse, ApiTransport, Completion, CookieJar, Credentials, SESSION_COOKIE_NAME,
    SessionClient, SessionCookie, TransportFailure, cookie_value,
};
use doomsday_ui::{
    Clock, DashboardOptions, Document, EventHandler, PageServices, Pager, Scheduler, Surface,
    TimerHandle, UiEvent, View,
};

/// Reference time for every test, in epoch seconds.
pub const NOW: i64 = 1_750_000_000;

/// Base URL the fake client talks to.
pub const TEST_BASE_URL: &str = "https://doomsday.example.test";

/// Transport that parks requests until the test completes them.
#[derive(Default)]
pub struct QueuedTransport {
    pending: RefCell<VecDeque<(ApiRequest, Completion)>>,
    sent: RefCell<Vec<ApiRequest>>,
}

impl QueuedTransport {
    /// Number of requests waiting for a reply.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Paths of requests still waiting, oldest first.
    pub fn pending_paths(&self) -> Vec<String> {
        self.pending
            .borrow()
            .iter()
            .map(|(request, _)| request.url.path().to_string())
            .collect()
    }

    /// Paths of every request sent so far.
    pub fn sent_paths(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }

    /// Completes the oldest pending request with `reply`.
    ///
    /// # Panics
    /// Panics when nothing is pending.
    pub fn complete(&self, reply: Result<ApiResponse, TransportFailure>) -> ApiRequest {
        // Released before the completion runs; it may send the next request.
        let next = self.pending.borrow_mut().pop_front();
        let (request, completion) = next.expect("a request should be pending");
        completion(reply);
        request
    }

    /// Completes the oldest pending request with `status` and `body`.
    pub fn respond(&self, status: u16, body: &str) -> ApiRequest {
        self.complete(Ok(ApiResponse::new(status, body)))
    }
}

impl ApiTransport for QueuedTransport {
    fn send(&self, request: ApiRequest, on_complete: Completion) {
        self.sent.borrow_mut().push(request.clone());
        self.pending.borrow_mut().push_back((request, on_complete));
    }
}

/// Scheduler whose timers only run when a test fires them.
#[derive(Default)]
pub struct ManualScheduler {
    next_id: Cell<u64>,
    timers: RefCell<BTreeMap<u64, (Duration, Box<dyn FnOnce()>)>>,
    cancelled: RefCell<Vec<TimerHandle>>,
}

impl ManualScheduler {
    /// Number of timers still outstanding.
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Delays of the outstanding timers.
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.timers.borrow().values().map(|(delay, _)| *delay).collect()
    }

    /// Handles cancelled so far.
    pub fn cancelled(&self) -> Vec<TimerHandle> {
        self.cancelled.borrow().clone()
    }

    /// Fires every outstanding timer once, oldest first.
    pub fn fire_all(&self) {
        let due = std::mem::take(&mut *self.timers.borrow_mut());
        for (_, (_, callback)) in due {
            callback();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.timers.borrow_mut().insert(id, (delay, callback));
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.cancelled.borrow_mut().push(handle);
        self.timers.borrow_mut().remove(&handle.0);
    }
}

/// One observable document side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// `render(surface, view)`.
    Render(Surface, View),
    /// `set_visible(surface, visible)`.
    Visible(Surface, bool),
    /// `bind(event, _)`.
    Bind(UiEvent),
    /// `unbind(event)`.
    Unbind(UiEvent),
    /// `clear_password_field()`.
    ClearPassword,
    /// `set_logout_available(available)`.
    LogoutAvailable(bool),
}

/// Document that records every call and lets tests fire bound events.
#[derive(Default)]
pub struct RecordingDocument {
    events: RefCell<Vec<DocumentEvent>>,
    handlers: RefCell<HashMap<UiEvent, EventHandler>>,
    username: RefCell<String>,
    password: RefCell<String>,
}

impl RecordingDocument {
    /// Types credentials into the login form.
    pub fn type_credentials(&self, username: &str, password: &str) {
        self.username.replace(username.to_string());
        self.password.replace(password.to_string());
    }

    /// Current password input value.
    pub fn password_field(&self) -> String {
        self.password.borrow().clone()
    }

    /// Fires `event` if something is bound to it. Returns whether it was.
    pub fn trigger(&self, event: UiEvent) -> bool {
        let handler = self.handlers.borrow().get(&event).cloned();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Returns `true` while a handler is bound to `event`.
    pub fn is_bound(&self, event: UiEvent) -> bool {
        self.handlers.borrow().contains_key(&event)
    }

    /// Every recorded side effect.
    pub fn events(&self) -> Vec<DocumentEvent> {
        self.events.borrow().clone()
    }

    /// Most recent view rendered into `surface`.
    pub fn last_render(&self, surface: Surface) -> Option<View> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            DocumentEvent::Render(target, view) if *target == surface => Some(view.clone()),
            _ => None,
        })
    }

    /// Number of renders into `surface`.
    pub fn render_count(&self, surface: Surface) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, DocumentEvent::Render(target, _) if *target == surface))
            .count()
    }

    /// Number of renders into any surface.
    pub fn total_renders(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, DocumentEvent::Render(..)))
            .count()
    }

    /// Latest visibility set for `surface`.
    pub fn is_visible(&self, surface: Surface) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            DocumentEvent::Visible(target, visible) if *target == surface => Some(*visible),
            _ => None,
        })
    }

    /// Latest value passed to `set_logout_available`.
    pub fn logout_available(&self) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            DocumentEvent::LogoutAvailable(available) => Some(*available),
            _ => None,
        })
    }
}

impl Document for RecordingDocument {
    fn render(&self, surface: Surface, view: &View) {
        self.events
            .borrow_mut()
            .push(DocumentEvent::Render(surface, view.clone()));
    }

    fn set_visible(&self, surface: Surface, visible: bool) {
        self.events
            .borrow_mut()
            .push(DocumentEvent::Visible(surface, visible));
    }

    fn read_login_form(&self) -> Credentials {
        Credentials::new(self.username.borrow().clone(), self.password.borrow().clone())
    }

    fn clear_password_field(&self) {
        self.password.replace(String::new());
        self.events.borrow_mut().push(DocumentEvent::ClearPassword);
    }

    fn bind(&self, event: UiEvent, handler: EventHandler) {
        self.handlers.borrow_mut().insert(event, handler);
        self.events.borrow_mut().push(DocumentEvent::Bind(event));
    }

    fn unbind(&self, event: UiEvent) {
        self.handlers.borrow_mut().remove(&event);
        self.events.borrow_mut().push(DocumentEvent::Unbind(event));
    }

    fn set_logout_available(&self, available: bool) {
        self.events
            .borrow_mut()
            .push(DocumentEvent::LogoutAvailable(available));
    }
}

/// Cookie jar over a plain `name=value; ...` string.
///
/// Expiring assignments remove the cookie; others replace or append it.
#[derive(Default)]
pub struct MemoryJar {
    cookies: RefCell<String>,
}

impl MemoryJar {
    /// Replaces the whole cookie string.
    pub fn set(&self, cookies: &str) {
        self.cookies.replace(cookies.to_string());
    }

    /// Raw cookie string.
    pub fn raw(&self) -> String {
        self.cookies.borrow().clone()
    }

    /// Current session token, if non-empty.
    pub fn token(&self) -> Option<String> {
        cookie_value(&self.cookies.borrow(), SESSION_COOKIE_NAME).filter(|value| !value.is_empty())
    }
}

impl CookieJar for MemoryJar {
    fn cookie_string(&self) -> String {
        self.cookies.borrow().clone()
    }

    fn write_cookie(&self, assignment: &str) {
        let Some((name, rest)) = assignment.split_once('=') else {
            return;
        };
        let value = rest.split(';').next().unwrap_or_default();
        let prefix = format!("{name}=");
        let mut cookies: Vec<String> = self
            .cookies
            .borrow()
            .split("; ")
            .filter(|pair| !pair.is_empty() && !pair.starts_with(&prefix))
            .map(str::to_string)
            .collect();
        if !assignment.contains("Expires=Thu, 01 Jan 1970") {
            cookies.push(format!("{name}={value}"));
        }
        self.cookies.replace(cookies.join("; "));
    }
}

/// Clock frozen at a settable instant.
pub struct FixedClock(pub Cell<i64>);

impl FixedClock {
    /// Clock reading `now`.
    pub fn at(now: i64) -> Self {
        Self(Cell::new(now))
    }
}

impl Clock for FixedClock {
    fn now_unix_seconds(&self) -> i64 {
        self.0.get()
    }
}

/// The fakes above, not yet assembled into services.
pub struct Fakes {
    /// Request queue.
    pub transport: Rc<QueuedTransport>,
    /// Manually fired timers.
    pub scheduler: Rc<ManualScheduler>,
    /// Recording document.
    pub document: Rc<RecordingDocument>,
    /// In-memory cookies.
    pub jar: Rc<MemoryJar>,
    /// Clock at [`NOW`].
    pub clock: Rc<FixedClock>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            transport: Rc::new(QueuedTransport::default()),
            scheduler: Rc::new(ManualScheduler::default()),
            document: Rc::new(RecordingDocument::default()),
            jar: Rc::new(MemoryJar::default()),
            clock: Rc::new(FixedClock::at(NOW)),
        }
    }
}

/// Fully wired pager over fresh [`Fakes`].
pub struct Harness {
    /// Pager under test.
    pub pager: Rc<Pager>,
    /// Request queue.
    pub transport: Rc<QueuedTransport>,
    /// Manually fired timers.
    pub scheduler: Rc<ManualScheduler>,
    /// Recording document.
    pub document: Rc<RecordingDocument>,
    /// In-memory cookies.
    pub jar: Rc<MemoryJar>,
    /// Clock at [`NOW`].
    pub clock: Rc<FixedClock>,
}

impl Harness {
    /// Builds a harness with default dashboard options.
    ///
    /// # Panics
    /// Panics if [`TEST_BASE_URL`] is rejected by the client.
    pub fn new() -> Self {
        let fakes = Fakes::default();
        let client = SessionClient::new(TEST_BASE_URL, fakes.transport.clone())
            .expect("client should build");
        let pager = Pager::new(PageServices {
            client,
            session: SessionCookie::new(fakes.jar.clone(), SESSION_COOKIE_NAME),
            document: fakes.document.clone(),
            scheduler: fakes.scheduler.clone(),
            clock: fakes.clock.clone(),
            options: DashboardOptions::default(),
        });

        Self {
            pager,
            transport: fakes.transport,
            scheduler: fakes.scheduler,
            document: fakes.document,
            jar: fakes.jar,
            clock: fakes.clock,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Inventory body with certificates expiring `days` days after [`NOW`].
pub fn inventory_body(days: &[i64]) -> String {
    let content: Vec<serde_json::Value> = days
        .iter()
        .enumerate()
        .map(|(index, days)| {
            serde_json::json!({
                "common_name": format!("host-{index}.example.com"),
                "not_after": NOW + days * 86_400,
                "paths": [{"backend": "vault", "location": format!("secret/host-{index}")}],
            })
        })
        .collect();
    serde_json::json!({ "content": content }).to_string()
}
