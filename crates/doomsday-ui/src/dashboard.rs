//! Certificate dashboard page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use doomsday_core::{CertificateList, Horizon, bucket_by_expiry};

use crate::login::{GENERIC_FAILURE_MESSAGE, SESSION_EXPIRED_MESSAGE};
use crate::view::{CertificateListView, NoCertificatesView, View};
use crate::{LoginPage, Page, PageContext, PageKind, Surface, TimerHandle, UiEvent};

/// Polls the certificate inventory and renders expiry bands.
pub struct DashboardPage {
    context: RefCell<Option<PageContext>>,
    active: Cell<bool>,
    refresh_timer: Cell<Option<TimerHandle>>,
    horizon: Cell<Option<Horizon>>,
    snapshot: RefCell<Option<CertificateList>>,
}

impl DashboardPage {
    /// Creates an inactive dashboard page.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            context: RefCell::new(None),
            active: Cell::new(false),
            refresh_timer: Cell::new(None),
            horizon: Cell::new(None),
            snapshot: RefCell::new(None),
        })
    }

    /// Horizon of the current view; `None` before initialization.
    pub fn horizon(&self) -> Option<Horizon> {
        self.horizon.get()
    }

    /// Returns `true` while a refresh timer is outstanding.
    pub fn has_pending_refresh(&self) -> bool {
        self.refresh_timer.get().is_some()
    }

    fn context(&self) -> Option<PageContext> {
        self.context.borrow().clone()
    }

    fn refresh(page: &Rc<Self>) {
        let Some(context) = page.context() else {
            return;
        };

        let weak = Rc::downgrade(page);
        let client = context.client().clone();
        client.fetch_certificates(move |result| {
            let Some(page) = weak.upgrade().filter(|page| page.active.get()) else {
                tracing::debug!(stage = "dashboard", action = "stale_refresh_completion");
                return;
            };

            match result {
                Ok(list) => {
                    tracing::debug!(
                        stage = "dashboard",
                        action = "refreshed",
                        certificates = list.len()
                    );
                    page.snapshot.replace(Some(list));
                    page.render();
                    DashboardPage::schedule_refresh(&page);
                }
                Err(error) if error.is_unauthorized() => {
                    tracing::info!(stage = "dashboard", action = "session_expired");
                    context.session().clear();
                    context.display(LoginPage::with_message(SESSION_EXPIRED_MESSAGE));
                }
                Err(error) => {
                    tracing::warn!(
                        stage = "dashboard",
                        action = "refresh_failed",
                        status = error.status,
                        detail = %error.message
                    );
                    context.display(LoginPage::with_message(GENERIC_FAILURE_MESSAGE));
                }
            }
        });
    }

    fn schedule_refresh(page: &Rc<Self>) {
        let Some(context) = page.context() else {
            return;
        };

        let weak = Rc::downgrade(page);
        let scheduler = context.scheduler();
        let handle = scheduler.schedule(
            context.options().refresh_interval,
            Box::new(move || {
                let Some(page) = weak.upgrade() else {
                    return;
                };
                page.refresh_timer.set(None);
                if page.active.get() {
                    DashboardPage::refresh(&page);
                }
            }),
        );

        // One outstanding timer per page.
        if let Some(previous) = page.refresh_timer.replace(Some(handle)) {
            scheduler.cancel(previous);
        }
    }

    fn render(&self) {
        let Some(context) = self.context() else {
            return;
        };
        let snapshot = self.snapshot.borrow();
        let Some(list) = snapshot.as_ref() else {
            return;
        };

        let horizon = self.horizon.get().unwrap_or(context.options().horizon);
        let show_all = horizon == Horizon::Unbounded;
        let now = context.clock().now_unix_seconds();
        let bands = bucket_by_expiry(list, now, horizon);

        let view = if bands.is_empty() {
            View::NoCertificates(NoCertificatesView { show_all })
        } else {
            View::CertificateList(CertificateListView::from_bands(&bands, show_all))
        };

        let document = context.document();
        document.render(Surface::CertificatePanel, &view);
        document.set_visible(Surface::CertificatePanel, true);
    }

    fn toggle_horizon(&self) {
        if !self.active.get() {
            return;
        }
        let Some(context) = self.context() else {
            return;
        };

        let collapsed = context.options().horizon;
        let next = match self.horizon.get() {
            Some(Horizon::Unbounded) => collapsed,
            _ => Horizon::Unbounded,
        };
        tracing::debug!(stage = "dashboard", action = "toggle_horizon", horizon = ?next);
        self.horizon.set(Some(next));
        self.render();
    }
}

impl Page for DashboardPage {
    fn kind(&self) -> PageKind {
        PageKind::Dashboard
    }

    fn set_context(&self, context: PageContext) {
        *self.context.borrow_mut() = Some(context);
    }

    fn initialize(self: Rc<Self>) {
        let Some(context) = self.context() else {
            tracing::warn!(stage = "dashboard", action = "initialize_without_context");
            return;
        };
        self.active.set(true);
        self.horizon.set(Some(context.options().horizon));

        let document = context.document();
        let weak = Rc::downgrade(&self);
        document.bind(
            UiEvent::ToggleHorizon,
            Rc::new(move || {
                if let Some(page) = weak.upgrade() {
                    page.toggle_horizon();
                }
            }),
        );
        document.set_visible(Surface::CertificatePanel, true);

        DashboardPage::refresh(&self);
    }

    fn teardown(&self) {
        self.active.set(false);
        let Some(context) = self.context() else {
            return;
        };

        if let Some(handle) = self.refresh_timer.take() {
            context.scheduler().cancel(handle);
        }
        context.document().unbind(UiEvent::ToggleHorizon);
        context.document().set_visible(Surface::CertificatePanel, false);
    }
}
