#![warn(missing_docs)]
//! # doomsday-ui
//!
//! ## Purpose
//! Owns the page lifecycle of the doomsday dashboard: which page is showing,
//! how pages hand over to each other, and what each page renders.
//!
//! ## Responsibilities
//! - Define the [`Page`] contract and the [`Pager`] that sequences pages.
//! - Implement [`LoginPage`] and [`DashboardPage`].
//! - Describe the host capabilities pages rely on ([`Document`],
//!   [`Scheduler`], [`Clock`]) and the typed [`View`] parameters they render.
//!
//! ## Data flow
//! [`Pager::display`] tears the outgoing page down, injects a [`PageContext`]
//! into the incoming page, applies its [`PageSettings`] to the menu, then
//! initializes it. Pages call the API client and ask the pager for the next
//! page through their context.
//!
//! ## Ownership and lifetimes
//! The pager owns the current page through `Rc`. Event handlers and timer
//! callbacks hold `Weak` page references, and contexts hold a `Weak` pager
//! reference, so nothing outlives the pager by accident.
//!
//! ## Error model
//! Pages do not return errors. API failures become page transitions: 401
//! leads back to login with a specific message, anything else with a generic
//! one.
//!
//! ## Concurrency
//! Single UI thread. Each page tracks whether it is active; completions that
//! arrive after teardown are dropped.

mod dashboard;
mod login;
mod pager;
mod view;

use std::rc::Rc;
use std::time::Duration;

use doomsday_client::{Credentials, SessionClient, SessionCookie};
use doomsday_core::Horizon;

pub use dashboard::DashboardPage;
pub use login::{
    CREDENTIALS_MISMATCH_MESSAGE, GENERIC_FAILURE_MESSAGE, LoginPage, SESSION_EXPIRED_MESSAGE,
};
pub use pager::{PageContext, Pager, PagerHandle, PagerState};
pub use view::{BandView, CertificateListView, LoginView, NoCertificatesView, View};

/// Default dashboard refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Regions of the page that pages render into or toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Login form container.
    LoginPanel,
    /// Certificate list container.
    CertificatePanel,
    /// Navigation menu affordance.
    HamburgerMenu,
}

/// User interactions a page can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiEvent {
    /// Login form submitted.
    LoginSubmit,
    /// "Show more/less" toggled on the certificate list.
    ToggleHorizon,
    /// Logout clicked in the menu.
    Logout,
}

/// Handler invoked when a bound [`UiEvent`] fires.
pub type EventHandler = Rc<dyn Fn()>;

/// Host page capabilities: template rendering, visibility and event wiring.
pub trait Document {
    /// Renders `view` into `surface`, replacing its contents.
    fn render(&self, surface: Surface, view: &View);
    /// Shows or hides `surface`.
    fn set_visible(&self, surface: Surface, visible: bool);
    /// Reads the username and password inputs of the login form.
    fn read_login_form(&self) -> Credentials;
    /// Empties the password input.
    fn clear_password_field(&self);
    /// Binds `handler` to `event`, replacing any earlier binding.
    fn bind(&self, event: UiEvent, handler: EventHandler);
    /// Removes the binding for `event`.
    fn unbind(&self, event: UiEvent);
    /// Marks the logout affordance usable or not.
    fn set_logout_available(&self, available: bool);
}

/// Opaque id of a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// One-shot timers on the UI event loop.
pub trait Scheduler {
    /// Runs `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle;
    /// Cancels a pending callback. Unknown or fired handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

/// Wall clock used to band certificates.
pub trait Clock {
    /// Current time in Unix epoch seconds.
    fn now_unix_seconds(&self) -> i64;
}

/// Per-page layout preferences applied by the pager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSettings {
    /// Hide the navigation menu while this page is showing.
    pub hide_hamburger_menu: bool,
}

/// Closed set of page variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Login form.
    Login,
    /// Certificate dashboard.
    Dashboard,
}

/// Lifecycle contract every page implements.
pub trait Page {
    /// Which variant this page is.
    fn kind(&self) -> PageKind;

    /// Layout preferences; the default shows the menu.
    fn settings(&self) -> PageSettings {
        PageSettings::default()
    }

    /// Receives the shared context before [`Page::initialize`].
    fn set_context(&self, context: PageContext);

    /// Binds events, renders, and starts any timers.
    fn initialize(self: Rc<Self>);

    /// Unbinds events, hides the page, and cancels its timers.
    fn teardown(&self);
}

/// Dashboard tuning carried in every [`PageContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Delay between certificate refreshes.
    pub refresh_interval: Duration,
    /// Horizon used by the default (collapsed) certificate view.
    pub horizon: Horizon,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            horizon: Horizon::default(),
        }
    }
}

/// Shared handles every page is built from, minus the pager itself.
#[derive(Clone)]
pub struct PageServices {
    /// Backend API client.
    pub client: SessionClient,
    /// Session token cookie.
    pub session: SessionCookie,
    /// Host page.
    pub document: Rc<dyn Document>,
    /// Timer source.
    pub scheduler: Rc<dyn Scheduler>,
    /// Wall clock.
    pub clock: Rc<dyn Clock>,
    /// Dashboard tuning.
    pub options: DashboardOptions,
}
