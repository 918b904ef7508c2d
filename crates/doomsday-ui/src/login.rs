//! Login form page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::view::{LoginView, View};
use crate::{DashboardPage, Page, PageContext, PageKind, PageSettings, Surface, UiEvent};

/// Shown after the backend rejects submitted credentials.
pub const CREDENTIALS_MISMATCH_MESSAGE: &str = "The username and password did not match";
/// Shown when an authenticated call reports the session is no longer valid.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired";
/// Shown for every other failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

/// Username/password form with an optional message.
pub struct LoginPage {
    message: Option<String>,
    context: RefCell<Option<PageContext>>,
    active: Cell<bool>,
}

impl LoginPage {
    /// Login page without a message.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::build(None))
    }

    /// Login page that displays `message` above the form.
    pub fn with_message(message: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(Some(message.into())))
    }

    fn build(message: Option<String>) -> Self {
        Self {
            message,
            context: RefCell::new(None),
            active: Cell::new(false),
        }
    }

    /// Message shown above the form, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn context(&self) -> Option<PageContext> {
        self.context.borrow().clone()
    }

    fn submit(page: &Rc<Self>) {
        if !page.active.get() {
            return;
        }
        let Some(context) = page.context() else {
            return;
        };

        let credentials = context.document().read_login_form();
        context.document().clear_password_field();
        tracing::info!(stage = "auth", action = "login_attempt");

        let weak = Rc::downgrade(page);
        let client = context.client().clone();
        client.login(credentials, move |result| {
            if !weak.upgrade().is_some_and(|page| page.active.get()) {
                tracing::debug!(stage = "auth", action = "stale_login_completion");
                return;
            }

            let next: Rc<dyn Page> = match result {
                Ok(()) => {
                    tracing::info!(stage = "auth", action = "login_success");
                    DashboardPage::new()
                }
                Err(error) if error.is_unauthorized() => {
                    tracing::info!(stage = "auth", action = "login_rejected");
                    LoginPage::with_message(CREDENTIALS_MISMATCH_MESSAGE)
                }
                Err(error) => {
                    tracing::warn!(
                        stage = "auth",
                        action = "login_failed",
                        status = error.status,
                        detail = %error.message
                    );
                    LoginPage::with_message(GENERIC_FAILURE_MESSAGE)
                }
            };
            context.display(next);
        });
    }
}

impl Page for LoginPage {
    fn kind(&self) -> PageKind {
        PageKind::Login
    }

    fn settings(&self) -> PageSettings {
        PageSettings {
            hide_hamburger_menu: true,
        }
    }

    fn set_context(&self, context: PageContext) {
        *self.context.borrow_mut() = Some(context);
    }

    fn initialize(self: Rc<Self>) {
        let Some(context) = self.context() else {
            tracing::warn!(stage = "login", action = "initialize_without_context");
            return;
        };
        self.active.set(true);

        let document = context.document();
        document.render(
            Surface::LoginPanel,
            &View::Login(LoginView {
                error_message: self.message.clone(),
            }),
        );

        let weak = Rc::downgrade(&self);
        document.bind(
            UiEvent::LoginSubmit,
            Rc::new(move || {
                if let Some(page) = weak.upgrade() {
                    LoginPage::submit(&page);
                }
            }),
        );
        document.set_visible(Surface::LoginPanel, true);
    }

    fn teardown(&self) {
        self.active.set(false);
        if let Some(context) = self.context() {
            context.document().set_visible(Surface::LoginPanel, false);
            context.document().unbind(UiEvent::LoginSubmit);
        }
    }
}
