//! Page controller: one current page, strict teardown-before-initialize.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use doomsday_client::{SessionClient, SessionCookie};

use crate::{Clock, DashboardOptions, Document, Page, PageKind, PageServices, Scheduler, Surface};

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// Nothing displayed yet.
    NoPage,
    /// A page of this kind is current.
    Showing(PageKind),
}

/// Non-owning reference pages use to request transitions.
#[derive(Clone)]
pub struct PagerHandle(Weak<Pager>);

impl PagerHandle {
    /// Displays `page` if the pager is still alive.
    pub fn display(&self, page: Rc<dyn Page>) {
        match self.0.upgrade() {
            Some(pager) => pager.display(page),
            None => tracing::debug!(
                stage = "pager",
                action = "display_dropped",
                to = ?page.kind()
            ),
        }
    }
}

/// Shared handle injected into whichever page is current.
#[derive(Clone)]
pub struct PageContext {
    services: PageServices,
    pager: PagerHandle,
}

impl PageContext {
    /// Backend API client.
    pub fn client(&self) -> &SessionClient {
        &self.services.client
    }

    /// Session token cookie.
    pub fn session(&self) -> &SessionCookie {
        &self.services.session
    }

    /// Host page.
    pub fn document(&self) -> &Rc<dyn Document> {
        &self.services.document
    }

    /// Timer source.
    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.services.scheduler
    }

    /// Wall clock.
    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.services.clock
    }

    /// Dashboard tuning.
    pub fn options(&self) -> DashboardOptions {
        self.services.options
    }

    /// Pager that owns the current page.
    pub fn pager(&self) -> &PagerHandle {
        &self.pager
    }

    /// Asks the pager to replace the current page with `page`.
    pub fn display(&self, page: Rc<dyn Page>) {
        self.pager.display(page);
    }
}

/// Owns the current page and sequences transitions between pages.
pub struct Pager {
    context: PageContext,
    current: RefCell<Option<Rc<dyn Page>>>,
}

impl Pager {
    /// Creates a pager with no page showing.
    pub fn new(services: PageServices) -> Rc<Self> {
        Rc::new_cyclic(|pager| Self {
            context: PageContext {
                services,
                pager: PagerHandle(pager.clone()),
            },
            current: RefCell::new(None),
        })
    }

    /// Context handed to every page.
    pub fn context(&self) -> &PageContext {
        &self.context
    }

    /// Current controller state.
    pub fn state(&self) -> PagerState {
        match self.current.borrow().as_ref() {
            Some(page) => PagerState::Showing(page.kind()),
            None => PagerState::NoPage,
        }
    }

    /// Currently displayed page, if any.
    pub fn current(&self) -> Option<Rc<dyn Page>> {
        self.current.borrow().clone()
    }

    /// Replaces the current page with `page`.
    ///
    /// The outgoing page is torn down before the incoming page sees its
    /// context. No borrow is held while page code runs, so a page may
    /// request another transition from inside `initialize`.
    pub fn display(&self, page: Rc<dyn Page>) {
        let outgoing = self.current.borrow_mut().take();
        tracing::info!(
            stage = "pager",
            action = "display",
            from = ?outgoing.as_ref().map(|page| page.kind()),
            to = ?page.kind()
        );

        if let Some(outgoing) = outgoing {
            outgoing.teardown();
        }

        *self.current.borrow_mut() = Some(Rc::clone(&page));
        page.set_context(self.context.clone());

        let menu_visible = !page.settings().hide_hamburger_menu;
        self.context
            .document()
            .set_visible(Surface::HamburgerMenu, menu_visible);

        page.initialize();
    }
}

impl fmt::Debug for Pager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
