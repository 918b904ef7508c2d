#![warn(missing_docs)]
//! # doomsday-app binary
//!
//! Browser entry point for the doomsday dashboard. Native builds print the
//! version and effective configuration.

/// Binary entry point.
fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        web_shell::start();
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::filter::LevelFilter;

        let config = doomsday_app::AppConfig::from_env();
        let level = config
            .as_ref()
            .map(|config| config.log_level)
            .unwrap_or(tracing::Level::INFO);
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
            }))
            .init();

        println!("doomsday-app {}", doomsday_app::app_version());
        match config {
            Ok(config) => {
                println!("api_base_url={} ({})", config.api_base_url, doomsday_app::ENV_API_URL);
                println!(
                    "refresh_seconds={} ({})",
                    config.refresh_interval.as_secs(),
                    doomsday_app::ENV_REFRESH_SECONDS
                );
                println!(
                    "horizon_days={} ({})",
                    config.horizon_days,
                    doomsday_app::ENV_HORIZON_DAYS
                );
                println!("log_level={} ({})", config.log_level, doomsday_app::ENV_LOG_LEVEL);
            }
            Err(error) => {
                tracing::error!(stage = "config", action = "load_failed", detail = %error);
                eprintln!("invalid configuration: {error}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web_shell {
    //! Browser host: fetch transport, `document.cookie`, DOM rendering and
    //! timers behind the page seams.

    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    use doomsday_app::{AppConfig, Host, bootstrap, build_services, redact_sensitive};
    use doomsday_client::{
        ApiRequest, ApiResponse, ApiTransport, Completion, CookieJar, Credentials, HttpMethod,
        TransportFailure,
    };
    use doomsday_ui::{
        Clock, Document, EventHandler, Pager, Scheduler, Surface, TimerHandle, UiEvent, View,
    };
    use gloo_net::http::Request;
    use gloo_timers::callback::Timeout;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Element, HtmlDocument, HtmlElement, HtmlInputElement};

    const LOGIN_ID: &str = "login";
    const CERTS_ID: &str = "certs";
    const HAMBURGER_ID: &str = "hamburger-box";
    const LOGOUT_BUTTON_ID: &str = "logout-button";
    const USERNAME_SELECTOR: &str = "#login-form input[name=username]";
    const PASSWORD_SELECTOR: &str = "#login-form input[name=password]";
    const TOGGLE_SELECTOR: &str = "[data-action=toggle-horizon]";
    const LOGOUT_LABEL: &str = "logout";
    const LOGOUT_DISABLED_LABEL: &str = "auth is turned off";

    #[wasm_bindgen]
    extern "C" {
        /// Template renderer provided by the host page.
        #[wasm_bindgen(js_namespace = doomsday, js_name = renderTemplate)]
        fn render_template(target_id: &str, template: &str, params_json: &str);
    }

    thread_local! {
        static PAGER: RefCell<Option<Rc<Pager>>> = const { RefCell::new(None) };
    }

    fn console_error(message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
    }

    fn html_document() -> Option<web_sys::Document> {
        web_sys::window().and_then(|window| window.document())
    }

    fn log_level(level: tracing::Level) -> log::Level {
        match level {
            tracing::Level::ERROR => log::Level::Error,
            tracing::Level::WARN => log::Level::Warn,
            tracing::Level::INFO => log::Level::Info,
            tracing::Level::DEBUG => log::Level::Debug,
            _ => log::Level::Trace,
        }
    }

    /// Builds the browser host and starts the dashboard.
    ///
    /// `tracing` events reach the console through its `log` bridge, as no
    /// `tracing` subscriber is installed in the browser.
    pub fn start() {
        console_error_panic_hook::set_once();

        let Some(window) = web_sys::window() else {
            console_error("doomsday: no window");
            return;
        };
        let location = window.location();
        let origin = match location.origin() {
            Ok(origin) => origin,
            Err(error) => {
                console_error(&format!("doomsday: no page origin: {error:?}"));
                return;
            }
        };
        let query = location.search().unwrap_or_default();
        let config = AppConfig::for_page(origin.clone(), &query).unwrap_or_else(|error| {
            console_error(&format!("doomsday: ignoring page query: {error}"));
            AppConfig::for_origin(origin)
        });

        if let Err(error) = console_log::init_with_level(log_level(config.log_level)) {
            console_error(&format!("doomsday: console logger unavailable: {error}"));
        }
        tracing::info!(
            stage = "startup",
            action = "configured",
            version = doomsday_app::app_version(),
            api = %config.api_base_url,
            refresh_seconds = config.refresh_interval.as_secs(),
            horizon_days = config.horizon_days
        );

        let host = Host {
            transport: Rc::new(FetchTransport),
            cookies: Rc::new(DocumentCookieJar),
            document: Rc::new(DomDocument::default()),
            scheduler: Rc::new(TimeoutScheduler::default()),
            clock: Rc::new(BrowserClock),
        };
        let services = match build_services(&config, host) {
            Ok(services) => services,
            Err(error) => {
                tracing::error!(stage = "startup", action = "services_failed", detail = %error);
                console_error(&format!("doomsday: {error}"));
                return;
            }
        };

        let pager = bootstrap(services, |outcome| {
            if let Err(error) = outcome {
                console_error("Something went wrong!");
                console_error(&format!("doomsday: {error}"));
            }
        });
        PAGER.with(|slot| *slot.borrow_mut() = Some(pager));
    }

    /// `fetch`-backed transport; completions run on the microtask queue.
    struct FetchTransport;

    impl ApiTransport for FetchTransport {
        fn send(&self, request: ApiRequest, on_complete: Completion) {
            spawn_local(async move {
                on_complete(fetch(request).await);
            });
        }
    }

    async fn fetch(request: ApiRequest) -> Result<ApiResponse, TransportFailure> {
        let url = request.url.as_str();
        let builder = match request.method {
            HttpMethod::Get => Request::get(url),
            HttpMethod::Post => Request::post(url).header("content-type", "application/json"),
        };
        let response = match request.body {
            Some(body) => builder
                .body(body)
                .map_err(|error| TransportFailure(format!("request build failed: {error}")))?
                .send()
                .await,
            None => builder.send().await,
        }
        .map_err(|error| TransportFailure(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| TransportFailure(format!("reading body failed: {error}")))?;
        Ok(ApiResponse::new(status, body))
    }

    /// Reads and writes `document.cookie`.
    struct DocumentCookieJar;

    impl DocumentCookieJar {
        fn document() -> Option<HtmlDocument> {
            html_document().and_then(|document| document.dyn_into::<HtmlDocument>().ok())
        }
    }

    impl CookieJar for DocumentCookieJar {
        fn cookie_string(&self) -> String {
            Self::document()
                .and_then(|document| document.cookie().ok())
                .unwrap_or_default()
        }

        fn write_cookie(&self, assignment: &str) {
            let Some(document) = Self::document() else {
                return;
            };
            if let Err(error) = document.set_cookie(assignment) {
                console_error(&format!(
                    "doomsday: cookie write failed for {}: {error:?}",
                    redact_sensitive(assignment)
                ));
            }
        }
    }

    /// One-shot timers over `setTimeout`.
    #[derive(Default)]
    struct TimeoutScheduler {
        next_id: Cell<u64>,
        pending: RefCell<HashMap<u64, Timeout>>,
        fired: Rc<RefCell<Vec<u64>>>,
    }

    impl TimeoutScheduler {
        // A timeout must not be dropped from inside its own callback.
        fn sweep(&self) {
            let fired: Vec<u64> = self.fired.borrow_mut().drain(..).collect();
            let mut pending = self.pending.borrow_mut();
            for id in fired {
                pending.remove(&id);
            }
        }
    }

    impl Scheduler for TimeoutScheduler {
        fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
            self.sweep();
            let id = self.next_id.get() + 1;
            self.next_id.set(id);

            let fired = Rc::clone(&self.fired);
            let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
            let timeout = Timeout::new(millis, move || {
                fired.borrow_mut().push(id);
                callback();
            });
            self.pending.borrow_mut().insert(id, timeout);
            TimerHandle(id)
        }

        fn cancel(&self, handle: TimerHandle) {
            self.sweep();
            if let Some(timeout) = self.pending.borrow_mut().remove(&handle.0) {
                timeout.cancel();
            }
        }
    }

    /// Wall clock from `Date.now()`.
    struct BrowserClock;

    impl Clock for BrowserClock {
        fn now_unix_seconds(&self) -> i64 {
            (js_sys::Date::now() / 1000.0) as i64
        }
    }

    struct Listener {
        target: Element,
        event: &'static str,
        closure: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl Listener {
        fn detach(&self) {
            let _ = self.target.remove_event_listener_with_callback(
                self.event,
                self.closure.as_ref().unchecked_ref(),
            );
        }
    }

    /// DOM-backed document using the host page's template renderer.
    #[derive(Default)]
    struct DomDocument {
        listeners: RefCell<HashMap<UiEvent, Listener>>,
        // Detached closures may still be on the stack; drop them on next bind.
        retired: RefCell<Vec<Listener>>,
        decorations: RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>>,
    }

    impl DomDocument {
        fn element(id: &str) -> Option<Element> {
            html_document().and_then(|document| document.get_element_by_id(id))
        }

        fn input(selector: &str) -> Option<HtmlInputElement> {
            html_document()
                .and_then(|document| document.query_selector(selector).ok().flatten())
                .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
        }

        fn surface_id(surface: Surface) -> &'static str {
            match surface {
                Surface::LoginPanel => LOGIN_ID,
                Surface::CertificatePanel => CERTS_ID,
                Surface::HamburgerMenu => HAMBURGER_ID,
            }
        }

        fn event_source(event: UiEvent) -> (&'static str, &'static str) {
            match event {
                UiEvent::LoginSubmit => (LOGIN_ID, "submit"),
                UiEvent::ToggleHorizon => (CERTS_ID, "click"),
                UiEvent::Logout => (LOGOUT_BUTTON_ID, "click"),
            }
        }
    }

    impl Document for DomDocument {
        fn render(&self, surface: Surface, view: &View) {
            match view.params_json() {
                Ok(params) => render_template(Self::surface_id(surface), view.template(), &params),
                Err(error) => console_error(&format!("doomsday: render params: {error}")),
            }
        }

        fn set_visible(&self, surface: Surface, visible: bool) {
            let Some(element) = Self::element(Self::surface_id(surface))
                .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };
            let style = element.style();
            let _ = if visible {
                style.remove_property("display").map(|_| ())
            } else {
                style.set_property("display", "none")
            };
        }

        fn read_login_form(&self) -> Credentials {
            let value = |selector: &str| {
                Self::input(selector)
                    .map(|input| input.value())
                    .unwrap_or_default()
            };
            Credentials::new(value(USERNAME_SELECTOR), value(PASSWORD_SELECTOR))
        }

        fn clear_password_field(&self) {
            if let Some(input) = Self::input(PASSWORD_SELECTOR) {
                input.set_value("");
            }
        }

        fn bind(&self, event: UiEvent, handler: EventHandler) {
            self.retired.borrow_mut().clear();
            self.unbind(event);

            let (id, dom_event) = Self::event_source(event);
            let Some(target) = Self::element(id) else {
                console_error(&format!("doomsday: missing #{id} for {event:?}"));
                return;
            };

            let on_event = move |dom: web_sys::Event| {
                if event == UiEvent::ToggleHorizon {
                    let on_toggle = dom
                        .target()
                        .and_then(|target| target.dyn_into::<Element>().ok())
                        .and_then(|element| element.closest(TOGGLE_SELECTOR).ok().flatten())
                        .is_some();
                    if !on_toggle {
                        return;
                    }
                }
                dom.prevent_default();
                handler();
            };
            let closure = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(on_event));
            let _ = target
                .add_event_listener_with_callback(dom_event, closure.as_ref().unchecked_ref());
            self.listeners.borrow_mut().insert(
                event,
                Listener {
                    target,
                    event: dom_event,
                    closure,
                },
            );
        }

        fn unbind(&self, event: UiEvent) {
            let removed = self.listeners.borrow_mut().remove(&event);
            if let Some(listener) = removed {
                listener.detach();
                self.retired.borrow_mut().push(listener);
            }
        }

        fn set_logout_available(&self, available: bool) {
            let Some(button) = Self::element(LOGOUT_BUTTON_ID) else {
                return;
            };
            if available {
                return;
            }

            let classes = button.class_list();
            let _ = classes.add_1("hamburger-menu-button-inactive");
            let _ = classes.remove_2("navbar-button", "hamburger-menu-button");

            let labels = [
                ("mouseover", LOGOUT_DISABLED_LABEL),
                ("mouseout", LOGOUT_LABEL),
            ];
            for (dom_event, label) in labels {
                let target = button.clone();
                let relabel = move |_event: web_sys::Event| target.set_text_content(Some(label));
                let closure = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(relabel));
                let _ = button
                    .add_event_listener_with_callback(dom_event, closure.as_ref().unchecked_ref());
                self.decorations.borrow_mut().push(closure);
            }
        }
    }
}
