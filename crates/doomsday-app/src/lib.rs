#![warn(missing_docs)]
//! # doomsday-app
//!
//! ## Purpose
//! Starts the doomsday dashboard: reads configuration, asks the backend how
//! it authenticates, and hands the first page to the pager.
//!
//! ## Responsibilities
//! - Load [`AppConfig`] from defaults plus `DOOMSDAY_*` environment variables
//!   (native) or the page query string (browser).
//! - Assemble [`PageServices`] from host capabilities.
//! - Run [`bootstrap`]: auth-mode query, first-page choice, logout wiring.
//! - Provide [`redact_sensitive`] for log lines that may carry secrets.
//!
//! ## Data flow
//! config -> services -> `GET /v1/info` -> `Pager::display(LoginPage |
//! DashboardPage)`. From then on pages drive themselves.
//!
//! ## Error model
//! Configuration and construction failures are [`AppError`] values returned
//! before anything is shown. A failed auth-mode query is fatal: it is logged,
//! reported to the caller, and no page is displayed.
//!
//! ## Security and privacy notes
//! - The session token lives only in the cookie jar; it is never logged.
//! - Cookie strings and request bodies go through [`redact_sensitive`]
//!   before they reach a log line.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use doomsday_client::{
    ApiError, ApiTransport, AuthMethod, ClientError, CookieJar, SESSION_COOKIE_NAME, SessionClient,
    SessionCookie,
};
use doomsday_core::Horizon;
use doomsday_ui::{
    Clock, DEFAULT_REFRESH_INTERVAL, DashboardOptions, DashboardPage, Document, LoginPage, Page,
    PageServices, Pager, Scheduler, UiEvent,
};
use thiserror::Error;
use tracing::Level;
use url::{Url, form_urlencoded};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("DOOMSDAY_VERSION");

/// Backend address used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8111";

/// Days shown by the collapsed dashboard view.
pub const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Env var overriding [`AppConfig::api_base_url`].
pub const ENV_API_URL: &str = "DOOMSDAY_API_URL";
/// Env var overriding [`AppConfig::refresh_interval`], in seconds.
pub const ENV_REFRESH_SECONDS: &str = "DOOMSDAY_REFRESH_SECONDS";
/// Env var overriding [`AppConfig::horizon_days`].
pub const ENV_HORIZON_DAYS: &str = "DOOMSDAY_HORIZON_DAYS";
/// Env var overriding [`AppConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "DOOMSDAY_LOG";

/// Page query parameter overriding [`AppConfig::refresh_interval`], in seconds.
pub const QUERY_REFRESH_SECONDS: &str = "refresh_seconds";
/// Page query parameter overriding [`AppConfig::horizon_days`].
pub const QUERY_HORIZON_DAYS: &str = "horizon_days";
/// Page query parameter overriding [`AppConfig::log_level`].
pub const QUERY_LOG_LEVEL: &str = "log";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Names the overrides are looked up under in one configuration source.
struct OverrideKeys {
    api_url: Option<&'static str>,
    refresh_seconds: &'static str,
    horizon_days: &'static str,
    log_level: &'static str,
}

const ENV_KEYS: OverrideKeys = OverrideKeys {
    api_url: Some(ENV_API_URL),
    refresh_seconds: ENV_REFRESH_SECONDS,
    horizon_days: ENV_HORIZON_DAYS,
    log_level: ENV_LOG_LEVEL,
};

// The API always lives at the page origin; a query parameter must not move it.
const QUERY_KEYS: OverrideKeys = OverrideKeys {
    api_url: None,
    refresh_seconds: QUERY_REFRESH_SECONDS,
    horizon_days: QUERY_HORIZON_DAYS,
    log_level: QUERY_LOG_LEVEL,
};

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend root URL; API paths are joined onto it.
    pub api_base_url: String,
    /// Delay between dashboard refreshes.
    pub refresh_interval: Duration,
    /// Horizon of the collapsed dashboard view, in days.
    pub horizon_days: u32,
    /// Cookie carrying the session token.
    pub session_cookie: String,
    /// Most verbose level written to the log sink.
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            horizon_days: DEFAULT_HORIZON_DAYS,
            session_cookie: SESSION_COOKIE_NAME.to_string(),
            log_level: Level::INFO,
        }
    }
}

impl AppConfig {
    /// Defaults pointed at `origin`, as the browser shell serves the API from
    /// the page origin.
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            api_base_url: origin.into(),
            ..Self::default()
        }
    }

    /// Browser configuration: the API at `origin`, tuning from the page query
    /// string (`?refresh_seconds=30&horizon_days=14&log=debug`).
    ///
    /// A leading `?` is optional. Blank values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the query parameter when a
    /// value does not parse or is zero.
    pub fn for_page(origin: impl Into<String>, query: &str) -> Result<Self, ConfigError> {
        let params: HashMap<String, String> =
            form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect();
        Self::for_origin(origin).with_overrides(&QUERY_KEYS, |key| params.get(key).cloned())
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Applies `DOOMSDAY_*` overrides from `lookup` on top of the defaults.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a value does not parse, is zero, or the
    /// URL is not `http`/`https`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(&ENV_KEYS, lookup)
    }

    fn with_overrides<F>(mut self, keys: &OverrideKeys, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = keys.api_url.and_then(&read) {
            if !is_http_endpoint(&url) {
                return Err(ConfigError::InvalidApiUrl(url));
            }
            self.api_base_url = url;
        }
        if let Some(raw) = read(keys.refresh_seconds) {
            let seconds = parse_positive::<u64>(keys.refresh_seconds, &raw)?;
            self.refresh_interval = Duration::from_secs(seconds);
        }
        if let Some(raw) = read(keys.horizon_days) {
            self.horizon_days = parse_positive::<u32>(keys.horizon_days, &raw)?;
        }
        if let Some(raw) = read(keys.log_level) {
            self.log_level = raw.parse::<Level>().map_err(|_| ConfigError::InvalidValue {
                name: keys.log_level,
                value: raw.clone(),
            })?;
        }
        Ok(self)
    }

    /// Dashboard tuning derived from this config.
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            refresh_interval: self.refresh_interval,
            horizon: Horizon::from_days(self.horizon_days),
        }
    }
}

fn parse_positive<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Returns `true` when `endpoint` parses as an `http` or `https` URL.
pub fn is_http_endpoint(endpoint: &str) -> bool {
    Url::parse(endpoint)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Host capabilities the app is assembled from.
pub struct Host {
    /// HTTP transport.
    pub transport: Rc<dyn ApiTransport>,
    /// Cookie storage.
    pub cookies: Rc<dyn CookieJar>,
    /// Page renderer and event source.
    pub document: Rc<dyn Document>,
    /// Timer source.
    pub scheduler: Rc<dyn Scheduler>,
    /// Wall clock.
    pub clock: Rc<dyn Clock>,
}

/// Builds the shared page services from `config` and `host`.
///
/// # Errors
/// Returns [`AppError::Client`] when the API base URL is unusable.
pub fn build_services(config: &AppConfig, host: Host) -> Result<PageServices, AppError> {
    let client = SessionClient::new(&config.api_base_url, host.transport)?;
    Ok(PageServices {
        client,
        session: SessionCookie::new(host.cookies, config.session_cookie.clone()),
        document: host.document,
        scheduler: host.scheduler,
        clock: host.clock,
        options: config.dashboard_options(),
    })
}

/// Starts the dashboard on `services` and returns its pager.
///
/// The auth-mode query runs asynchronously. When it succeeds the logout
/// affordance is wired and the first page displayed; when it fails nothing is
/// shown. `on_ready` receives the outcome either way. The caller keeps the
/// returned pager alive; a dropped pager turns the reply into a no-op.
pub fn bootstrap<F>(services: PageServices, on_ready: F) -> Rc<Pager>
where
    F: FnOnce(Result<AuthMethod, AppError>) + 'static,
{
    let client = services.client.clone();
    let pager = Pager::new(services);
    let weak = Rc::downgrade(&pager);

    tracing::info!(stage = "bootstrap", action = "query_auth_method", version = APP_VERSION);
    client.query_auth_method(move |result| {
        let auth = match result {
            Ok(auth) => auth,
            Err(error) => {
                tracing::error!(
                    stage = "bootstrap",
                    action = "auth_query_failed",
                    status = error.status,
                    detail = %error.message
                );
                on_ready(Err(AppError::AuthQuery(error)));
                return;
            }
        };

        let Some(pager) = weak.upgrade() else {
            tracing::debug!(stage = "bootstrap", action = "pager_dropped");
            return;
        };

        wire_logout(&pager, auth);

        let has_token = pager.context().session().has_token();
        let first: Rc<dyn Page> = if auth == AuthMethod::Userpass && !has_token {
            LoginPage::new()
        } else {
            DashboardPage::new()
        };
        tracing::info!(
            stage = "bootstrap",
            action = "first_page",
            auth = ?auth,
            has_token,
            page = ?first.kind()
        );
        pager.display(first);
        on_ready(Ok(auth));
    });

    pager
}

fn wire_logout(pager: &Pager, auth: AuthMethod) {
    let context = pager.context();
    let document = context.document();

    if auth == AuthMethod::None {
        document.set_logout_available(false);
        return;
    }

    document.set_logout_available(true);
    let session = context.session().clone();
    let handle = context.pager().clone();
    document.bind(
        UiEvent::Logout,
        Rc::new(move || {
            tracing::info!(stage = "auth", action = "logout");
            session.clear();
            handle.display(LoginPage::new());
        }),
    );
}

/// Redacts values of secret-looking `key=value` / `key: value` fields.
///
/// Fields are separated by `;`, `&`, `,` or newlines; a field is secret when
/// its key mentions a password, token, cookie, secret or authorization.
pub fn redact_sensitive(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut field = String::new();

    for c in input.chars() {
        if matches!(c, ';' | '&' | ',' | '\n') {
            output.push_str(&redact_field(&field));
            output.push(c);
            field.clear();
        } else {
            field.push(c);
        }
    }
    output.push_str(&redact_field(&field));
    output
}

fn redact_field(field: &str) -> String {
    const MARKERS: [&str; 5] = ["password", "token", "cookie", "secret", "authorization"];

    let Some(split) = field.find(['=', ':']) else {
        return field.to_string();
    };
    let key = field[..split].to_ascii_lowercase();
    if MARKERS.iter().any(|marker| key.contains(marker)) {
        format!("{}<redacted>", &field[..=split])
    } else {
        field.to_string()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// API URL is not an http(s) URL.
    #[error("DOOMSDAY_API_URL must be an http(s) url, got {0:?}")]
    InvalidApiUrl(String),
    /// Numeric setting is malformed or zero, or a log level is unknown.
    #[error("{name} has an unusable value {value:?}")]
    InvalidValue {
        /// Variable or query parameter name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// App startup error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// API client could not be built.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    /// Backend auth-mode query failed.
    #[error("auth mode query failed: {0}")]
    AuthQuery(ApiError),
}
