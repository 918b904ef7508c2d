#![warn(missing_docs)]
//! # doomsday-client
//!
//! ## Purpose
//! Talks to the doomsday backend API on behalf of the dashboard and reduces
//! every way a call can fail to one error shape.
//!
//! ## Responsibilities
//! - Query the backend's auth method (`/v1/info`).
//! - Submit login credentials (`/v1/auth`).
//! - Fetch the certificate inventory (`/v1/cache`).
//! - Read and clear the session cookie.
//!
//! ## Data flow
//! Pages call [`SessionClient`] operations with a completion callback. The
//! client builds an [`ApiRequest`], hands it to an injected [`ApiTransport`],
//! then decodes the [`ApiResponse`] and invokes the callback with either a
//! typed value or an [`ApiError`].
//!
//! ## Ownership and lifetimes
//! The client is cheap to clone; clones share one transport through `Rc`.
//! Everything runs on a single UI thread, so no `Send`/`Sync` bounds apply.
//!
//! ## Error model
//! Transport failures, non-2xx statuses and malformed bodies are classified
//! as [`ApiFailure`] and collapsed into [`ApiError`] `{ message, status }`.
//! Non-HTTP failures carry status `0`. Callers branch on
//! [`ApiError::is_unauthorized`].
//!
//! ## Security and privacy notes
//! Passwords are never logged; [`Credentials`] redacts them in `Debug`.
//!
//! ## Example
//! ```rust
//! use doomsday_client::{ApiError, AuthMethod};
//!
//! assert_eq!(AuthMethod::from_auth_type(Some("Userpass")), AuthMethod::Userpass);
//! assert!(ApiError::new("expired", 401).is_unauthorized());
//! ```

mod cookie;

use std::fmt;
use std::rc::Rc;

use doomsday_core::{Certificate, CertificateList};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use cookie::{
    CookieJar, SESSION_COOKIE_NAME, SessionCookie, cookie_value, expired_cookie_assignment,
};

/// Backend info endpoint.
pub const INFO_PATH: &str = "/v1/info";
/// Backend login endpoint.
pub const AUTH_PATH: &str = "/v1/auth";
/// Backend certificate inventory endpoint.
pub const CACHE_PATH: &str = "/v1/cache";
/// `auth_type` value that enables username/password login.
pub const USERPASS_AUTH_TYPE: &str = "Userpass";

/// Authentication mode advertised by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Backend is open; no login required.
    None,
    /// Backend requires username/password login.
    Userpass,
}

impl AuthMethod {
    /// Maps the backend's `auth_type` field. Anything but `"Userpass"` is
    /// treated as no auth.
    pub fn from_auth_type(auth_type: Option<&str>) -> Self {
        match auth_type {
            Some(USERPASS_AUTH_TYPE) => Self::Userpass,
            _ => Self::None,
        }
    }
}

/// Username/password pair read from the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP method used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl HttpMethod {
    /// Upper-case method token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute endpoint URL.
    pub url: Url,
    /// JSON body, if any.
    pub body: Option<String>,
}

/// Raw HTTP response returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Callback the transport invokes once the request settles.
pub type Completion = Box<dyn FnOnce(Result<ApiResponse, TransportFailure>)>;

/// Abstract HTTP transport used by [`SessionClient`].
///
/// Implementations must not block: `send` returns immediately and the
/// completion runs later on the same thread.
pub trait ApiTransport {
    /// Sends `request` and eventually calls `on_complete` exactly once.
    fn send(&self, request: ApiRequest, on_complete: Completion);
}

/// Classified failure of one API call.
#[derive(Debug, Error)]
pub enum ApiFailure {
    /// Network-level failure; no HTTP status.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportFailure),
    /// Backend answered with a non-2xx status.
    #[error("request failed with status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },
    /// Request body could not be encoded.
    #[error("request encode failure: {0}")]
    Encode(#[source] serde_json::Error),
    /// Response body was not the expected JSON.
    #[error("response decode failure: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiFailure {
    /// HTTP status carried by the failure, `0` when there is none.
    pub fn status(&self) -> u16 {
        match self {
            Self::Http { status } => *status,
            Self::Transport(_) | Self::Encode(_) | Self::Decode(_) => 0,
        }
    }
}

/// The single error shape surfaced by every [`SessionClient`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    /// Human-readable description.
    pub message: String,
    /// HTTP status, or `0` for failures without one.
    pub status: u16,
}

impl ApiError {
    /// Status the backend uses for bad credentials and expired sessions.
    pub const UNAUTHORIZED: u16 = 401;

    /// Creates an error.
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// Returns `true` when the backend rejected the session or credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Self::UNAUTHORIZED
    }
}

impl From<ApiFailure> for ApiError {
    fn from(failure: ApiFailure) -> Self {
        Self {
            status: failure.status(),
            message: failure.to_string(),
        }
    }
}

/// Errors raised while constructing a [`SessionClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL is unparsable or not http(s).
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct InfoResponse {
    #[serde(default)]
    auth_type: Option<String>,
}

#[derive(Deserialize)]
struct CacheResponse {
    #[serde(default)]
    content: Option<Vec<Certificate>>,
}

#[derive(Debug, Clone)]
struct Endpoints {
    info: Url,
    auth: Url,
    cache: Url,
}

/// Client for the doomsday backend API.
#[derive(Clone)]
pub struct SessionClient {
    base_url: Url,
    endpoints: Rc<Endpoints>,
    transport: Rc<dyn ApiTransport>,
}

impl SessionClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidBaseUrl`] when the URL does not parse or
    /// is not `http`/`https`.
    pub fn new(base_url: &str, transport: Rc<dyn ApiTransport>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|error| ClientError::InvalidBaseUrl(format!("{base_url}: {error}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(format!(
                "unsupported scheme {}",
                base_url.scheme()
            )));
        }

        let join = |path: &str| {
            base_url
                .join(path)
                .map_err(|error| ClientError::InvalidBaseUrl(format!("{path}: {error}")))
        };
        let endpoints = Endpoints {
            info: join(INFO_PATH)?,
            auth: join(AUTH_PATH)?,
            cache: join(CACHE_PATH)?,
        };

        Ok(Self {
            base_url,
            endpoints: Rc::new(endpoints),
            transport,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Asks the backend which auth method it uses.
    pub fn query_auth_method<F>(&self, on_done: F)
    where
        F: FnOnce(Result<AuthMethod, ApiError>) + 'static,
    {
        self.call(HttpMethod::Get, self.endpoints.info.clone(), None, move |result| {
            let decoded = result.and_then(|body| {
                serde_json::from_str::<InfoResponse>(&body).map_err(ApiFailure::Decode)
            });
            on_done(
                decoded
                    .map(|info| AuthMethod::from_auth_type(info.auth_type.as_deref()))
                    .map_err(ApiError::from),
            );
        });
    }

    /// Submits credentials. Success leaves no client-side state; the backend
    /// sets the session cookie on the response.
    pub fn login<F>(&self, credentials: Credentials, on_done: F)
    where
        F: FnOnce(Result<(), ApiError>) + 'static,
    {
        let body = serde_json::to_string(&LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        });
        drop(credentials);

        let body = match body {
            Ok(body) => body,
            Err(error) => {
                on_done(Err(ApiError::from(ApiFailure::Encode(error))));
                return;
            }
        };

        self.call(
            HttpMethod::Post,
            self.endpoints.auth.clone(),
            Some(body),
            move |result| on_done(result.map(|_| ()).map_err(ApiError::from)),
        );
    }

    /// Fetches the certificate inventory, sorted by the backend.
    pub fn fetch_certificates<F>(&self, on_done: F)
    where
        F: FnOnce(Result<CertificateList, ApiError>) + 'static,
    {
        self.call(HttpMethod::Get, self.endpoints.cache.clone(), None, move |result| {
            let decoded = result.and_then(|body| {
                serde_json::from_str::<CacheResponse>(&body).map_err(ApiFailure::Decode)
            });
            on_done(
                decoded
                    .map(|cache| CertificateList::from_sorted(cache.content.unwrap_or_default()))
                    .map_err(ApiError::from),
            );
        });
    }

    fn call<F>(&self, method: HttpMethod, url: Url, body: Option<String>, on_done: F)
    where
        F: FnOnce(Result<String, ApiFailure>) + 'static,
    {
        let path = url.path().to_string();
        tracing::debug!(stage = "client", action = "request", %method, path = %path);

        let request = ApiRequest { method, url, body };
        self.transport.send(
            request,
            Box::new(move |outcome| {
                let result = match outcome {
                    Err(failure) => Err(ApiFailure::Transport(failure)),
                    Ok(response) if !response.is_success() => Err(ApiFailure::Http {
                        status: response.status,
                    }),
                    Ok(response) => Ok(response.body),
                };

                if let Err(failure) = &result {
                    tracing::warn!(
                        stage = "client",
                        action = "request_failed",
                        %method,
                        path = %path,
                        status = failure.status(),
                        detail = %failure
                    );
                }

                on_done(result);
            }),
        );
    }
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for failure normalization.

    use super::*;

    #[test]
    fn failures_collapse_to_status_bearing_error() {
        let http = ApiError::from(ApiFailure::Http { status: 503 });
        assert_eq!(http.status, 503);

        let transport = ApiError::from(ApiFailure::Transport(TransportFailure(
            "connection refused".to_string(),
        )));
        assert_eq!(transport.status, 0);
        assert!(transport.message.contains("connection refused"));

        let decode_error = serde_json::from_str::<InfoResponse>("{").err();
        let decode = ApiError::from(ApiFailure::Decode(
            decode_error.expect("truncated json should fail"),
        ));
        assert_eq!(decode.status, 0);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        struct NeverTransport;
        impl ApiTransport for NeverTransport {
            fn send(&self, _request: ApiRequest, _on_complete: Completion) {}
        }

        let transport: Rc<dyn ApiTransport> = Rc::new(NeverTransport);
        assert!(SessionClient::new("ftp://example.test", Rc::clone(&transport)).is_err());
        assert!(SessionClient::new("not a url", Rc::clone(&transport)).is_err());
        assert!(SessionClient::new("https://doomsday.example.test", transport).is_ok());
    }
}
