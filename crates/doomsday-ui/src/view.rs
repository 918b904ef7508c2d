//! Typed template parameters handed to the renderer.

use doomsday_core::{Certificate, ExpiryBand};
use serde::Serialize;

/// Login form parameters (`login-page` template).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginView {
    /// Message shown above the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One expiry band as the `cert-list-group` template consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandView {
    /// Urgency header.
    pub header: String,
    /// Band cutoff in epoch seconds.
    pub cutoff: i64,
    /// CSS color, `#rrggbb`.
    pub color: String,
    /// Certificates in the band.
    pub certs: Vec<Certificate>,
}

impl From<&ExpiryBand> for BandView {
    fn from(band: &ExpiryBand) -> Self {
        Self {
            header: band.label().to_string(),
            cutoff: band.cutoff(),
            color: band.color().to_hex(),
            certs: band.certificates().to_vec(),
        }
    }
}

/// Certificate list parameters (`cert-list-group` template).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateListView {
    /// Bands, most urgent first.
    pub lists: Vec<BandView>,
    /// Whether the unbounded ("show more") view is active.
    pub show_all: bool,
}

impl CertificateListView {
    /// Builds the view from freshly computed bands.
    pub fn from_bands(bands: &[ExpiryBand], show_all: bool) -> Self {
        Self {
            lists: bands.iter().map(BandView::from).collect(),
            show_all,
        }
    }
}

/// Parameters for the empty state (`no-certs-page` template).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoCertificatesView {
    /// Whether the unbounded ("show more") view is active.
    pub show_all: bool,
}

/// Everything a page can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Login form.
    Login(LoginView),
    /// Non-empty certificate list.
    CertificateList(CertificateListView),
    /// No certificate falls inside the horizon.
    NoCertificates(NoCertificatesView),
}

impl View {
    /// Template the renderer should use.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Login(_) => "login-page",
            Self::CertificateList(_) => "cert-list-group",
            Self::NoCertificates(_) => "no-certs-page",
        }
    }

    /// Serializes the template parameters.
    ///
    /// # Errors
    /// Returns the serializer error; plain data never fails in practice.
    pub fn params_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Login(params) => serde_json::to_string(params),
            Self::CertificateList(params) => serde_json::to_string(params),
            Self::NoCertificates(params) => serde_json::to_string(params),
        }
    }
}

#[cfg(test)]
mod tests {
    use doomsday_core::{CertificateList, Horizon, bucket_by_expiry};

    use super::*;

    #[test]
    fn login_params_omit_absent_message() {
        let view = View::Login(LoginView::default());
        assert_eq!(view.template(), "login-page");
        assert_eq!(view.params_json().expect("serializes"), "{}");

        let view = View::Login(LoginView {
            error_message: Some("Your session has expired".to_string()),
        });
        assert_eq!(
            view.params_json().expect("serializes"),
            r#"{"error_message":"Your session has expired"}"#
        );
    }

    #[test]
    fn band_params_use_template_field_names() {
        let now = 1_000_000;
        let list =
            CertificateList::from_sorted(vec![Certificate::new("a.example.com", now + 3_600)]);
        let bands = bucket_by_expiry(&list, now, Horizon::default());
        let view = View::CertificateList(CertificateListView::from_bands(&bands, false));

        let params: serde_json::Value =
            serde_json::from_str(&view.params_json().expect("serializes")).expect("valid json");
        assert_eq!(params["lists"][0]["header"], "NOW");
        assert_eq!(params["lists"][0]["cutoff"], now + 86_400);
        assert_eq!(params["lists"][0]["color"], "#e53545");
        assert_eq!(params["lists"][0]["certs"][0]["common_name"], "a.example.com");
        assert_eq!(params["show_all"], false);
    }
}
