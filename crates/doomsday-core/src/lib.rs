#![warn(missing_docs)]
//! # doomsday-core
//!
//! ## Purpose
//! Defines the pure certificate data model and the expiry banding used by the
//! `doomsday` dashboard.
//!
//! ## Responsibilities
//! - Represent certificates exactly as the inventory endpoint reports them.
//! - Offer a lazy "expiring within" view over a sorted certificate snapshot.
//! - Group certificates into day-sized expiry bands with a label and color.
//!
//! ## Data flow
//! The API client decodes a [`CertificateList`] each poll. The dashboard page
//! calls [`bucket_by_expiry`] with the current time and a [`Horizon`], then
//! hands the resulting [`ExpiryBand`] list to the template renderer.
//!
//! ## Ownership and lifetimes
//! A [`CertificateList`] owns its snapshot. [`ExpiresWithin`] borrows it and
//! never mutates it, so the same snapshot can be re-banded with a different
//! horizon without refetching. Bands own clones of their certificates.
//!
//! ## Error model
//! Every function here is total. Ascending `not_after` order is a caller
//! precondition and is not checked.
//!
//! ## Example
//! ```rust
//! use doomsday_core::{Certificate, CertificateList, Horizon, bucket_by_expiry};
//!
//! let now = 1_000_000;
//! let list = CertificateList::from_sorted(vec![
//!     Certificate::new("a.example.com", now + 2 * 86_400),
//!     Certificate::new("b.example.com", now + 2 * 86_400),
//!     Certificate::new("c.example.com", now + 40 * 86_400),
//! ]);
//!
//! let bands = bucket_by_expiry(&list, now, Horizon::default());
//! assert_eq!(bands.len(), 2);
//! assert_eq!(bands[0].label(), "1 DAY");
//! assert_eq!(bands[1].label(), "5 WEEKS, 4 DAYS");
//! ```

mod color;
mod duration;

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

pub use color::{Rgb, color_for_days};
pub use duration::duration_label;

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Default display horizon: 90 days.
pub const DEFAULT_HORIZON_SECONDS: i64 = 90 * SECONDS_PER_DAY;

/// One place a certificate is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePath {
    /// Name of the storage backend that reported the certificate.
    pub backend: String,
    /// Location of the certificate inside that backend.
    pub location: String,
}

/// Certificate record as reported by the inventory endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Subject common name.
    pub common_name: String,
    /// Expiry time in Unix epoch seconds.
    pub not_after: i64,
    /// Storage locations, in backend order.
    #[serde(rename = "paths", default)]
    pub storage_paths: Vec<StoragePath>,
}

impl Certificate {
    /// Creates a certificate with no storage paths.
    pub fn new(common_name: impl Into<String>, not_after: i64) -> Self {
        Self {
            common_name: common_name.into(),
            not_after,
            storage_paths: Vec::new(),
        }
    }

    /// Appends a storage location.
    pub fn with_path(mut self, backend: impl Into<String>, location: impl Into<String>) -> Self {
        self.storage_paths.push(StoragePath {
            backend: backend.into(),
            location: location.into(),
        });
        self
    }

    /// Signed seconds between `now` and expiry. Negative once expired.
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.not_after.saturating_sub(now)
    }
}

/// How far ahead of `now` certificates are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// Only certificates expiring within this many seconds.
    Within(i64),
    /// Every certificate in the snapshot.
    Unbounded,
}

impl Horizon {
    /// Builds a bounded horizon from whole days.
    pub fn from_days(days: u32) -> Self {
        Self::Within(i64::from(days) * SECONDS_PER_DAY)
    }

    /// Returns `true` when a certificate with `seconds_remaining` is shown.
    pub fn admits(&self, seconds_remaining: i64) -> bool {
        match self {
            Self::Within(limit) => seconds_remaining <= *limit,
            Self::Unbounded => true,
        }
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::Within(DEFAULT_HORIZON_SECONDS)
    }
}

/// Certificate snapshot sorted by ascending `not_after`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateList {
    certificates: Vec<Certificate>,
}

impl CertificateList {
    /// Wraps a snapshot the caller guarantees is sorted by `not_after`.
    pub fn from_sorted(certificates: Vec<Certificate>) -> Self {
        Self { certificates }
    }

    /// Returns the number of certificates in the snapshot.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Returns `true` when the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Iterates the whole snapshot in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }

    /// Returns the snapshot as a slice.
    pub fn as_slice(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Lazily yields certificates whose expiry falls inside `horizon` of
    /// `now`, stopping at the first one that does not.
    pub fn expires_within(&self, now: i64, horizon: Horizon) -> ExpiresWithin<'_> {
        ExpiresWithin {
            remaining: self.certificates.iter(),
            now,
            horizon,
            exhausted: false,
        }
    }
}

impl From<Vec<Certificate>> for CertificateList {
    fn from(certificates: Vec<Certificate>) -> Self {
        Self::from_sorted(certificates)
    }
}

impl<'a> IntoIterator for &'a CertificateList {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy, restartable view returned by [`CertificateList::expires_within`].
///
/// Clone it before consuming to walk the same view twice.
#[derive(Debug, Clone)]
pub struct ExpiresWithin<'a> {
    remaining: std::slice::Iter<'a, Certificate>,
    now: i64,
    horizon: Horizon,
    exhausted: bool,
}

impl<'a> Iterator for ExpiresWithin<'a> {
    type Item = &'a Certificate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        // Sorted input: the first certificate past the horizon ends the view.
        match self.remaining.next() {
            Some(certificate) if self.horizon.admits(certificate.seconds_remaining(self.now)) => {
                Some(certificate)
            }
            _ => {
                self.exhausted = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else {
            (0, Some(self.remaining.len()))
        }
    }
}

impl FusedIterator for ExpiresWithin<'_> {}

/// Group of certificates that share one urgency label and color.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryBand {
    label: String,
    cutoff: i64,
    color: Rgb,
    certificates: Vec<Certificate>,
}

impl ExpiryBand {
    /// Human-readable urgency header, e.g. `"1 WEEK, 2 DAYS"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Latest `not_after` (epoch seconds) that still belongs to this band.
    pub fn cutoff(&self) -> i64 {
        self.cutoff
    }

    /// Band color on the expiry gradient.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Certificates in the band, in input order.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }
}

/// Whole days left before expiry, counting the current partial day as spent.
///
/// Returns `-1` for certificates that have already expired.
pub fn days_remaining(not_after: i64, now: i64) -> i64 {
    let seconds = not_after.saturating_sub(now);
    let whole_days = if seconds <= 0 {
        0
    } else {
        seconds.saturating_add(SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    };
    whole_days - 1
}

/// Groups an ordered certificate sequence into day-sized expiry bands.
///
/// A new band opens whenever a certificate expires after the current band's
/// cutoff; otherwise the certificate joins the current band.
pub fn group_into_bands<'a, I>(certificates: I, now: i64) -> Vec<ExpiryBand>
where
    I: IntoIterator<Item = &'a Certificate>,
{
    let mut bands: Vec<ExpiryBand> = Vec::new();

    for certificate in certificates {
        if let Some(current) = bands
            .last_mut()
            .filter(|current| certificate.not_after <= current.cutoff)
        {
            current.certificates.push(certificate.clone());
            continue;
        }

        let days = days_remaining(certificate.not_after, now);
        bands.push(ExpiryBand {
            label: duration_label(days),
            cutoff: now.saturating_add((days + 1).saturating_mul(SECONDS_PER_DAY)),
            color: color_for_days(days as f64),
            certificates: vec![certificate.clone()],
        });
    }

    bands
}

/// Bands every certificate of `list` that expires within `horizon` of `now`.
///
/// Returns an empty list when nothing falls inside the horizon.
pub fn bucket_by_expiry(list: &CertificateList, now: i64, horizon: Horizon) -> Vec<ExpiryBand> {
    group_into_bands(list.expires_within(now, horizon), now)
}
