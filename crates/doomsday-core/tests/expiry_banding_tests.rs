//! Integration tests for expiry banding over sorted certificate snapshots.

use doomsday_core::{
    Certificate, CertificateList, Horizon, SECONDS_PER_DAY, bucket_by_expiry, duration_label,
};

const NOW: i64 = 1_750_000_000;

fn days_out(name: &str, days: i64) -> Certificate {
    Certificate::new(name, NOW + days * SECONDS_PER_DAY)
}

#[test]
fn expiry_banding_tests_groups_same_day_and_splits_distant_certificates() {
    let list = CertificateList::from_sorted(vec![
        days_out("a.example.com", 2),
        days_out("b.example.com", 2),
        days_out("c.example.com", 40),
    ]);

    let bands = bucket_by_expiry(&list, NOW, Horizon::default());

    assert_eq!(bands.len(), 2);
    assert_eq!(bands[0].label(), duration_label(1));
    assert_eq!(bands[0].certificates().len(), 2);
    assert_eq!(bands[1].label(), duration_label(39));
    assert_eq!(bands[1].certificates()[0].common_name, "c.example.com");
}

#[test]
fn expiry_banding_tests_every_in_horizon_certificate_lands_in_one_band() {
    let mut certificates = Vec::new();
    for (index, offset_hours) in [1_i64, 5, 30, 31, 70, 200, 500, 900, 2_100, 2_200]
        .into_iter()
        .enumerate()
    {
        certificates.push(Certificate::new(
            format!("host-{index}"),
            NOW + offset_hours * 3_600,
        ));
    }
    let list = CertificateList::from_sorted(certificates);
    let horizon = Horizon::default();

    let bands = bucket_by_expiry(&list, NOW, horizon);

    let banded: Vec<_> = bands
        .iter()
        .flat_map(|band| band.certificates().iter())
        .cloned()
        .collect();
    let expected: Vec<_> = list.expires_within(NOW, horizon).cloned().collect();
    assert_eq!(banded, expected);

    for pair in bands.windows(2) {
        assert!(pair[0].cutoff() <= pair[1].cutoff());
    }
    for band in &bands {
        for certificate in band.certificates() {
            assert!(certificate.not_after <= band.cutoff());
        }
    }
}

#[test]
fn expiry_banding_tests_excludes_certificates_beyond_horizon() {
    let list = CertificateList::from_sorted(vec![
        days_out("soon.example.com", 10),
        days_out("edge.example.com", 90),
        days_out("late.example.com", 91),
    ]);

    let bands = bucket_by_expiry(&list, NOW, Horizon::default());
    let names: Vec<_> = bands
        .iter()
        .flat_map(|band| band.certificates().iter())
        .map(|certificate| certificate.common_name.as_str())
        .collect();

    assert_eq!(names, vec!["soon.example.com", "edge.example.com"]);
}

#[test]
fn expiry_banding_tests_yields_no_bands_for_empty_or_distant_input() {
    assert!(bucket_by_expiry(&CertificateList::default(), NOW, Horizon::default()).is_empty());

    let distant = CertificateList::from_sorted(vec![days_out("far.example.com", 200)]);
    assert!(bucket_by_expiry(&distant, NOW, Horizon::default()).is_empty());
    assert!(bucket_by_expiry(&distant, NOW, Horizon::from_days(30)).is_empty());
}
