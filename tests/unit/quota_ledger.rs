//! File-backed quota ledger

use places_downloader::quota::{
    current_month, ApiCategory, ApiUsage, FileQuotaLedger, QuotaCounters, QuotaError, QuotaLedger,
};

fn usage(nearby: u64, details: u64, photos: u64) -> ApiUsage {
    let mut usage = ApiUsage::default();
    for _ in 0..nearby {
        usage.record(ApiCategory::NearbySearch);
    }
    for _ in 0..details {
        usage.record(ApiCategory::PlaceDetails);
    }
    for _ in 0..photos {
        usage.record(ApiCategory::PlacePhoto);
    }
    usage
}

#[test]
fn test_runs_accumulate_within_month() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileQuotaLedger::new(dir.path().join("usage.dat"));
    let month = current_month();

    ledger.record(&usage(1, 3, 0), month).unwrap();
    ledger.record(&usage(2, 5, 7), month).unwrap();
    let totals = ledger.record(&usage(0, 0, 1), month).unwrap();

    assert_eq!(
        totals,
        QuotaCounters {
            nearby_search_calls: 3,
            place_details_calls: 8,
            place_photo_calls: 8,
            last_reset_month: month,
        }
    );

    // A fresh handle sees the same values
    let reopened = FileQuotaLedger::new(ledger.path());
    assert_eq!(reopened.load().unwrap(), totals);
}

#[test]
fn test_new_month_starts_from_zero() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = FileQuotaLedger::new(dir.path().join("usage.dat"));

    ledger.record(&usage(4, 40, 12), 1).unwrap();
    let totals = ledger.record(&usage(1, 2, 3), 2).unwrap();

    assert_eq!(totals.nearby_search_calls, 1);
    assert_eq!(totals.place_details_calls, 2);
    assert_eq!(totals.place_photo_calls, 3);
    assert_eq!(totals.last_reset_month, 2);
}

#[test]
fn test_ledger_created_in_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("usage.dat");
    let ledger = FileQuotaLedger::new(&path);

    ledger.record(&usage(1, 0, 0), 3).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("NEARBY=1"));
    assert!(text.contains("LASTDATE=3"));
}

#[test]
fn test_malformed_ledger_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.dat");
    std::fs::write(&path, "NEARBY=1\nREVIEWS=many\nPHOTOS=0\nLASTDATE=2").unwrap();
    let ledger = FileQuotaLedger::new(&path);

    let result = ledger.record(&usage(1, 1, 1), 2);

    assert!(matches!(result, Err(QuotaError::InvalidValue { ref key, .. }) if key == "REVIEWS"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "NEARBY=1\nREVIEWS=many\nPHOTOS=0\nLASTDATE=2"
    );
}

#[test]
fn test_out_of_range_month_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.dat");
    std::fs::write(&path, "NEARBY=1\nREVIEWS=1\nPHOTOS=1\nLASTDATE=13").unwrap();

    assert!(matches!(
        FileQuotaLedger::new(&path).load(),
        Err(QuotaError::InvalidMonth(13))
    ));
}
