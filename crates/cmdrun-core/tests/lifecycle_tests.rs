use chrono::{DateTime, Duration, Utc};
use cmdrun_core::lifecycle::{
    compute_display_duration, decode_timestamp, encode_timestamp, resolve_end_date_from_duration,
};
use cmdrun_core::{DisplayDuration, LifecycleConfig};
use proptest::prelude::*;

// chrono's representable range, in epoch milliseconds, trimmed to stay clear of the edges
const MIN_MS: i64 = -8_210_266_876_800_000;
const MAX_MS: i64 = 8_210_298_412_799_999;

proptest! {
    #[test]
    fn prop_encode_decode_round_trip(ms in MIN_MS..MAX_MS) {
        let t = DateTime::from_timestamp_millis(ms).unwrap();
        let decoded = decode_timestamp(encode_timestamp(t) as f64).unwrap();
        prop_assert_eq!(decoded, t);
    }

    #[test]
    fn prop_duration_survives_end_date_resolution(
        start_ms in 0i64..4_000_000_000_000,
        secs in 1u32..1_000_000,
    ) {
        let start = DateTime::from_timestamp_millis(start_ms).unwrap();
        let end = resolve_end_date_from_duration(start, f64::from(secs)).unwrap().unwrap();
        let shown = compute_display_duration(start, Some(end), Utc::now(), &LifecycleConfig::default());
        prop_assert_eq!(shown, DisplayDuration::Elapsed(f64::from(secs)));
    }
}

#[test]
fn test_fractional_itime_keeps_microseconds() {
    let t = decode_timestamp(1_000.5).unwrap();
    assert_eq!(t.timestamp_micros(), 1_000_500);
}

#[test]
fn test_negative_itime_before_epoch() {
    let t = decode_timestamp(-1_000.0).unwrap();
    assert_eq!(t.timestamp(), -1);
}

#[test]
fn test_open_run_classification_moves_with_now() {
    let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let config = LifecycleConfig::default();

    assert_eq!(
        compute_display_duration(start, None, start + Duration::hours(1), &config),
        DisplayDuration::InProgress
    );
    assert_eq!(
        compute_display_duration(start, None, start + Duration::hours(25), &config),
        DisplayDuration::Timeout
    );
}
