//! Lifecycle and duration computations
//!
//! Everything here is a pure function of its arguments; the caller supplies
//! `now` so that classification is reproducible.

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::config::LifecycleConfig;
use crate::errors::{CmdRunError, Result};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Display state of a command run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayDuration {
    /// Run finished; elapsed seconds with sub-second precision
    Elapsed(f64),
    /// Run never finished and is older than the timeout threshold
    Timeout,
    InProgress,
}

impl DisplayDuration {
    pub const TIMEOUT_LABEL: &'static str = "Timeout";
    pub const IN_PROGRESS_LABEL: &'static str = "In progress";

    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            DisplayDuration::Elapsed(secs) => Some(*secs),
            DisplayDuration::Timeout | DisplayDuration::InProgress => None,
        }
    }
}

/// Serialized as a bare number or one of the two sentinel strings
impl Serialize for DisplayDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DisplayDuration::Elapsed(secs) => serializer.serialize_f64(*secs),
            DisplayDuration::Timeout => serializer.serialize_str(Self::TIMEOUT_LABEL),
            DisplayDuration::InProgress => serializer.serialize_str(Self::IN_PROGRESS_LABEL),
        }
    }
}

/// Milliseconds since the UTC epoch
pub fn encode_timestamp(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

/// Parse an epoch-millisecond wire value
///
/// Fractional milliseconds are kept to microsecond precision.
///
/// # Errors
///
/// `InvalidTimestamp` if `ms` is not finite or falls outside the range
/// chrono can represent.
pub fn decode_timestamp(ms: f64) -> Result<DateTime<Utc>> {
    if !ms.is_finite() {
        return Err(CmdRunError::InvalidTimestamp {
            reason: format!("{} is not a finite number", ms),
        });
    }

    if ms.fract() == 0.0 && ms >= i64::MIN as f64 && ms < i64::MAX as f64 {
        return DateTime::from_timestamp_millis(ms as i64).ok_or_else(|| {
            CmdRunError::InvalidTimestamp {
                reason: format!("{} is out of range", ms),
            }
        });
    }

    let micros = (ms * 1000.0).round();
    if micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return Err(CmdRunError::InvalidTimestamp {
            reason: format!("{} is out of range", ms),
        });
    }

    DateTime::from_timestamp_micros(micros as i64).ok_or_else(|| CmdRunError::InvalidTimestamp {
        reason: format!("{} is out of range", ms),
    })
}

/// Classify a run as finished, timed out or still in progress
pub fn compute_display_duration(
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> DisplayDuration {
    if let Some(end) = end_date {
        return DisplayDuration::Elapsed(seconds_between(start_date, end));
    }

    if now - start_date > config.timeout() {
        DisplayDuration::Timeout
    } else {
        DisplayDuration::InProgress
    }
}

/// `end - start` in fractional seconds
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / MICROS_PER_SECOND,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Turn a supplied duration into an end date
///
/// Returns `Ok(None)` for a zero duration, which leaves the end date untouched.
///
/// # Errors
///
/// `ValidationError` on `duration` if it is negative, not finite, or pushes
/// the end date out of range.
pub fn resolve_end_date_from_duration(
    start_date: DateTime<Utc>,
    duration_secs: f64,
) -> Result<Option<DateTime<Utc>>> {
    if duration_secs == 0.0 {
        return Ok(None);
    }
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(CmdRunError::validation(
            "duration",
            format!("{} is not a non-negative number of seconds", duration_secs),
        ));
    }

    let micros = (duration_secs * MICROS_PER_SECOND).round();
    if micros >= i64::MAX as f64 {
        return Err(CmdRunError::validation("duration", "duration is too large"));
    }

    start_date
        .checked_add_signed(Duration::microseconds(micros as i64))
        .map(Some)
        .ok_or_else(|| CmdRunError::validation("duration", "end date out of range"))
}
