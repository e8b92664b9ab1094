use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Seconds between 1900-01-01 (NTP era 0) and 1970-01-01.
pub const NTP_UNIX_DELTA_S: f64 = 2_208_988_800.0;

/// Epoch of the floating-point timestamps carried by samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    #[default]
    Ntp,
    Unix,
}

impl TimeBase {
    pub fn to_unix_seconds(self, seconds: f64) -> f64 {
        match self {
            TimeBase::Ntp => seconds - NTP_UNIX_DELTA_S,
            TimeBase::Unix => seconds,
        }
    }
}

/// Renders a timestamp for diagnostics. Values chrono cannot represent fall back
/// to the raw number so a diagnostic is never lost.
pub fn format_timestamp(seconds: f64, base: TimeBase) -> String {
    let unix = base.to_unix_seconds(seconds);
    if !unix.is_finite() {
        return format!("{seconds}");
    }

    let whole = unix.floor();
    let nanos = ((unix - whole) * 1e9).round().min(999_999_999.0) as u32;
    match DateTime::<Utc>::from_timestamp(whole as i64, nanos) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => format!("{seconds}"),
    }
}
