//! Small conversions between configuration durations and wall-clock instants.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Saturating conversion; durations beyond chrono's range become `TimeDelta::MAX`.
pub fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

/// Earliest instant still inside a lookback of `d` ending at `now`.
pub fn cutoff(now: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(to_delta(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whole minutes in `d`, used for human-facing labels like `[60m +1.00%]`.
pub fn whole_minutes(d: Duration) -> u64 {
    d.as_secs() / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_subtracts_duration() {
        let now = Utc::now();
        let c = cutoff(now, Duration::from_secs(300));
        assert_eq!(now - c, TimeDelta::seconds(300));
    }

    #[test]
    fn huge_durations_saturate() {
        let now = Utc::now();
        assert_eq!(cutoff(now, Duration::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn minutes_label() {
        assert_eq!(whole_minutes(Duration::from_secs(3600)), 60);
        assert_eq!(whole_minutes(Duration::from_secs(59)), 0);
    }
}
