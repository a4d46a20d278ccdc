use chrono::{DateTime, Utc};

// ============================================================================
// Countdown / SLA Calculator
// ============================================================================
//
// Pure derived-value functions. Nothing here is cached or persisted; only
// the raw timestamps they are computed from live in the document.
//
// ============================================================================

/// Minutes elapsed since the order's creation timestamp.
///
/// The creation timestamp comes from the remote collection and is opaque;
/// an unparseable value yields 0 rather than failing normalization.
pub fn sla_minutes(created_at: &str, now: DateTime<Utc>) -> i64 {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(created) => ((now - created.with_timezone(&Utc)).num_seconds() / 60).max(0),
        Err(_) => 0,
    }
}

/// Remaining time to a payment deadline, at one-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
    /// Fewer than two whole hours remain.
    pub urgent: bool,
}

pub fn countdown(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Countdown {
    let remaining = (deadline - now).num_seconds();
    if remaining <= 0 {
        return Countdown {
            hours: 0,
            minutes: 0,
            seconds: 0,
            expired: true,
            urgent: true,
        };
    }
    let hours = remaining / 3600;
    Countdown {
        hours,
        minutes: (remaining % 3600) / 60,
        seconds: remaining % 60,
        expired: false,
        urgent: hours < 2,
    }
}

/// Render a minute count the way the operations screens expect it.
pub fn format_duration(minutes: i64) -> String {
    if minutes < 60 {
        format!("{minutes} minutes")
    } else if minutes < 1440 {
        format!("{}:{:02} hours", minutes / 60, minutes % 60)
    } else {
        let days = minutes / 1440;
        let rest = minutes % 1440;
        format!("{} days {}:{:02} hours", days, rest / 60, rest % 60)
    }
}
