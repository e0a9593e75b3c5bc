//! Human-readable elapsed/remaining time buckets.
//!
//! The exact bucket boundaries drive urgency-based sorting and the
//! expiry warnings dispatchers see, so they are fixed contract, not
//! presentation detail. All buckets floor; nothing rounds up.

use chrono::{DateTime, Utc};

/// Remaining-time summary for a quote's expiry window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpiryInfo {
    pub text: String,
    pub urgent: bool,
    pub expired: bool,
}

/// Formats how long ago `t` happened, relative to `now`.
///
/// `None` renders as "Never". Anything a week old or older renders as
/// the plain calendar date.
pub fn time_since(now: DateTime<Utc>, t: Option<DateTime<Utc>>) -> String {
    let Some(t) = t else {
        return "Never".to_string();
    };

    let elapsed = now.signed_duration_since(t);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let days = elapsed.num_days();
    if days < 7 {
        return format!("{days}d ago");
    }

    t.format("%Y-%m-%d").to_string()
}

/// Summarizes time remaining until `expires_at`.
///
/// Under one hour is always urgent; under twelve hours is urgent; a
/// day or more is not. `now >= expires_at` reports expired.
pub fn time_until_expiry(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> ExpiryInfo {
    if now >= expires_at {
        return ExpiryInfo { text: "Expired".to_string(), urgent: true, expired: true };
    }

    let remaining = expires_at.signed_duration_since(now);
    let hours = remaining.num_hours();
    if hours < 1 {
        let minutes = remaining.num_minutes();
        return ExpiryInfo { text: format!("{minutes}m left"), urgent: true, expired: false };
    }
    if hours < 24 {
        return ExpiryInfo { text: format!("{hours}h left"), urgent: hours < 12, expired: false };
    }

    let days = hours / 24;
    ExpiryInfo { text: format!("{days}d left"), urgent: false, expired: false }
}
