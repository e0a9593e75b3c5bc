use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::quote::{Quote, QuoteId, QuoteStatus, UserId};

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).single().expect("valid timestamp")
}

/// A freshly-created pending quote, as the recorder would build it.
pub(crate) fn pending_quote(now: DateTime<Utc>) -> Quote {
    Quote {
        id: QuoteId::generate(),
        client_name: "Harbor Medical Group".to_string(),
        client_email: Some("transport@harbormed.example".to_string()),
        client_phone: None,
        service_type: Some("wheelchair".to_string()),
        source: Some("phone".to_string()),
        date_of_service: None,
        pickup_date: None,
        pickup_location: Some("42 Pier Ave".to_string()),
        dropoff_location: Some("Harbor Medical".to_string()),
        estimated_amount: Some(Decimal::new(8_500, 2)),
        notes: None,
        status: QuoteStatus::Pending,
        outcome: None,
        outcome_reason: None,
        outcome_at: None,
        follow_up_count: 0,
        last_follow_up: None,
        next_follow_up: None,
        last_action_at: Some(now),
        action_count: 1,
        is_flagged: false,
        expires_at: now + Duration::hours(72),
        created_by: UserId("disp-ana".to_string()),
        assigned_to: None,
        created_at: now,
    }
}
