//! Read-only commands: one quote with its history, and the board.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use quotewatch_core::domain::quote::QuoteId;
use quotewatch_core::prioritize::{QuoteFilter, QuoteView};
use quotewatch_core::timefmt::time_since;

use super::{run_with_service, CommandResult};

pub fn show(id: Uuid) -> CommandResult {
    run_with_service("show", move |service| async move {
        let history = service.get_quote_with_history(QuoteId(id)).await?;
        let message = format!(
            "quote {} ({}) is {} with {} recorded actions",
            history.quote.id,
            history.quote.client_name,
            history.quote.status.as_str(),
            history.actions.len()
        );
        let data = json!({
            "quote": serde_json::to_value(&history.quote).unwrap_or(Value::Null),
            "actions": serde_json::to_value(&history.actions).unwrap_or(Value::Null),
        });
        Ok((message, Some(data)))
    })
}

pub fn list(all: bool) -> CommandResult {
    let filter = if all { QuoteFilter::All } else { QuoteFilter::Active };
    run_with_service("list", move |service| async move {
        let views = service.list_quotes(filter).await?;
        let rows: Vec<Value> = views.iter().map(board_row).collect();
        let scope = match filter {
            QuoteFilter::Active => "active",
            QuoteFilter::All => "total",
        };
        let message = format!("{} {scope} quotes", views.len());
        Ok((message, Some(Value::Array(rows))))
    })
}

/// One board line: identity plus the derived urgency fields an
/// operator scans for. Timestamps render relative to now.
fn board_row(view: &QuoteView) -> Value {
    let quote = &view.quote;
    let now = Utc::now();
    json!({
        "id": quote.id.to_string(),
        "client_name": quote.client_name,
        "status": view.effective_status.as_str(),
        "is_flagged": quote.is_flagged,
        "assigned_to": quote.assigned_to.as_ref().map(|user| user.0.clone()),
        "next_follow_up": quote.next_follow_up,
        "is_overdue": view.is_overdue,
        "expires_in": view.expiry.text,
        "expiry_warning": view.show_expiry_warning,
        "last_action": time_since(now, quote.last_action_at),
        "follow_up_count": quote.follow_up_count,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use quotewatch_core::domain::quote::{Quote, QuoteId, QuoteStatus, UserId};
    use quotewatch_core::prioritize::{prioritize, QuoteFilter};

    use super::board_row;

    fn pending_quote(now: DateTime<Utc>) -> Quote {
        Quote {
            id: QuoteId::generate(),
            client_name: "Harbor Medical Group".to_string(),
            client_email: None,
            client_phone: None,
            service_type: None,
            source: None,
            date_of_service: None,
            pickup_date: None,
            pickup_location: None,
            dropoff_location: None,
            estimated_amount: None,
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

    #[test]
    fn board_row_surfaces_urgency_fields() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).single().expect("valid ts");
        let mut quote = pending_quote(now);
        quote.is_flagged = true;
        quote.next_follow_up = Some(now - Duration::hours(2));
        quote.expires_at = now + Duration::hours(6);

        let views = prioritize(vec![quote], QuoteFilter::Active, now);
        let row = board_row(&views[0]);

        assert_eq!(row["status"], "PENDING");
        assert_eq!(row["is_flagged"], true);
        assert_eq!(row["is_overdue"], true);
        assert_eq!(row["expires_in"], "6h left");
        assert_eq!(row["expiry_warning"], true);
    }
}
