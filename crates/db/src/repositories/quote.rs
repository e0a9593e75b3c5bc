use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use quotewatch_core::domain::action::{ActionId, ActionType, QuoteAction};
use quotewatch_core::domain::quote::{Outcome, Quote, QuoteId, QuoteStatus, UserId};
use quotewatch_core::store::{QuoteStore, StoreError};

use crate::DbPool;

/// SQLite-backed quote store. Every mutation runs inside one
/// transaction so the quote row and its appended action land (or
/// fail) together.
pub struct SqlQuoteStore {
    pool: DbPool,
}

impl SqlQuoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const INSERT_QUOTE: &str = "INSERT INTO quote (\
     id, client_name, client_email, client_phone, service_type, source, \
     date_of_service, pickup_date, pickup_location, dropoff_location, \
     estimated_amount, notes, status, outcome, outcome_reason, outcome_at, \
     follow_up_count, last_follow_up, next_follow_up, last_action_at, \
     action_count, is_flagged, expires_at, created_by, assigned_to, created_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_QUOTE: &str = "UPDATE quote SET \
     client_name = ?, client_email = ?, client_phone = ?, service_type = ?, \
     source = ?, date_of_service = ?, pickup_date = ?, pickup_location = ?, \
     dropoff_location = ?, estimated_amount = ?, notes = ?, status = ?, \
     outcome = ?, outcome_reason = ?, outcome_at = ?, follow_up_count = ?, \
     last_follow_up = ?, next_follow_up = ?, last_action_at = ?, \
     action_count = ?, is_flagged = ?, assigned_to = ? \
     WHERE id = ? AND action_count = ?";

const INSERT_ACTION: &str = "INSERT INTO quote_action \
     (id, quote_id, action_type, notes, actor, created_at) \
     VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_QUOTE: &str = "SELECT * FROM quote WHERE id = ?";
const SELECT_ALL_QUOTES: &str = "SELECT * FROM quote ORDER BY rowid";
const SELECT_ACTIONS: &str =
    "SELECT * FROM quote_action WHERE quote_id = ? ORDER BY rowid";

#[async_trait]
impl QuoteStore for SqlQuoteStore {
    async fn insert(&self, quote: Quote, created: QuoteAction) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        sqlx::query(INSERT_QUOTE)
            .bind(quote.id.to_string())
            .bind(&quote.client_name)
            .bind(&quote.client_email)
            .bind(&quote.client_phone)
            .bind(&quote.service_type)
            .bind(&quote.source)
            .bind(quote.date_of_service)
            .bind(quote.pickup_date)
            .bind(&quote.pickup_location)
            .bind(&quote.dropoff_location)
            .bind(quote.estimated_amount.map(|amount| amount.to_string()))
            .bind(&quote.notes)
            .bind(quote.status.as_str())
            .bind(quote.outcome.map(Outcome::as_str))
            .bind(&quote.outcome_reason)
            .bind(quote.outcome_at)
            .bind(i64::from(quote.follow_up_count))
            .bind(quote.last_follow_up)
            .bind(quote.next_follow_up)
            .bind(quote.last_action_at)
            .bind(i64::from(quote.action_count))
            .bind(quote.is_flagged)
            .bind(quote.expires_at)
            .bind(&quote.created_by.0)
            .bind(quote.assigned_to.as_ref().map(|user| user.0.clone()))
            .bind(quote.created_at)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        append_action(&mut tx, &created).await?;
        tx.commit().await.map_err(unavailable)
    }

    async fn fetch(&self, id: QuoteId) -> Result<Option<Quote>, StoreError> {
        let row = sqlx::query(SELECT_QUOTE)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.map(|row| quote_from_row(&row)).transpose()
    }

    async fn actions_for(&self, id: QuoteId) -> Result<Vec<QuoteAction>, StoreError> {
        let rows = sqlx::query(SELECT_ACTIONS)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(action_from_row).collect()
    }

    async fn update(
        &self,
        quote: Quote,
        expected_action_count: u32,
        appended: Option<QuoteAction>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let result = sqlx::query(UPDATE_QUOTE)
            .bind(&quote.client_name)
            .bind(&quote.client_email)
            .bind(&quote.client_phone)
            .bind(&quote.service_type)
            .bind(&quote.source)
            .bind(quote.date_of_service)
            .bind(quote.pickup_date)
            .bind(&quote.pickup_location)
            .bind(&quote.dropoff_location)
            .bind(quote.estimated_amount.map(|amount| amount.to_string()))
            .bind(&quote.notes)
            .bind(quote.status.as_str())
            .bind(quote.outcome.map(Outcome::as_str))
            .bind(&quote.outcome_reason)
            .bind(quote.outcome_at)
            .bind(i64::from(quote.follow_up_count))
            .bind(quote.last_follow_up)
            .bind(quote.next_follow_up)
            .bind(quote.last_action_at)
            .bind(i64::from(quote.action_count))
            .bind(quote.is_flagged)
            .bind(quote.assigned_to.as_ref().map(|user| user.0.clone()))
            .bind(quote.id.to_string())
            .bind(i64::from(expected_action_count))
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            // Distinguish a stale snapshot from a row that never existed.
            let exists = sqlx::query("SELECT 1 FROM quote WHERE id = ?")
                .bind(quote.id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(unavailable)?;
            return Err(match exists {
                Some(_) => {
                    StoreError::Conflict(format!("quote {} changed since it was read", quote.id))
                }
                None => StoreError::Corrupted(format!("update of unknown quote {}", quote.id)),
            });
        }

        if let Some(action) = &appended {
            append_action(&mut tx, action).await?;
        }
        tx.commit().await.map_err(unavailable)
    }

    async fn list_all(&self) -> Result<Vec<Quote>, StoreError> {
        let rows = sqlx::query(SELECT_ALL_QUOTES)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(quote_from_row).collect()
    }
}

async fn append_action(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    action: &QuoteAction,
) -> Result<(), StoreError> {
    sqlx::query(INSERT_ACTION)
        .bind(action.id.0.to_string())
        .bind(action.quote_id.to_string())
        .bind(action.action_type.as_str())
        .bind(&action.notes)
        .bind(&action.actor.0)
        .bind(action.created_at)
        .execute(&mut **tx)
        .await
        .map_err(unavailable)?;
    Ok(())
}

fn unavailable(error: sqlx::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

fn corrupted(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupted(format!("column `{column}`: {detail}"))
}

fn quote_from_row(row: &SqliteRow) -> Result<Quote, StoreError> {
    let id: String = row.try_get("id").map_err(|e| corrupted("id", e))?;
    let id = QuoteId(Uuid::parse_str(&id).map_err(|e| corrupted("id", e))?);

    let status: String = row.try_get("status").map_err(|e| corrupted("status", e))?;
    let status = QuoteStatus::parse(&status)
        .ok_or_else(|| corrupted("status", format!("unknown status `{status}`")))?;

    let outcome: Option<String> = row.try_get("outcome").map_err(|e| corrupted("outcome", e))?;
    let outcome = outcome
        .map(|value| {
            Outcome::parse(&value)
                .ok_or_else(|| corrupted("outcome", format!("unknown outcome `{value}`")))
        })
        .transpose()?;

    let estimated_amount: Option<String> =
        row.try_get("estimated_amount").map_err(|e| corrupted("estimated_amount", e))?;
    let estimated_amount = estimated_amount
        .map(|value| Decimal::from_str(&value).map_err(|e| corrupted("estimated_amount", e)))
        .transpose()?;

    let follow_up_count: i64 =
        row.try_get("follow_up_count").map_err(|e| corrupted("follow_up_count", e))?;
    let action_count: i64 =
        row.try_get("action_count").map_err(|e| corrupted("action_count", e))?;

    Ok(Quote {
        id,
        client_name: row.try_get("client_name").map_err(|e| corrupted("client_name", e))?,
        client_email: row.try_get("client_email").map_err(|e| corrupted("client_email", e))?,
        client_phone: row.try_get("client_phone").map_err(|e| corrupted("client_phone", e))?,
        service_type: row.try_get("service_type").map_err(|e| corrupted("service_type", e))?,
        source: row.try_get("source").map_err(|e| corrupted("source", e))?,
        date_of_service: row
            .try_get("date_of_service")
            .map_err(|e| corrupted("date_of_service", e))?,
        pickup_date: row.try_get("pickup_date").map_err(|e| corrupted("pickup_date", e))?,
        pickup_location: row
            .try_get("pickup_location")
            .map_err(|e| corrupted("pickup_location", e))?,
        dropoff_location: row
            .try_get("dropoff_location")
            .map_err(|e| corrupted("dropoff_location", e))?,
        estimated_amount,
        notes: row.try_get("notes").map_err(|e| corrupted("notes", e))?,
        status,
        outcome,
        outcome_reason: row
            .try_get("outcome_reason")
            .map_err(|e| corrupted("outcome_reason", e))?,
        outcome_at: row.try_get("outcome_at").map_err(|e| corrupted("outcome_at", e))?,
        follow_up_count: u32::try_from(follow_up_count)
            .map_err(|e| corrupted("follow_up_count", e))?,
        last_follow_up: row
            .try_get("last_follow_up")
            .map_err(|e| corrupted("last_follow_up", e))?,
        next_follow_up: row
            .try_get("next_follow_up")
            .map_err(|e| corrupted("next_follow_up", e))?,
        last_action_at: row
            .try_get("last_action_at")
            .map_err(|e| corrupted("last_action_at", e))?,
        action_count: u32::try_from(action_count).map_err(|e| corrupted("action_count", e))?,
        is_flagged: row.try_get("is_flagged").map_err(|e| corrupted("is_flagged", e))?,
        expires_at: row.try_get("expires_at").map_err(|e| corrupted("expires_at", e))?,
        created_by: UserId(row.try_get("created_by").map_err(|e| corrupted("created_by", e))?),
        assigned_to: row
            .try_get::<Option<String>, _>("assigned_to")
            .map_err(|e| corrupted("assigned_to", e))?
            .map(UserId),
        created_at: row.try_get("created_at").map_err(|e| corrupted("created_at", e))?,
    })
}

fn action_from_row(row: &SqliteRow) -> Result<QuoteAction, StoreError> {
    let id: String = row.try_get("id").map_err(|e| corrupted("id", e))?;
    let quote_id: String = row.try_get("quote_id").map_err(|e| corrupted("quote_id", e))?;
    let action_type: String =
        row.try_get("action_type").map_err(|e| corrupted("action_type", e))?;

    Ok(QuoteAction {
        id: ActionId(Uuid::parse_str(&id).map_err(|e| corrupted("id", e))?),
        quote_id: QuoteId(Uuid::parse_str(&quote_id).map_err(|e| corrupted("quote_id", e))?),
        action_type: ActionType::parse(&action_type)
            .ok_or_else(|| corrupted("action_type", format!("unknown type `{action_type}`")))?,
        notes: row.try_get("notes").map_err(|e| corrupted("notes", e))?,
        actor: UserId(row.try_get("actor").map_err(|e| corrupted("actor", e))?),
        created_at: row.try_get("created_at").map_err(|e| corrupted("created_at", e))?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use quotewatch_core::domain::action::{ActionType, QuoteAction};
    use quotewatch_core::domain::quote::{Quote, QuoteId, QuoteStatus, UserId};
    use quotewatch_core::store::{QuoteStore, StoreError};

    use super::SqlQuoteStore;
    use crate::{connect_with_settings, migrations};

    async fn store() -> SqlQuoteStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlQuoteStore::new(pool)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).single().expect("valid timestamp")
    }

    fn pending_quote() -> Quote {
        Quote {
            id: QuoteId::generate(),
            client_name: "Harbor Medical Group".to_string(),
            client_email: Some("transport@harbormed.example".to_string()),
            client_phone: None,
            service_type: Some("wheelchair".to_string()),
            source: Some("phone".to_string()),
            date_of_service: None,
            pickup_date: Some(now() + Duration::days(2)),
            pickup_location: Some("42 Pier Ave".to_string()),
            dropoff_location: Some("Harbor Medical".to_string()),
            estimated_amount: Some(Decimal::new(8_500, 2)),
            notes: Some("call before 5pm".to_string()),
            status: QuoteStatus::Pending,
            outcome: None,
            outcome_reason: None,
            outcome_at: None,
            follow_up_count: 0,
            last_follow_up: None,
            next_follow_up: Some(now() + Duration::days(1)),
            last_action_at: Some(now()),
            action_count: 1,
            is_flagged: false,
            expires_at: now() + Duration::hours(72),
            created_by: UserId("disp-ana".to_string()),
            assigned_to: None,
            created_at: now(),
        }
    }

    fn created_action(quote: &Quote) -> QuoteAction {
        QuoteAction::new(
            quote.id,
            ActionType::Created,
            None,
            quote.created_by.clone(),
            quote.created_at,
        )
    }

    #[tokio::test]
    async fn insert_then_fetch_round_trips_every_field() {
        let store = store().await;
        let quote = pending_quote();
        store.insert(quote.clone(), created_action(&quote)).await.expect("insert");

        let fetched = store.fetch(quote.id).await.expect("fetch").expect("present");
        assert_eq!(fetched, quote);
    }

    #[tokio::test]
    async fn fetch_of_unknown_id_is_none() {
        let store = store().await;
        let missing = store.fetch(QuoteId::generate()).await.expect("fetch");
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn update_persists_quote_and_appends_action_atomically() {
        let store = store().await;
        let mut quote = pending_quote();
        store.insert(quote.clone(), created_action(&quote)).await.expect("insert");

        quote.status = QuoteStatus::FollowingUp;
        quote.action_count = 2;
        quote.last_action_at = Some(now() + Duration::hours(1));
        let called = QuoteAction::new(
            quote.id,
            ActionType::Called,
            Some("left voicemail".to_string()),
            UserId("disp-ana".to_string()),
            now() + Duration::hours(1),
        );
        store.update(quote.clone(), 1, Some(called.clone())).await.expect("update");

        let fetched = store.fetch(quote.id).await.expect("fetch").expect("present");
        assert_eq!(fetched, quote);

        let actions = store.actions_for(quote.id).await.expect("actions");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_type, ActionType::Created);
        assert_eq!(actions[1], called);
    }

    #[tokio::test]
    async fn update_of_unknown_quote_is_rejected() {
        let store = store().await;
        let quote = pending_quote();
        let error = store.update(quote, 1, None).await.expect_err("no such row");
        assert!(matches!(error, StoreError::Corrupted(_)));
    }

    #[tokio::test]
    async fn update_from_a_stale_snapshot_is_a_conflict_and_writes_nothing() {
        let store = store().await;
        let quote = pending_quote();
        store.insert(quote.clone(), created_action(&quote)).await.expect("insert");

        let mut first = quote.clone();
        first.action_count = 2;
        let winning = QuoteAction::new(
            quote.id,
            ActionType::Called,
            Some("left voicemail".to_string()),
            UserId("disp-ana".to_string()),
            now() + Duration::minutes(1),
        );
        store.update(first.clone(), 1, Some(winning)).await.expect("first writer wins");

        let mut second = quote.clone();
        second.action_count = 2;
        second.status = QuoteStatus::FollowingUp;
        let losing = QuoteAction::new(
            quote.id,
            ActionType::Emailed,
            Some("sent rate sheet".to_string()),
            UserId("disp-bo".to_string()),
            now() + Duration::minutes(2),
        );
        let error = store.update(second, 1, Some(losing)).await.expect_err("stale snapshot");
        assert!(matches!(error, StoreError::Conflict(_)));

        let stored = store.fetch(quote.id).await.expect("fetch").expect("present");
        assert_eq!(stored, first, "losing write leaves the row untouched");
        assert_eq!(store.actions_for(quote.id).await.expect("actions").len(), 2);
    }

    #[tokio::test]
    async fn list_all_returns_quotes_in_insertion_order() {
        let store = store().await;
        let first = pending_quote();
        let second = pending_quote();
        for quote in [&first, &second] {
            store.insert(quote.clone(), created_action(quote)).await.expect("insert");
        }

        let ids: Vec<_> =
            store.list_all().await.expect("list").into_iter().map(|quote| quote.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn actions_keep_append_order_across_many_updates() {
        let store = store().await;
        let mut quote = pending_quote();
        store.insert(quote.clone(), created_action(&quote)).await.expect("insert");

        let kinds =
            [ActionType::Called, ActionType::Emailed, ActionType::FollowUp, ActionType::NoteAdded];
        for (index, kind) in kinds.iter().enumerate() {
            let expected = quote.action_count;
            quote.action_count += 1;
            let action = QuoteAction::new(
                quote.id,
                *kind,
                Some(format!("step {index}")),
                UserId("disp-ana".to_string()),
                now() + Duration::minutes(index as i64),
            );
            store.update(quote.clone(), expected, Some(action)).await.expect("update");
        }

        let actions = store.actions_for(quote.id).await.expect("actions");
        let types: Vec<_> = actions.iter().map(|action| action.action_type).collect();
        assert_eq!(
            types,
            vec![
                ActionType::Created,
                ActionType::Called,
                ActionType::Emailed,
                ActionType::FollowUp,
                ActionType::NoteAdded
            ]
        );
    }
}
