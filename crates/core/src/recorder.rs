//! The action recorder: every mutation of a quote goes through here.
//!
//! Each operation is one read-modify-write round trip: load the
//! quote, run the lifecycle guards against the injected clock, then
//! hand the updated row and the appended action to the store as a
//! single atomic unit. Guards run before anything is written, so a
//! rejection leaves the quote untouched. The write itself is
//! conditional on the action count the snapshot was read at, so two
//! racing mutations cannot both land: the loser surfaces as a
//! [`StoreError::Conflict`](crate::store::StoreError) to retry
//! against fresh state.

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::domain::action::{ActionType, ContactKind, QuoteAction};
use crate::domain::quote::{NewQuote, Outcome, Quote, QuoteId, UserId};
use crate::errors::{ApplicationError, DomainError};
use crate::prioritize::{prioritize, QuoteFilter, QuoteView};
use crate::store::QuoteStore;

pub const DEFAULT_EXPIRY_WINDOW_HOURS: i64 = 72;

/// A quote snapshot together with its full action history.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteWithHistory {
    pub quote: Quote,
    pub actions: Vec<QuoteAction>,
}

pub struct FollowUpService<S, C> {
    store: S,
    clock: C,
    expiry_window: Duration,
}

impl<S, C> FollowUpService<S, C>
where
    S: QuoteStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self::with_window(store, clock, Duration::hours(DEFAULT_EXPIRY_WINDOW_HOURS))
    }

    pub fn with_window(store: S, clock: C, expiry_window: Duration) -> Self {
        Self { store, clock, expiry_window }
    }

    /// Creates a quote in Pending with its expiry window fixed from
    /// the creation instant, and logs the implicit Created action.
    pub async fn create_quote(
        &self,
        input: NewQuote,
        actor: UserId,
    ) -> Result<Quote, ApplicationError> {
        if input.client_name.trim().is_empty() {
            return Err(DomainError::Validation("client_name must not be blank".to_string()))?;
        }

        let now = self.clock.now();
        let quote = Quote {
            id: QuoteId::generate(),
            client_name: input.client_name,
            client_email: input.client_email,
            client_phone: input.client_phone,
            service_type: input.service_type,
            source: input.source,
            date_of_service: input.date_of_service,
            pickup_date: input.pickup_date,
            pickup_location: input.pickup_location,
            dropoff_location: input.dropoff_location,
            estimated_amount: input.estimated_amount,
            notes: input.notes,
            status: crate::domain::quote::QuoteStatus::Pending,
            outcome: None,
            outcome_reason: None,
            outcome_at: None,
            follow_up_count: 0,
            last_follow_up: None,
            next_follow_up: input.next_follow_up,
            last_action_at: Some(now),
            action_count: 1,
            is_flagged: false,
            expires_at: now + self.expiry_window,
            created_by: actor.clone(),
            assigned_to: input.assigned_to,
            created_at: now,
        };
        let created = QuoteAction::new(quote.id, ActionType::Created, None, actor, now);

        self.store.insert(quote.clone(), created).await?;
        Ok(quote)
    }

    /// Logs a contact attempt. The note is the substance of the
    /// action and is mandatory; a FollowUp also advances the
    /// follow-up counters and stores the caller-supplied next date.
    pub async fn record_action(
        &self,
        id: QuoteId,
        kind: ContactKind,
        notes: String,
        next_follow_up: Option<DateTime<Utc>>,
        actor: UserId,
    ) -> Result<Quote, ApplicationError> {
        if notes.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "notes are required for {} actions",
                kind.action_type().as_str()
            )))?;
        }

        let mut quote = self.load(id).await?;
        let now = self.clock.now();
        quote.guard_open(now, "record_action")?;

        let snapshot_count = quote.action_count;
        quote.last_action_at = Some(now);
        quote.action_count += 1;
        if kind == ContactKind::FollowUp {
            quote.follow_up_count += 1;
            quote.last_follow_up = Some(now);
            quote.next_follow_up = next_follow_up;
        }
        quote.begin_following_up();

        let action = QuoteAction::new(id, kind.action_type(), Some(notes), actor, now);
        self.store.update(quote.clone(), snapshot_count, Some(action)).await?;
        Ok(quote)
    }

    /// Appends a note without touching the lifecycle. Allowed on
    /// terminal quotes so the audit trail can keep growing after
    /// resolution.
    pub async fn add_note(
        &self,
        id: QuoteId,
        notes: String,
        actor: UserId,
    ) -> Result<Quote, ApplicationError> {
        if notes.trim().is_empty() {
            return Err(DomainError::Validation("note text must not be blank".to_string()))?;
        }

        let mut quote = self.load(id).await?;
        let now = self.clock.now();
        let snapshot_count = quote.action_count;
        quote.last_action_at = Some(now);
        quote.action_count += 1;

        let action = QuoteAction::new(id, ActionType::NoteAdded, Some(notes), actor, now);
        self.store.update(quote.clone(), snapshot_count, Some(action)).await?;
        Ok(quote)
    }

    /// Resolves the quote. Write-once: a second outcome, or an
    /// outcome on an expired window, is rejected without any write.
    pub async fn set_outcome(
        &self,
        id: QuoteId,
        outcome: Outcome,
        reason: Option<String>,
        actor: UserId,
    ) -> Result<Quote, ApplicationError> {
        let mut quote = self.load(id).await?;
        let now = self.clock.now();
        quote.apply_outcome(outcome, reason.clone(), now)?;
        let snapshot_count = quote.action_count;
        quote.last_action_at = Some(now);
        quote.action_count += 1;

        let action = QuoteAction::new(id, ActionType::OutcomeSet, reason, actor, now);
        self.store.update(quote.clone(), snapshot_count, Some(action)).await?;
        Ok(quote)
    }

    pub async fn reassign(
        &self,
        id: QuoteId,
        new_assignee: UserId,
        actor: UserId,
    ) -> Result<Quote, ApplicationError> {
        let mut quote = self.load(id).await?;
        let now = self.clock.now();
        quote.guard_open(now, "reassign")?;

        let notes = format!("reassigned to {new_assignee}");
        let snapshot_count = quote.action_count;
        quote.assigned_to = Some(new_assignee);
        quote.last_action_at = Some(now);
        quote.action_count += 1;

        let action = QuoteAction::new(id, ActionType::Reassigned, Some(notes), actor, now);
        self.store.update(quote.clone(), snapshot_count, Some(action)).await?;
        Ok(quote)
    }

    /// Flips the escalation flag. An operational convenience, not an
    /// audit event: no action row is written, and terminal quotes can
    /// still be toggled.
    pub async fn toggle_flag(&self, id: QuoteId) -> Result<Quote, ApplicationError> {
        let mut quote = self.load(id).await?;
        quote.is_flagged = !quote.is_flagged;
        self.store.update(quote.clone(), quote.action_count, None).await?;
        Ok(quote)
    }

    /// Quote snapshot plus history. The returned status folds in lazy
    /// expiration as of the current clock reading.
    pub async fn get_quote_with_history(
        &self,
        id: QuoteId,
    ) -> Result<QuoteWithHistory, ApplicationError> {
        let mut quote = self.load(id).await?;
        quote.status = quote.effective_status(self.clock.now());
        let actions = self.store.actions_for(id).await?;
        Ok(QuoteWithHistory { quote, actions })
    }

    pub async fn list_quotes(
        &self,
        filter: QuoteFilter,
    ) -> Result<Vec<QuoteView>, ApplicationError> {
        let quotes = self.store.list_all().await?;
        Ok(prioritize(quotes, filter, self.clock.now()))
    }

    async fn load(&self, id: QuoteId) -> Result<Quote, ApplicationError> {
        self.store.fetch(id).await?.ok_or_else(|| DomainError::NotFound(id).into())
    }
}
