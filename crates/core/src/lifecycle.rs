//! Status transitions for the quote follow-up window.
//!
//! Expiration is derived, never stored: a quote whose window has
//! passed while still non-terminal reads as `Expired` everywhere the
//! effective status is consulted, and the mutation guards treat it
//! exactly like a stored terminal status. An outcome that was set in
//! time is never overridden by the clock.

use chrono::{DateTime, Utc};

use crate::domain::quote::{Outcome, Quote, QuoteStatus};
use crate::errors::DomainError;

impl Quote {
    /// The status as of `now`, folding lazy expiration into the
    /// stored value.
    pub fn effective_status(&self, now: DateTime<Utc>) -> QuoteStatus {
        if !self.status.is_terminal() && now >= self.expires_at {
            return QuoteStatus::Expired;
        }
        self.status
    }

    pub fn is_effectively_terminal(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now).is_terminal()
    }

    /// Rejects mutations on quotes that are terminal as of `now`.
    /// Named operations show up verbatim in the error the caller sees.
    pub fn guard_open(
        &self,
        now: DateTime<Utc>,
        attempted: &'static str,
    ) -> Result<(), DomainError> {
        let status = self.effective_status(now);
        if status.is_terminal() {
            return Err(DomainError::InvalidTransition { status, attempted });
        }
        Ok(())
    }

    /// Pending collapses to FollowingUp on the first contact action;
    /// repeat contacts leave the status alone.
    pub fn begin_following_up(&mut self) {
        if self.status == QuoteStatus::Pending {
            self.status = QuoteStatus::FollowingUp;
        }
    }

    /// Records the terminal resolution. Both non-terminal states
    /// collapse directly into the outcome's terminal status; passing
    /// through FollowingUp first is not required.
    pub fn apply_outcome(
        &mut self,
        outcome: Outcome,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.outcome.is_some() {
            return Err(DomainError::InvalidTransition {
                status: self.status,
                attempted: "set_outcome",
            });
        }
        self.guard_open(now, "set_outcome")?;

        self.outcome = Some(outcome);
        self.outcome_reason = reason;
        self.outcome_at = Some(now);
        self.status = outcome.terminal_status();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::quote::{Outcome, Quote, QuoteStatus};
    use crate::errors::DomainError;
    use crate::testutil::{fixed_now, pending_quote};

    fn fixture(now: chrono::DateTime<Utc>) -> Quote {
        pending_quote(now)
    }

    fn now() -> chrono::DateTime<Utc> {
        fixed_now()
    }

    #[test]
    fn effective_status_expires_after_the_window() {
        let quote = fixture(now());
        assert_eq!(quote.effective_status(now()), QuoteStatus::Pending);
        assert_eq!(
            quote.effective_status(now() + Duration::hours(72)),
            QuoteStatus::Expired,
            "window end is inclusive of expiry"
        );
    }

    #[test]
    fn effective_status_never_overrides_an_outcome() {
        let mut quote = fixture(now());
        quote.apply_outcome(Outcome::Won, None, now()).expect("first outcome");
        assert_eq!(quote.effective_status(now() + Duration::days(30)), QuoteStatus::Converted);
    }

    #[test]
    fn begin_following_up_is_idempotent() {
        let mut quote = fixture(now());
        quote.begin_following_up();
        assert_eq!(quote.status, QuoteStatus::FollowingUp);
        quote.begin_following_up();
        assert_eq!(quote.status, QuoteStatus::FollowingUp);
    }

    #[test]
    fn outcome_collapses_directly_from_pending() {
        let mut quote = fixture(now());
        quote.apply_outcome(Outcome::Lost, Some("went with competitor".to_string()), now())
            .expect("pending -> lost");

        assert_eq!(quote.status, QuoteStatus::Lost);
        assert_eq!(quote.outcome, Some(Outcome::Lost));
        assert_eq!(quote.outcome_at, Some(now()));
        assert_eq!(quote.outcome_reason.as_deref(), Some("went with competitor"));
    }

    #[test]
    fn second_outcome_is_rejected_without_field_changes() {
        let mut quote = fixture(now());
        quote.apply_outcome(Outcome::Won, None, now()).expect("first outcome");
        let before = quote.clone();

        let error = quote
            .apply_outcome(Outcome::Lost, Some("late change of heart".to_string()), now())
            .expect_err("outcome is write-once");

        assert!(matches!(error, DomainError::InvalidTransition { attempted: "set_outcome", .. }));
        assert_eq!(quote, before);
    }

    #[test]
    fn outcome_on_an_expired_window_is_rejected() {
        let mut quote = fixture(now());
        let late = now() + Duration::hours(73);
        let error = quote.apply_outcome(Outcome::Won, None, late).expect_err("window passed");

        assert!(matches!(
            error,
            DomainError::InvalidTransition { status: QuoteStatus::Expired, .. }
        ));
        assert_eq!(quote.outcome, None);
    }

    #[test]
    fn guard_open_names_the_attempted_operation() {
        let mut quote = fixture(now());
        quote.apply_outcome(Outcome::Won, None, now()).expect("outcome");

        let error = quote.guard_open(now(), "record_action").expect_err("terminal");
        assert_eq!(
            error,
            DomainError::InvalidTransition {
                status: QuoteStatus::Converted,
                attempted: "record_action"
            }
        );
    }
}
