use thiserror::Error;

use crate::domain::quote::{QuoteId, QuoteStatus};
use crate::store::StoreError;

/// Caller-visible rejection of a lifecycle operation. Guards run
/// before any write, so a domain error never leaves partial state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("quote {0} not found")]
    NotFound(QuoteId),
    #[error("invalid transition: quote is {status:?} and cannot accept {attempted}")]
    InvalidTransition { status: QuoteStatus, attempted: &'static str },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl ApplicationError {
    /// Whether the failure is the caller's to fix, as opposed to an
    /// infrastructure fault worth retrying.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{ApplicationError, DomainError};
    use crate::domain::quote::{QuoteId, QuoteStatus};
    use crate::store::StoreError;

    #[test]
    fn domain_errors_are_rejections_and_store_errors_are_not() {
        let rejection = ApplicationError::from(DomainError::InvalidTransition {
            status: QuoteStatus::Converted,
            attempted: "record_action",
        });
        assert!(rejection.is_rejection());

        let fault = ApplicationError::from(StoreError::Unavailable("lock timeout".to_string()));
        assert!(!fault.is_rejection());
    }

    #[test]
    fn not_found_names_the_quote() {
        let id = QuoteId(Uuid::nil());
        let message = DomainError::NotFound(id).to_string();
        assert!(message.contains(&id.to_string()));
    }
}
