pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod prioritize;
pub mod recorder;
pub mod store;
#[cfg(test)]
pub(crate) mod testutil;
pub mod timefmt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::action::{ActionId, ActionType, ContactKind, QuoteAction};
pub use domain::quote::{NewQuote, Outcome, Quote, QuoteId, QuoteStatus, UserId};
pub use errors::{ApplicationError, DomainError};
pub use prioritize::{QuoteFilter, QuoteView};
pub use recorder::FollowUpService;
pub use store::{InMemoryQuoteStore, QuoteStore, StoreError};
pub use timefmt::{time_since, time_until_expiry, ExpiryInfo};
