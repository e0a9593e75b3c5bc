use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub Uuid);

impl QuoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Pending,
    FollowingUp,
    Converted,
    Lost,
    Expired,
}

impl QuoteStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converted | Self::Lost | Self::Expired)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::FollowingUp => "FOLLOWING_UP",
            Self::Converted => "CONVERTED",
            Self::Lost => "LOST",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "FOLLOWING_UP" => Some(Self::FollowingUp),
            "CONVERTED" => Some(Self::Converted),
            "LOST" => Some(Self::Lost),
            "EXPIRED" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Terminal resolution of a quote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    /// The terminal status this outcome collapses the quote into.
    pub fn terminal_status(self) -> QuoteStatus {
        match self {
            Self::Won => QuoteStatus::Converted,
            Self::Lost => QuoteStatus::Lost,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Won => "WON",
            Self::Lost => "LOST",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "WON" => Some(Self::Won),
            "LOST" => Some(Self::Lost),
            _ => None,
        }
    }
}

/// A prospective-client estimate tracked through its follow-up window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub service_type: Option<String>,
    pub source: Option<String>,
    pub date_of_service: Option<DateTime<Utc>>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub estimated_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub outcome: Option<Outcome>,
    pub outcome_reason: Option<String>,
    pub outcome_at: Option<DateTime<Utc>>,
    pub follow_up_count: u32,
    pub last_follow_up: Option<DateTime<Utc>>,
    pub next_follow_up: Option<DateTime<Utc>>,
    pub last_action_at: Option<DateTime<Utc>>,
    pub action_count: u32,
    pub is_flagged: bool,
    pub expires_at: DateTime<Utc>,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new quote. Lifecycle, counters, and
/// expiry are filled in by the recorder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewQuote {
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub service_type: Option<String>,
    pub source: Option<String>,
    pub date_of_service: Option<DateTime<Utc>>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub estimated_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub next_follow_up: Option<DateTime<Utc>>,
    pub assigned_to: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::{Outcome, QuoteStatus};

    #[test]
    fn terminal_statuses_are_exactly_the_three_end_states() {
        assert!(!QuoteStatus::Pending.is_terminal());
        assert!(!QuoteStatus::FollowingUp.is_terminal());
        assert!(QuoteStatus::Converted.is_terminal());
        assert!(QuoteStatus::Lost.is_terminal());
        assert!(QuoteStatus::Expired.is_terminal());
    }

    #[test]
    fn status_round_trips_through_storage_encoding() {
        for status in [
            QuoteStatus::Pending,
            QuoteStatus::FollowingUp,
            QuoteStatus::Converted,
            QuoteStatus::Lost,
            QuoteStatus::Expired,
        ] {
            assert_eq!(QuoteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuoteStatus::parse("DRAFT"), None);
    }

    #[test]
    fn outcome_maps_to_matching_terminal_status() {
        assert_eq!(Outcome::Won.terminal_status(), QuoteStatus::Converted);
        assert_eq!(Outcome::Lost.terminal_status(), QuoteStatus::Lost);
        assert_eq!(Outcome::parse("WON"), Some(Outcome::Won));
        assert_eq!(Outcome::parse("won"), None);
    }
}
