use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quote::{QuoteId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Every kind of entry the action log can carry. Closed on purpose:
/// adding a kind must touch every match over it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Created,
    Called,
    Emailed,
    Texted,
    FollowUp,
    NoteAdded,
    Reassigned,
    StatusChange,
    OutcomeSet,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Called => "CALLED",
            Self::Emailed => "EMAILED",
            Self::Texted => "TEXTED",
            Self::FollowUp => "FOLLOW_UP",
            Self::NoteAdded => "NOTE_ADDED",
            Self::Reassigned => "REASSIGNED",
            Self::StatusChange => "STATUS_CHANGE",
            Self::OutcomeSet => "OUTCOME_SET",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CREATED" => Some(Self::Created),
            "CALLED" => Some(Self::Called),
            "EMAILED" => Some(Self::Emailed),
            "TEXTED" => Some(Self::Texted),
            "FOLLOW_UP" => Some(Self::FollowUp),
            "NOTE_ADDED" => Some(Self::NoteAdded),
            "REASSIGNED" => Some(Self::Reassigned),
            "STATUS_CHANGE" => Some(Self::StatusChange),
            "OUTCOME_SET" => Some(Self::OutcomeSet),
            _ => None,
        }
    }
}

/// The subset of actions a dispatcher records against a live quote.
/// Keeping this separate from [`ActionType`] makes it impossible to
/// feed system-generated types through the recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactKind {
    Called,
    Emailed,
    Texted,
    FollowUp,
}

impl ContactKind {
    pub fn action_type(self) -> ActionType {
        match self {
            Self::Called => ActionType::Called,
            Self::Emailed => ActionType::Emailed,
            Self::Texted => ActionType::Texted,
            Self::FollowUp => ActionType::FollowUp,
        }
    }
}

/// One append-only entry in a quote's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteAction {
    pub id: ActionId,
    pub quote_id: QuoteId,
    pub action_type: ActionType,
    pub notes: Option<String>,
    pub actor: UserId,
    pub created_at: DateTime<Utc>,
}

impl QuoteAction {
    pub fn new(
        quote_id: QuoteId,
        action_type: ActionType,
        notes: Option<String>,
        actor: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self { id: ActionId::generate(), quote_id, action_type, notes, actor, created_at }
    }
}
