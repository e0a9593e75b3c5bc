//! Commands that write: create, log, note, outcome, reassign, flag.
//!
//! Each handler is a thin shim: resolve the actor, call one service
//! method, and shape the result into the JSON payload. All lifecycle
//! rules live in the core crate.

use serde_json::Value;
use uuid::Uuid;

use quotewatch_core::domain::quote::{NewQuote, Quote, QuoteId, UserId};

use super::{resolve_actor, run_with_service, CommandResult};
use crate::{CreateArgs, LogArgs, NoteArgs, OutcomeArgs, ReassignArgs};

fn quote_data(quote: &Quote) -> Option<Value> {
    serde_json::to_value(quote).ok()
}

pub fn create(args: CreateArgs) -> CommandResult {
    run_with_service("create", move |service| async move {
        let actor = resolve_actor(args.actor);
        let input = NewQuote {
            client_name: args.client_name,
            client_email: args.email,
            client_phone: args.phone,
            service_type: args.service_type,
            source: args.source,
            date_of_service: args.date_of_service,
            pickup_date: args.pickup_date,
            pickup_location: args.pickup,
            dropoff_location: args.dropoff,
            estimated_amount: args.amount,
            notes: args.notes,
            next_follow_up: args.next_follow_up,
            assigned_to: args.assign.map(UserId),
        };

        let quote = service.create_quote(input, actor).await?;
        let message = format!(
            "created quote {} for {}; follow-up window closes {}",
            quote.id,
            quote.client_name,
            quote.expires_at.format("%Y-%m-%d %H:%M UTC")
        );
        Ok((message, quote_data(&quote)))
    })
}

pub fn log(args: LogArgs) -> CommandResult {
    run_with_service("log", move |service| async move {
        let actor = resolve_actor(args.actor);
        let kind = args.kind.kind();
        let quote = service
            .record_action(QuoteId(args.id), kind, args.notes, args.next_follow_up, actor)
            .await?;

        let message = format!(
            "logged {} on quote {}; status is now {}",
            kind.action_type().as_str(),
            quote.id,
            quote.status.as_str()
        );
        Ok((message, quote_data(&quote)))
    })
}

pub fn note(args: NoteArgs) -> CommandResult {
    run_with_service("note", move |service| async move {
        let actor = resolve_actor(args.actor);
        let quote = service.add_note(QuoteId(args.id), args.notes, actor).await?;

        let message = format!(
            "noted quote {}; {} actions on record",
            quote.id, quote.action_count
        );
        Ok((message, quote_data(&quote)))
    })
}

pub fn outcome(args: OutcomeArgs) -> CommandResult {
    run_with_service("outcome", move |service| async move {
        let actor = resolve_actor(args.actor);
        let outcome = args.outcome.outcome();
        let quote =
            service.set_outcome(QuoteId(args.id), outcome, args.reason, actor).await?;

        let message = format!(
            "quote {} resolved as {}; status is now {}",
            quote.id,
            outcome.as_str(),
            quote.status.as_str()
        );
        Ok((message, quote_data(&quote)))
    })
}

pub fn reassign(args: ReassignArgs) -> CommandResult {
    run_with_service("reassign", move |service| async move {
        let actor = resolve_actor(args.actor);
        let assignee = UserId(args.assignee);
        let quote = service.reassign(QuoteId(args.id), assignee.clone(), actor).await?;

        let message = format!("quote {} reassigned to {assignee}", quote.id);
        Ok((message, quote_data(&quote)))
    })
}

pub fn flag(id: Uuid) -> CommandResult {
    run_with_service("flag", move |service| async move {
        let quote = service.toggle_flag(QuoteId(id)).await?;
        let state = if quote.is_flagged { "flagged" } else { "unflagged" };
        Ok((format!("quote {} is now {state}", quote.id), quote_data(&quote)))
    })
}
