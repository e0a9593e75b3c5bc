pub mod doctor;
pub mod migrate;
pub mod mutate;
pub mod view;

use std::future::Future;

use serde::Serialize;

use quotewatch_core::clock::SystemClock;
use quotewatch_core::config::{AppConfig, LoadOptions};
use quotewatch_core::errors::{ApplicationError, DomainError};
use quotewatch_core::store::StoreError;
use quotewatch_core::recorder::FollowUpService;
use quotewatch_db::{connect_with_settings, SqlQuoteStore};

pub(crate) type Service = FollowUpService<SqlQuoteStore, SystemClock>;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config, builds the service against the configured database,
/// and runs one command body on a current-thread runtime.
pub(crate) fn run_with_service<F, Fut>(command: &'static str, body: F) -> CommandResult
where
    F: FnOnce(Service) -> Fut,
    Fut: Future<Output = Result<(String, Option<serde_json::Value>), ApplicationError>>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| {
            CommandResult::failure(command, "db_connectivity", error.to_string(), 4)
        })?;

        tracing::debug!(command, database = %config.database.url, "connected");
        let window = chrono::Duration::hours(i64::from(config.follow_up.expiry_window_hours));
        let service =
            FollowUpService::with_window(SqlQuoteStore::new(pool), SystemClock, window);

        body(service).await.map_err(|error| application_failure(command, &error))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data(command, message, data),
        Err(failure) => failure,
    }
}

fn application_failure(command: &'static str, error: &ApplicationError) -> CommandResult {
    match error {
        ApplicationError::Domain(DomainError::Validation(_)) => {
            CommandResult::failure(command, "validation", error.to_string(), 1)
        }
        ApplicationError::Domain(DomainError::NotFound(_)) => {
            CommandResult::failure(command, "not_found", error.to_string(), 1)
        }
        ApplicationError::Domain(DomainError::InvalidTransition { .. }) => {
            CommandResult::failure(command, "invalid_transition", error.to_string(), 1)
        }
        ApplicationError::Persistence(StoreError::Conflict(_)) => {
            CommandResult::failure(command, "conflict", error.to_string(), 4)
        }
        ApplicationError::Persistence(_) => {
            CommandResult::failure(command, "persistence", error.to_string(), 4)
        }
    }
}

/// Actor identity supplied by the operator; the follow-up core
/// consumes identity, it does not own it.
pub(crate) fn resolve_actor(explicit: Option<String>) -> quotewatch_core::domain::quote::UserId {
    let actor = explicit
        .or_else(|| std::env::var("QUOTEWATCH_ACTOR").ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "dispatcher".to_string());
    quotewatch_core::domain::quote::UserId(actor)
}
