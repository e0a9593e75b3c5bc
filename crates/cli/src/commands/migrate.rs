//! Applies pending schema migrations to the configured database.

use quotewatch_core::config::{AppConfig, LoadOptions};
use quotewatch_db::{connect_with_settings, migrations};

use super::CommandResult;

const COMMAND: &str = "migrate";

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
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
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure(COMMAND, "db_connectivity", error.to_string(), 4);
            }
        };

        match migrations::run_pending(&pool).await {
            Ok(()) => {
                tracing::info!(database = %config.database.url, "migrations applied");
                CommandResult::success(COMMAND, "database schema is up to date")
            }
            Err(error) => CommandResult::failure(COMMAND, "migration", error.to_string(), 5),
        }
    })
}
