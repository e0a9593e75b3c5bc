//! Environment sanity checks: configuration and database reachability.
//!
//! Doctor never mutates anything; it reports what a real command
//! would find, one check per line (or as a JSON array with --json).

use serde::Serialize;

use quotewatch_core::config::{AppConfig, LoadOptions};
use quotewatch_db::{connect_with_settings, ping};

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    ok: bool,
    detail: String,
}

pub fn run(json: bool) -> String {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(Check {
                name: "config",
                ok: true,
                detail: format!(
                    "database {} | expiry window {}h | log level {}",
                    config.database.url,
                    config.follow_up.expiry_window_hours,
                    config.logging.level
                ),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(Check { name: "config", ok: false, detail: error.to_string() });
            None
        }
    };

    if let Some(config) = config {
        checks.push(database_check(&config));
    }

    render(json, &checks)
}

fn database_check(config: &AppConfig) -> Check {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return Check {
                name: "database",
                ok: false,
                detail: format!("failed to initialize async runtime: {error}"),
            };
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
                return Check { name: "database", ok: false, detail: error.to_string() };
            }
        };

        match ping(&pool).await {
            Ok(()) => Check {
                name: "database",
                ok: true,
                detail: format!("reachable at {}", config.database.url),
            },
            Err(error) => Check { name: "database", ok: false, detail: error.to_string() },
        }
    })
}

fn render(json: bool, checks: &[Check]) -> String {
    if json {
        return serde_json::to_string(checks)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
    }

    let mut lines: Vec<String> = checks
        .iter()
        .map(|check| {
            let marker = if check.ok { "ok  " } else { "FAIL" };
            format!("{marker} {}: {}", check.name, check.detail)
        })
        .collect();
    let healthy = checks.iter().all(|check| check.ok);
    lines.push(if healthy {
        "all checks passed".to_string()
    } else {
        "one or more checks failed".to_string()
    });
    lines.join("\n")
}
