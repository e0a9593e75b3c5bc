pub mod commands;

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use uuid::Uuid;

use quotewatch_core::config::{AppConfig, LoadOptions, LogFormat};
use quotewatch_core::domain::action::ContactKind;
use quotewatch_core::domain::quote::Outcome;

#[derive(Debug, Parser)]
#[command(
    name = "quotewatch",
    about = "Quote follow-up operator CLI",
    long_about = "Track dispatch quotes through their follow-up window: log contact \
                  attempts, set outcomes, and inspect the prioritized board.",
    after_help = "Examples:\n  quotewatch migrate\n  quotewatch create --client-name \"Harbor Medical\"\n  quotewatch log <id> called --notes \"left voicemail\"\n  quotewatch list"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Create a quote; its 72h follow-up window starts now")]
    Create(CreateArgs),
    #[command(about = "Record a contact attempt (called/emailed/texted/follow-up)")]
    Log(LogArgs),
    #[command(about = "Append a note without touching the lifecycle")]
    Note(NoteArgs),
    #[command(about = "Resolve a quote as won or lost")]
    Outcome(OutcomeArgs),
    #[command(about = "Hand a quote to another dispatcher")]
    Reassign(ReassignArgs),
    #[command(about = "Toggle the escalation flag")]
    Flag {
        #[arg(help = "Quote id")]
        id: Uuid,
    },
    #[command(about = "Show one quote with its full action history")]
    Show {
        #[arg(help = "Quote id")]
        id: Uuid,
    },
    #[command(about = "List quotes in board order (flagged first, soonest follow-up next)")]
    List {
        #[arg(long, help = "Include resolved and expired quotes")]
        all: bool,
    },
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Validate config and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, help = "Client name (required, non-blank)")]
    pub client_name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub service_type: Option<String>,
    #[arg(long, help = "Lead origin, e.g. phone, web, referral")]
    pub source: Option<String>,
    #[arg(long, help = "Service date (RFC 3339)")]
    pub date_of_service: Option<DateTime<Utc>>,
    #[arg(long, help = "Pickup date (RFC 3339)")]
    pub pickup_date: Option<DateTime<Utc>>,
    #[arg(long)]
    pub pickup: Option<String>,
    #[arg(long)]
    pub dropoff: Option<String>,
    #[arg(long, help = "Estimated amount, e.g. 85.00")]
    pub amount: Option<Decimal>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, help = "Advisory next follow-up (RFC 3339)")]
    pub next_follow_up: Option<DateTime<Utc>>,
    #[arg(long, help = "Dispatcher to assign the quote to")]
    pub assign: Option<String>,
    #[arg(long, help = "Acting user (defaults to QUOTEWATCH_ACTOR)")]
    pub actor: Option<String>,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    #[arg(help = "Quote id")]
    pub id: Uuid,
    #[arg(value_enum, help = "Kind of contact attempt")]
    pub kind: ContactArg,
    #[arg(long, help = "What happened (required)")]
    pub notes: String,
    #[arg(long, help = "Next follow-up for follow-up entries (RFC 3339)")]
    pub next_follow_up: Option<DateTime<Utc>>,
    #[arg(long, help = "Acting user (defaults to QUOTEWATCH_ACTOR)")]
    pub actor: Option<String>,
}

#[derive(Debug, Args)]
pub struct NoteArgs {
    #[arg(help = "Quote id")]
    pub id: Uuid,
    #[arg(long, help = "Note text (required)")]
    pub notes: String,
    #[arg(long, help = "Acting user (defaults to QUOTEWATCH_ACTOR)")]
    pub actor: Option<String>,
}

#[derive(Debug, Args)]
pub struct OutcomeArgs {
    #[arg(help = "Quote id")]
    pub id: Uuid,
    #[arg(value_enum, help = "Terminal resolution")]
    pub outcome: OutcomeArg,
    #[arg(long, help = "Why the quote resolved this way")]
    pub reason: Option<String>,
    #[arg(long, help = "Acting user (defaults to QUOTEWATCH_ACTOR)")]
    pub actor: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReassignArgs {
    #[arg(help = "Quote id")]
    pub id: Uuid,
    #[arg(help = "Dispatcher taking over")]
    pub assignee: String,
    #[arg(long, help = "Acting user (defaults to QUOTEWATCH_ACTOR)")]
    pub actor: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ContactArg {
    Called,
    Emailed,
    Texted,
    FollowUp,
}

impl ContactArg {
    pub fn kind(self) -> ContactKind {
        match self {
            Self::Called => ContactKind::Called,
            Self::Emailed => ContactKind::Emailed,
            Self::Texted => ContactKind::Texted,
            Self::FollowUp => ContactKind::FollowUp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutcomeArg {
    Won,
    Lost,
}

impl OutcomeArg {
    pub fn outcome(self) -> Outcome {
        match self {
            Self::Won => Outcome::Won,
            Self::Lost => Outcome::Lost,
        }
    }
}

fn init_logging() {
    let Ok(config) = AppConfig::load(LoadOptions::default()) else {
        return;
    };
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // Command output owns stdout; logs go to stderr.
    let result = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    let _ = result;
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Create(args) => commands::mutate::create(args),
        Command::Log(args) => commands::mutate::log(args),
        Command::Note(args) => commands::mutate::note(args),
        Command::Outcome(args) => commands::mutate::outcome(args),
        Command::Reassign(args) => commands::mutate::reassign(args),
        Command::Flag { id } => commands::mutate::flag(id),
        Command::Show { id } => commands::view::show(id),
        Command::List { all } => commands::view::list(all),
        Command::Migrate => commands::migrate::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
