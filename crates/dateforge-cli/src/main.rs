use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dateforge::{
    DateFormatValidator, DateTimeFactory, DateTimeLike, DateValidator, FactoryConfig, FixedClock,
    StandardDateTimeFactory,
};

#[derive(Parser)]
#[command(name = "dateforge", version)]
#[command(about = "Build date-times and validate date strings against token formats", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a date-time from a timestamp, a date string, or a value/format pair
    Create {
        /// Unix timestamp, date string ("2026-03-15", "next monday", "@1700000000"), or
        /// a value matching --format
        value: String,

        /// Token format VALUE must match exactly (e.g. "Y-m-d H:i:s")
        #[arg(short, long)]
        format: Option<String>,

        /// Default timezone (IANA name); defaults to DATEFORGE_TIMEZONE, then TZ, then UTC
        #[arg(short, long)]
        timezone: Option<String>,

        /// Current time as RFC 3339, for fields and expressions that depend on it
        #[arg(long)]
        now: Option<String>,

        /// Token format for the output
        #[arg(short, long, default_value = "c")]
        output: String,

        /// Build an immutable value
        #[arg(long)]
        immutable: bool,

        /// Print a JSON object instead of the rendered value
        #[arg(long)]
        json: bool,
    },

    /// Check that DATE matches FORMAT exactly; exits 1 when it does not
    Validate {
        /// Date string to check
        date: String,

        /// Token format (e.g. "Y-m-d")
        format: String,

        /// Timezone for fields the format leaves out
        #[arg(short, long)]
        timezone: Option<String>,

        /// Current time as RFC 3339, for fields the format leaves out
        #[arg(long)]
        now: Option<String>,
    },
}

#[derive(Serialize)]
struct Report {
    timestamp: i64,
    timezone: String,
    rendered: String,
    utc: String,
    kind: &'static str,
}

impl Report {
    fn new(value: &impl DateTimeLike, output: &str, kind: &'static str) -> Self {
        Self {
            timestamp: value.timestamp(),
            timezone: value.timezone().name(),
            rendered: value.format(output),
            utc: value.utc().to_rfc3339_opts(SecondsFormat::AutoSi, true),
            kind,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Create {
            value,
            format,
            timezone,
            now,
            output,
            immutable,
            json,
        } => {
            let factory = StandardDateTimeFactory::with_clock(
                load_config(timezone.as_deref())?,
                load_clock(now.as_deref())?,
            );
            let report = if immutable {
                let created = factory
                    .create_date_time_immutable(value.as_str().into(), format.as_deref())
                    .with_context(|| format!("Failed to create a date-time from '{value}'"))?;
                Report::new(&created, &output, "immutable")
            } else {
                let created = factory
                    .create_date_time(value.as_str().into(), format.as_deref())
                    .with_context(|| format!("Failed to create a date-time from '{value}'"))?;
                Report::new(&created, &output, "mutable")
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.rendered);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate {
            date,
            format,
            timezone,
            now,
        } => {
            let validator = DateValidator::with_clock(
                &load_config(timezone.as_deref())?,
                load_clock(now.as_deref())?,
            );
            if validator.valid_in_format(&date, &format) {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(timezone: Option<&str>) -> Result<FactoryConfig> {
    let config = FactoryConfig::global().clone();
    match timezone {
        Some(name) => Ok(config.with_timezone_name(name)?),
        None => Ok(config),
    }
}

fn load_clock(now: Option<&str>) -> Result<FixedClock> {
    let instant = match now {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("--now must be an RFC 3339 timestamp, got '{text}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    debug!(now = %instant, "clock");
    Ok(FixedClock::new(instant))
}
