use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use billsnap_core::datetime::{offset_from_minutes, parse_utc_offset};
use chrono::{FixedOffset, Local, Offset};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "billsnap", version, about = "Turn bill screenshots into transaction candidates")]
struct Cli {
    /// Config file (default: billsnap.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (default: billsnap.db in the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize a bill screenshot and print candidate transactions as JSON
    Recognize {
        image: PathBuf,

        #[arg(long)]
        uid: i64,

        /// Client UTC offset such as +08:00 (default: local offset)
        #[arg(long, value_parser = parse_timezone, allow_hyphen_values = true)]
        timezone: Option<FixedOffset>,
    },

    /// Run the bill-list parser over OCR text ("-" reads stdin)
    Parse {
        input: String,

        #[arg(long, value_parser = parse_timezone, allow_hyphen_values = true)]
        timezone: Option<FixedOffset>,
    },

    /// Create the database schema
    InitDb {
        /// Also seed a demo user with accounts, categories and tags
        #[arg(long)]
        demo: bool,
    },
}

/// `+08:00` style offsets, or a bare number of minutes east of UTC (`480`).
fn parse_timezone(s: &str) -> Result<FixedOffset, String> {
    parse_utc_offset(s)
        .or_else(|| s.trim().parse::<i32>().ok().and_then(offset_from_minutes))
        .ok_or_else(|| format!("invalid UTC offset '{s}', expected e.g. +08:00"))
}

pub(crate) struct Paths {
    pub config: PathBuf,
    pub db: PathBuf,
}

impl Paths {
    fn resolve(config: Option<PathBuf>, db: Option<PathBuf>) -> Result<Self> {
        if let (Some(config), Some(db)) = (&config, &db) {
            return Ok(Paths { config: config.clone(), db: db.clone() });
        }
        let dirs = directories::ProjectDirs::from("com", "billsnap", "Billsnap")
            .context("could not determine a home directory")?;
        Ok(Paths {
            config: config.unwrap_or_else(|| dirs.config_dir().join("billsnap.toml")),
            db: db.unwrap_or_else(|| dirs.data_dir().join("billsnap.db")),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let paths = Paths::resolve(cli.config, cli.db)?;
    let local = || Local::now().offset().fix();

    match cli.command {
        Command::Recognize { image, uid, timezone } => {
            commands::recognize(&paths, &image, uid, timezone.unwrap_or_else(local)).await
        }
        Command::Parse { input, timezone } => {
            commands::parse(&input, timezone.unwrap_or_else(local)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::InitDb { demo } => {
            commands::init_db(&paths, demo).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
