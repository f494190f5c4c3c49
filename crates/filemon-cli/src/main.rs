//! Filemon CLI: ingest acquirer settlement files and manage their records.
//!
//! Reads configuration from the environment (and `.env`). DATABASE_URL is required.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use filemon_cli::{ingest_path, init_tracing, log_command_error, ErrorReport, Services};
use filemon_core::{AppError, Config};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "filemon", about = "Acquirer settlement file ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one or more settlement files
    Ingest {
        /// Paths of the files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List every file record, newest first
    List,
    /// Show one file record with its transactions
    Show {
        /// File record UUID
        id: Uuid,
    },
    /// Delete a file record and its backup
    Delete {
        /// File record UUID
        id: Uuid,
    },
    /// Purge expired file records and their backups
    Purge {
        /// Purge as of this RFC 3339 timestamp instead of now
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
        /// Keep running, purging every RETENTION_SWEEP_INTERVAL_SECS
        #[arg(long, conflicts_with = "as_of")]
        watch: bool,
    },
    /// Show ingestion statistics
    Stats,
    /// Apply database migrations
    Migrate,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<AppError>() {
            Some(app_err) => {
                log_command_error(app_err);
                print_json(&ErrorReport::from(app_err))?;
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = filemon_db::create_pool(&config).await?;

    if let Commands::Migrate = cli.command {
        filemon_db::run_migrations(&pool).await?;
        print_json(&serde_json::json!({ "success": true, "message": "Migrations applied" }))?;
        return Ok(());
    }

    let services = Services::build(&config, pool).await?;

    match cli.command {
        Commands::Ingest { files } => {
            let mut reports = Vec::with_capacity(files.len());
            for path in &files {
                reports.push(ingest_path(&services.ingestion, path).await);
            }
            print_json(&reports)?;
        }
        Commands::List => {
            print_json(&services.catalog.list_files().await?)?;
        }
        Commands::Show { id } => {
            let detail = services
                .catalog
                .get_file(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;
            print_json(&detail)?;
        }
        Commands::Delete { id } => {
            services.catalog.delete_by_id(id).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("File {} deleted", id) }),
            )?;
        }
        Commands::Purge { as_of, watch: false } => {
            let purged = services
                .retention
                .purge_expired(as_of.unwrap_or_else(Utc::now))
                .await?;
            print_json(&serde_json::json!({ "purged": purged }))?;
        }
        Commands::Purge { watch: true, .. } => {
            let period = config
                .retention_sweep_interval()
                .context("RETENTION_SWEEP_INTERVAL_SECS is 0; the sweep is disabled")?;
            let handle = services.retention.clone().start(period);
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down retention sweep");
            handle.abort();
        }
        Commands::Stats => {
            print_json(&services.statistics.report().await?)?;
        }
        Commands::Migrate => {}
    }

    Ok(())
}
