//! mdw-rc (Reconciler) - Measurement data warehouse command-line tool
//!
//! Thin command surface over the reconciliation engine: run a pass,
//! reset the store, or run a read-only reporting query. Exits nonzero
//! on any fatal failure, naming the offending path or store error.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdw_common::config;
use mdw_rc::db::report;
use mdw_rc::reconcile;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mdw-rc", about = "Measurement data warehouse reconciler")]
struct Cli {
    /// Warehouse database file (falls back to MDW_DATABASE, then the
    /// config file, then the platform default)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile a measurement directory tree against the warehouse
    Reconcile {
        /// Root directory containing subject_* subdirectories
        data_dir: PathBuf,
    },
    /// Destroy all stored state and re-create an empty schema
    Reset,
    /// Run a read-only SELECT against the warehouse
    Query {
        /// SQL SELECT statement
        sql: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting MDW Reconciler (mdw-rc) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();

    let db_path = config::resolve_database_path(cli.database.as_deref())?;
    info!("Warehouse database: {}", db_path.display());

    let pool = match mdw_common::db::init::init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open warehouse database: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Reconcile { data_dir } => {
            let report = match reconcile(&pool, &data_dir).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Reconciliation pass failed: {}", e);
                    return Err(e.into());
                }
            };

            println!(
                "Reconciled {}: {} candidates, {} runs inserted, {} subjects inserted",
                data_dir.display(),
                report.candidates_seen,
                report.runs_inserted,
                report.subjects_inserted
            );
            for (path, cause) in &report.rejected {
                println!("  rejected {}: {}", path.display(), cause);
            }
        }
        Command::Reset => {
            mdw_common::db::init::drop_all(&pool).await?;
            mdw_common::db::init::create_schema(&pool).await?;
            println!("Warehouse reset: run and subject tables are empty");
        }
        Command::Query { sql } => {
            let result = report::run_query(&pool, &sql).await?;
            println!("{}", result.columns.join(" | "));
            for row in &result.rows {
                println!("{}", row.join(" | "));
            }
            println!("({} rows)", result.rows.len());
        }
    }

    Ok(())
}
