//! CLI commands: `analyze`, `recommend`, `execute`.
//!
//! Machine-readable JSON output by default; `--output table` renders a
//! compact human-readable view instead. Operates against a `Pipeline` built
//! around an in-process session store, so a session only survives for the
//! life of the process invoking these subcommands unless it's piped through
//! manually (the session id printed by `analyze` is the handle to reuse).

use std::collections::HashSet;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::SessionId;
use crate::pipeline::Pipeline;
use crate::rca::DeterministicModelClient;
use crate::storage::{DatabaseConfig, InMemoryMetricStore, MetricStoreAdapter, SqlitePool, WarehouseMetricStore};

#[derive(Parser)]
#[command(name = "ad-rca-cli", about = "Advertising anomaly detection and root-cause diagnosis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "json")]
    pub output: OutputFormat,

    /// Path to a config TOML file
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// SQLite DSN to read ad performance data from. Falls back to an empty
    /// in-memory store when omitted (useful for smoke-testing the CLI itself).
    #[arg(long, global = true, env = "RCA_DATABASE_URL")]
    pub database_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch ad summaries for a tenant, compute a baseline, and detect anomalies.
    Analyze {
        /// Tenant short code
        #[arg(short, long)]
        tenant: String,

        /// Lookback window in days (1-365)
        #[arg(short, long, default_value = "30")]
        window_days: u32,
    },

    /// Diagnose and produce spend recommendations for a prior analysis.
    Recommend {
        /// Session id returned by `analyze`
        #[arg(short, long)]
        session: Uuid,

        /// Run the bounded RCA orchestrator loop for actionable anomalies
        #[arg(long)]
        use_model_reasoning: bool,
    },

    /// Dry-run execute the recommendations from a prior `recommend` call.
    Execute {
        /// Session id returned by `analyze`
        #[arg(short, long)]
        session: Uuid,

        /// Comma-separated ad ids to approve; all ads run when omitted.
        #[arg(long, value_delimiter = ',')]
        approve: Option<Vec<String>>,

        /// Actually mutate ad accounts instead of simulating (unsupported; always true)
        #[arg(long, default_value = "true")]
        dry_run: bool,
    },

    /// Run the HTTP surface (`/v1/analyze`, `/v1/sessions/:id/recommend`,
    /// `/v1/sessions/:id/execute`, `/healthz`, `/metrics`).
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

async fn build_pipeline(cli: &Cli) -> anyhow::Result<Pipeline> {
    let full_config = match &cli.config {
        Some(path) => Config::load(Some(path))?,
        None => Config::load(None)?,
    };
    let config = full_config.rca.clone();
    let tenant_registry = full_config.tenant_registry();

    let store: Arc<dyn MetricStoreAdapter> = match &cli.database_url {
        Some(url) => {
            let db_config = DatabaseConfig {
                url: url.clone(),
                ..Default::default()
            };
            let pool = SqlitePool::connect(&db_config).await?;
            Arc::new(WarehouseMetricStore::new(pool.pool().clone()))
        }
        None => Arc::new(InMemoryMetricStore::new()),
    };

    Ok(Pipeline::new(
        store,
        Arc::new(DeterministicModelClient),
        config,
        tenant_registry,
    ))
}

/// Dispatches the parsed CLI to the pipeline and prints the result.
pub async fn execute_command(cli: Cli) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&cli).await?;

    match &cli.command {
        Commands::Analyze { tenant, window_days } => {
            let (session_id, summary) = pipeline.analyze(tenant, *window_days).await?;
            print_analyze(&cli.output, session_id, &summary);
        }
        Commands::Recommend {
            session,
            use_model_reasoning,
        } => {
            let (recommendations, summary) = pipeline
                .recommend(SessionId(*session), *use_model_reasoning)
                .await?;
            print_recommend(&cli.output, &recommendations, &summary);
        }
        Commands::Execute {
            session,
            approve,
            dry_run,
        } => {
            let approved: Option<HashSet<String>> =
                approve.as_ref().map(|ids| ids.iter().cloned().collect());
            let (results, summary) = pipeline
                .execute(SessionId(*session), approved, *dry_run)
                .await?;
            print_execute(&cli.output, &results, &summary);
        }
        Commands::Serve { bind, port } => {
            serve(pipeline, bind, *port).await?;
        }
    }

    Ok(())
}

async fn serve(pipeline: Pipeline, bind: &str, port: u16) -> anyhow::Result<()> {
    use crate::api::{create_app, ApiState};
    use crate::observability::config::MetricsConfig;
    use crate::observability::{HealthChecker, HealthConfig, MetricsRegistry};
    use tracing::info;

    let state = ApiState::new(
        Arc::new(pipeline),
        Arc::new(MetricsRegistry::new(MetricsConfig::default())?),
        Arc::new(HealthChecker::new(HealthConfig::default())),
    )
    .await;
    let app = create_app(state);

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "serving HTTP API");
    axum::serve(listener, app).await?;
    Ok(())
}

fn print_analyze(
    format: &OutputFormat,
    session_id: SessionId,
    summary: &crate::pipeline::AnalyzeSummary,
) {
    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "session_id": session_id,
                "ad_count": summary.ad_count,
                "anomaly_count": summary.anomaly_count,
                "insufficient_data": summary.insufficient_data,
                "records_dropped": summary.records_dropped,
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap());
        }
        OutputFormat::Table => {
            println!("session: {session_id}");
            println!(
                "{:<20} {:<20} {:<20} {:<16}",
                "ads", "anomalies", "insufficient_data", "records_dropped"
            );
            println!(
                "{:<20} {:<20} {:<20} {:<16}",
                summary.ad_count, summary.anomaly_count, summary.insufficient_data, summary.records_dropped
            );
        }
    }
}

fn print_recommend(
    format: &OutputFormat,
    recommendations: &[crate::domain::Recommendation],
    summary: &crate::pipeline::RecommendSummary,
) {
    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "recommendations": recommendations,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap());
        }
        OutputFormat::Table => {
            println!(
                "{:<24} {:<16} {:<14} {:<14}",
                "ad_id", "action", "current", "proposed"
            );
            println!("{}", "-".repeat(70));
            for rec in recommendations {
                println!(
                    "{:<24} {:<16} {:<14} {:<14}",
                    rec.ad_id,
                    format!("{:?}", rec.action),
                    rec.current_spend,
                    rec.proposed_new_spend
                );
            }
            println!("\npotential savings: ${}", summary.total_potential_savings);
        }
    }
}

fn print_execute(
    format: &OutputFormat,
    results: &[crate::execution::ExecutionResult],
    summary: &crate::execution::ExecutionSummary,
) {
    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "results": results,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap());
        }
        OutputFormat::Table => {
            println!("{:<24} {:<12} {:<30}", "ad_id", "state", "detail");
            println!("{}", "-".repeat(70));
            for result in results {
                println!(
                    "{:<24} {:<12} {:<30}",
                    result.ad_id,
                    format!("{:?}", result.state),
                    result.detail
                );
            }
            println!(
                "\nsuccess={} failed={} skipped={} dry_run={}",
                summary.success, summary.failed, summary.skipped, summary.dry_run
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_analyze() {
        let cli = Cli::try_parse_from(["ad-rca-cli", "analyze", "--tenant", "acme"]).unwrap();
        assert!(matches!(cli.command, Commands::Analyze { .. }));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn cli_verifies() {
        Cli::command().debug_assert();
    }
}
