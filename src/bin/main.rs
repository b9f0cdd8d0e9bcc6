use ad_rca::cli::{execute_command, Cli};
use ad_rca::observability::init_tracing_default;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing_default();
    let cli = Cli::parse();
    execute_command(cli).await
}
