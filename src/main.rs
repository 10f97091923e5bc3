use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use marksd::config::Config;
use marksd::http::{self, AppState};
use marksd::logging;

#[derive(Parser)]
#[command(name = "marksd")]
#[command(version)]
#[command(about = "Student marks web backend", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides `bind_addr`
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.json_logs);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    let state = AppState::from_config(&config)?;
    let db = state.pool.config();
    tracing::info!(
        database = %db.database_path().display(),
        username = %db.username,
        require_session = state.require_session,
        "database ready"
    );

    http::serve(config.bind_addr, Arc::new(state)).await
}
