//! Parley REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes the two store tiers and the turn
//! processor, then starts the HTTP server. Configuration is env-first
//! (PARLEY_* variables) with CLI flags layered on top.

mod http;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use clap_complete::generate;
use secrecy::SecretString;
use tracing::info;

use http::router::build_router;
use state::{AppConfig, AppState};

#[derive(Parser)]
#[command(name = "parley", version, about = "Stateless conversation-thread persistence service")]
struct Cli {
    /// Bridge tracing spans to an OpenTelemetry stdout exporter.
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve(ServeArgs),

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value_t = 8700)]
    port: u16,

    /// Data directory; the SQLite database lives here.
    #[arg(long, env = "PARLEY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Redis endpoint for the cache tier (e.g. redis://127.0.0.1/).
    /// Without it, an in-process TTL cache is used.
    #[arg(long, env = "PARLEY_REDIS_URL")]
    redis_url: Option<String>,

    /// TTL for cache records, in seconds.
    #[arg(long, env = "PARLEY_CACHE_TTL_SECS", default_value_t = 3600)]
    cache_ttl_secs: u64,

    /// Bound on the cached recent-message window.
    #[arg(long, env = "PARLEY_CACHE_WINDOW", default_value_t = 50)]
    cache_window: usize,

    /// Serialize the load-process-save span per session.
    #[arg(long, env = "PARLEY_SERIALIZE_SESSIONS")]
    serialize_sessions: bool,

    /// Base URL of the OpenAI-compatible completion endpoint.
    #[arg(long, env = "PARLEY_LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    llm_base_url: String,

    /// Model identifier for the turn processor.
    #[arg(long, env = "PARLEY_LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,

    /// API key for the completion endpoint.
    #[arg(long, env = "PARLEY_LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,
}

impl ServeArgs {
    fn into_config(self) -> AppConfig {
        let data_dir = self.data_dir.unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".parley")
        });

        AppConfig {
            data_dir,
            redis_url: self.redis_url,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_window: self.cache_window,
            serialize_sessions: self.serialize_sessions,
            llm_base_url: self.llm_base_url,
            llm_model: self.llm_model,
            llm_api_key: self.llm_api_key.map(SecretString::from),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    parley_observe::tracing_setup::init_tracing(cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))?;

    match cli.command {
        Commands::Serve(args) => {
            let host = args.host.clone();
            let port = args.port;
            let state = AppState::init(args.into_config()).await?;

            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "parley listening");

            axum::serve(listener, build_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    parley_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
