use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use murmur_gateway::api::ApiServer;
use murmur_gateway::{Config, GroqClient};

/// Murmur - browser voice chat gateway with Groq-backed replies
#[derive(Parser)]
#[command(name = "murmur", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "MURMUR_PORT", default_value = "5000")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Serve the web UI from this directory instead of the embedded page
    #[arg(long, env = "MURMUR_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; the DEBUG env var bumps the crate
    // to debug level, matching the configuration flag
    let debug_env = std::env::var("DEBUG").is_ok_and(|v| !v.is_empty() && v != "0");
    let filter = match (cli.verbose, debug_env) {
        (0, false) => "info,murmur_gateway=info",
        (0, true) | (1, _) => "info,murmur_gateway=debug",
        (2, _) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env();
    tracing::debug!(
        model = %config.model,
        max_turns = config.max_turns,
        "loaded configuration"
    );

    if config.fallback_mode() {
        tracing::info!("GROQ_API_KEY not set - running in fallback mode with canned replies");
    } else {
        tracing::info!(model = %config.model, "groq upstream enabled");
    }

    let backend = Arc::new(GroqClient::new(config.api_key.clone(), config.model.clone()));
    let server = ApiServer::new(&config, backend, cli.port, cli.static_dir);

    tracing::info!(
        port = cli.port,
        "murmur gateway ready - open http://127.0.0.1:{}/ in a speech-capable browser",
        cli.port
    );

    server.run().await?;

    Ok(())
}
