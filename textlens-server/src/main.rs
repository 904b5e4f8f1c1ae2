use std::sync::Arc;

use clap::Parser;
use textlens_core::{OpenAiAnalyzer, TextAnalyzer, TextlensConfig};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use textlens_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "textlens.toml")]
    config: String,

    /// Validate configuration and credentials, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience - production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match TextlensConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let analyzer = match OpenAiAnalyzer::from_config(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to create model client: {}", e);
            std::process::exit(1);
        }
    };

    if args.check {
        println!("✅ Config loaded from {}", args.config);
        println!("✅ Model: {} via {}", analyzer.model(), config.model.base_url);
        println!("✅ API key found in {}", config.model.api_key_env);
        return Ok(());
    }

    tracing::info!(
        model = analyzer.model(),
        backend = analyzer.name(),
        timeout_seconds = config.model.timeout_seconds,
        "Model client ready"
    );

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = Arc::new(HttpState::new(Arc::new(analyzer), config));
    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
