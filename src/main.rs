//! SMS spam classification gateway entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spamguard::api::{create_router, AppState};
use spamguard::config::Config;
use spamguard::metrics;
use spamguard::model::ModelStore;
use spamguard::utils::shutdown_signal;

/// SMS spam classification gateway.
#[derive(Parser, Debug)]
#[command(name = "spamguard")]
#[command(about = "HTTP gateway serving a pre-trained SMS spam classifier")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides the PORT environment variable).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the prediction API (default).
    Run {
        /// HTTP server port (overrides the PORT environment variable).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Resolve the model artifact once and report it, without serving.
    FetchModel,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("spamguard=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::FetchModel) => cmd_fetch_model().await,
        Some(Command::Run { port }) => cmd_run(port).await,
        None => cmd_run(args.port).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SPAMGUARD - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Model Dir: {}", config.model_dir.display());
    println!("  Model Path: {}", config.model_path().display());
    println!(
        "  Model URL: {}",
        config.model_url.as_deref().unwrap_or("not set")
    );
    println!(
        "  Local Artifact: {}",
        if config.model_path().exists() {
            "present"
        } else {
            "missing"
        }
    );
    println!("  Port: {}", config.port);
    println!("  Log Level: {}", config.rust_log);
    println!("  Download Timeout: {}ms", config.http_timeout_ms);

    if !config.model_path().exists() && config.model_url.is_none() {
        println!("  WARNING: no local artifact and no MODEL_URL; the service will start unhealthy!");
    }

    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Resolve the model artifact once and report it.
async fn cmd_fetch_model() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SPAMGUARD - MODEL FETCH");
    println!("======================================================================");

    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    println!("Model Path: {}", config.model_path().display());
    println!(
        "Model URL: {}",
        config.model_url.as_deref().unwrap_or("not set")
    );

    println!("\nResolving model artifact...\n");

    let store = ModelStore::new(&config);
    match store.ensure_ready().await {
        Ok(handle) => {
            let classifier = handle.classifier();
            println!("MODEL READY");
            println!("----------------------------------------------------------------------");
            println!("  Classifier: {}", classifier.name);
            println!("  Features: {}", classifier.n_features);
            println!("  Tree Nodes: {}", classifier.tree.len());
            println!("  Source: {}", handle.source().display());
            println!("  Loaded At: {}", handle.loaded_at());
            println!("======================================================================");
            Ok(())
        }
        Err(e) => {
            println!("MODEL UNAVAILABLE");
            println!("  Error: {}", e);
            println!("======================================================================");
            Err(anyhow::anyhow!("Model fetch failed"))
        }
    }
}

/// Serve the prediction API.
async fn cmd_run(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Model path: {}", config.model_path().display());
    info!(
        "Model URL: {}",
        config.model_url.as_deref().unwrap_or("not set")
    );

    // Install the Prometheus recorder
    let metrics_handle = metrics::install_recorder()?;

    // Create app state; the model handle is published once loading finishes
    let app_state = AppState::new(metrics_handle);

    // Start the HTTP server before resolving the model so /health reports
    // the load window truthfully and /predict refuses with 503 until ready
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // Resolve the model artifact and publish the handle
    let store = ModelStore::new(&config);
    match store.ensure_ready().await {
        Ok(handle) => {
            info!(
                classifier = %handle.classifier().name,
                source = %handle.source().display(),
                "Model ready, serving predictions"
            );
            if !app_state.set_model(handle) {
                warn!("Model handle was already set");
            }
        }
        Err(e) => {
            // Keep serving: /health stays 503 and /predict refuses, which is
            // more useful to an orchestrator than a crash loop.
            error!("Model loading failed: {}", e);
        }
    }

    server_handle.await??;

    info!("Shutdown complete");
    Ok(())
}
