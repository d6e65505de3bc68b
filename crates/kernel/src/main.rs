//! Launchpad Journal backend.

use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use launchpad_kernel::bootstrap::{self, BootstrapReport};
use launchpad_kernel::config::Config;
use launchpad_kernel::lifecycle::{compute_read_time, count_words};
use launchpad_kernel::models::SeedData;
use launchpad_kernel::routes;
use launchpad_kernel::session;
use launchpad_kernel::state::AppState;

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Launchpad Journal content backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bootstrap, then serve the API (default).
    Serve,
    /// Run the bootstrap only and print what it did.
    Seed,
    /// Print the read-time estimate for a file, or stdin when omitted.
    ReadTime {
        /// HTML or text file to estimate.
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::ReadTime { file } => read_time(file),
        Command::Seed => {
            init_tracing();
            let config = Config::from_env().context("failed to load configuration")?;
            let state = AppState::new(&config)
                .await
                .context("failed to initialize application state")?;
            let report = run_bootstrap(&state).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Serve => {
            init_tracing();
            serve().await
        }
    }
}

async fn serve() -> Result<()> {
    info!("Starting Launchpad backend");

    // Load configuration from environment
    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, "Configuration loaded");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    if config.skip_bootstrap {
        info!("SKIP_BOOTSTRAP set, not seeding");
    } else {
        run_bootstrap(&state).await?;
    }

    let session_layer = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let same_site = session::parse_same_site(&config.cookie_same_site);
            let layer = session::create_session_layer(redis_url, same_site)
                .await
                .context("failed to create session layer")?;
            info!("Redis sessions enabled");
            Some(layer)
        }
        None => None,
    };

    let app = routes::app(state, session_layer);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn run_bootstrap(state: &AppState) -> Result<BootstrapReport> {
    let seed = SeedData::load(state.config().seed_file.as_deref())
        .context("failed to load seed data")?;

    bootstrap::run(&state.bootstrap_context(), &seed)
        .await
        .context("bootstrap failed")
}

fn read_time(file: Option<PathBuf>) -> Result<()> {
    let content = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let words = count_words(Some(&content));
    let minutes = compute_read_time(Some(&content));
    println!("{words} words, {minutes} min read");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
