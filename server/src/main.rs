use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use thiserror::Error;
use tracing::info;

mod game;
mod handlers;
mod logic;
mod prompts;
mod rooms;
mod state;

use crate::prompts::{WordListPrompts, DEFAULT_CATEGORY};
use crate::rooms::sweep_idle_rooms;
use crate::state::{AppState, Config};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding index.html, game.html and the client bundle.
    #[arg(long)]
    public_dir: Option<PathBuf>,
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,
    #[arg(long, default_value = DEFAULT_CATEGORY)]
    prompt_category: String,
    /// Seconds an empty room survives before it is swept.
    #[arg(long, default_value_t = 600)]
    room_ttl_secs: u64,
}

#[derive(Debug, Error)]
enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server crashed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));
    let config = Config {
        public_dir,
        prompt_category: args.prompt_category,
        room_ttl: Duration::from_secs(args.room_ttl_secs),
    };
    let state = AppState::new(config, Arc::new(WordListPrompts::default()));
    let sweep_state = state.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweep_idle_rooms(&sweep_state, Instant::now()).await;
            if removed > 0 {
                info!(removed, "swept idle rooms");
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(port = args.port, "SketchDuel running at http://localhost:{}", args.port);

    axum::serve(listener, handlers::router(state))
        .await
        .map_err(ServerError::Serve)
}
