//! blockkv Node Binary
//!
//! Opens the store under the node home and serves the application to the
//! consensus engine until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use blockkv::network::Server;
use blockkv::{Config, Engine, KvStoreApp};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// blockkv node
#[derive(Parser, Debug)]
#[command(name = "blockkv-node")]
#[command(about = "Key-value application for a BFT consensus engine")]
#[command(version)]
struct Args {
    /// Node home directory (config/config.toml, data/); defaults to $HOME/.blockkv
    #[arg(long)]
    home: Option<PathBuf>,

    /// Listen address (host:port), overrides the config file
    #[arg(short, long)]
    listen: Option<String>,

    /// Log filter, overrides the config file (RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    let home = args.home.clone().unwrap_or_else(default_home);

    let mut config = match Config::load(&home) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", home.display(), e);
            std::process::exit(1);
        }
    };
    if let Some(listen) = args.listen {
        config.network.listen_addr = listen;
    }
    if let Some(level) = args.log_level {
        config.log.level = level;
    }

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("blockkv node v{}", blockkv::VERSION);
    tracing::info!("Home directory: {}", home.display());
    tracing::info!("Data directory: {}", config.data_dir.display());

    let engine = match Engine::open(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let app = Arc::new(KvStoreApp::new(engine.clone()));
    let mut server = Server::new(config, app.clone());
    let shutdown = server.shutdown_handle();

    // Block the main thread on Ctrl-C / SIGTERM
    let (signal_tx, signal_rx) = crossbeam::channel::bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    let (done_tx, done_rx) = crossbeam::channel::bounded(1);
    let server_thread = match thread::Builder::new()
        .name("acceptor".to_string())
        .spawn(move || {
            let _ = done_tx.send(server.run());
        }) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to start server thread: {}", e);
            std::process::exit(1);
        }
    };

    let mut exit_code = 0;
    crossbeam::channel::select! {
        recv(signal_rx) -> _ => {
            tracing::info!("Received interrupt, shutting down...");
            shutdown.shutdown();
            if let Ok(Err(e)) = done_rx.recv() {
                tracing::error!("Server error: {}", e);
                exit_code = 1;
            }
        }
        recv(done_rx) -> result => {
            if let Ok(Err(e)) = result {
                tracing::error!("Server error: {}", e);
            }
            exit_code = 1;
        }
    }
    let _ = server_thread.join();

    let dropped = app.close();
    if dropped > 0 {
        tracing::warn!("Discarded open block with {} uncommitted writes", dropped);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Node stopped");
    std::process::exit(exit_code);
}

fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".blockkv")
}
