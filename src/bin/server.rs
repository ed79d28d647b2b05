//! TableKV Server Binary
//!
//! Starts the TCP server for TableKV.

use std::sync::Arc;

use clap::Parser;
use tablekv::network::Server;
use tablekv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// TableKV Server
#[derive(Parser, Debug)]
#[command(name = "tablekv-server")]
#[command(about = "Networked key-value store with named tables")]
#[command(version)]
struct Args {
    /// Directory holding one file per table
    #[arg(short, long, default_value = "./db")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Snapshot queue capacity before writers wait on the disk
    #[arg(short = 'q', long, default_value = "1024")]
    queue_capacity: usize,

    /// Number of lock stripes in the table cache
    #[arg(long, default_value = "16")]
    cache_shards: usize,

    /// Idle read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// fsync every table file after it is rewritten
    #[arg(long)]
    sync: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tablekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("TableKV Server v{}", tablekv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .persist_queue_capacity(args.queue_capacity)
        .cache_shards(args.cache_shards)
        .read_timeout_ms(args.read_timeout_ms)
        .sync_on_write(args.sync)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    // Bind the listener; this is the only fatal network error
    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // First Ctrl+C stops accepting and drains the queue, a second one exits
    let handle = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        if handle.is_shutdown() {
            std::process::exit(130);
        }
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        handle.shutdown();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
    drop(server);

    // Sessions still running keep their engine reference; close it if we
    // hold the last one, otherwise wait for what is queued so far
    let drained = match Arc::try_unwrap(engine) {
        Ok(engine) => engine.close(),
        Err(engine) => engine.sync(),
    };
    if let Err(e) = drained {
        tracing::error!("Failed to drain persistence queue: {}", e);
    }
    tracing::info!("Server stopped");
}
