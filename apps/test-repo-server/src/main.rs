//! Admin API server for the writing-test repository.
//!
//! Wires the test store and the HTTP router together with configuration
//! parsing and Ctrl+C shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use test_repo_api::{config::ApiConfig, router::Router, server::Server};
use test_repo_core::{DeletePolicy, IdAllocation, StoreConfig, TestStore};
use tokio::signal;

/// Command-line arguments for the repository server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Directory holding the test documents
    #[arg(long, default_value = "./data")]
    data_dir: String,

    /// File name of the default document inside the data directory
    #[arg(long, default_value = "writing-tests.json")]
    document: String,

    /// Id allocation for appends without an id (max-plus-one, monotonic)
    #[arg(long, default_value_t = IdAllocation::MaxPlusOne)]
    id_allocation: IdAllocation,

    /// Behavior when deleting an absent id (lenient, strict)
    #[arg(long, default_value_t = DeletePolicy::Lenient)]
    delete_policy: DeletePolicy,

    /// Treat missing documents as empty instead of failing
    #[arg(long)]
    create_if_missing: bool,

    /// Write compact JSON instead of indented
    #[arg(long)]
    compact: bool,

    /// Maximum wait for a document lock in milliseconds (0 = wait forever)
    #[arg(long, default_value_t = 0)]
    lock_timeout_ms: u64,

    /// Request body timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    let store_config = StoreConfig {
        data_dir: PathBuf::from(&args.data_dir),
        document_name: args.document.clone(),
        id_allocation: args.id_allocation,
        delete_policy: args.delete_policy,
        create_if_missing: args.create_if_missing,
        pretty: !args.compact,
        lock_timeout_ms: args.lock_timeout_ms,
    };
    let api_config = Arc::new(ApiConfig {
        request_timeout_ms: args.request_timeout_ms,
        max_body_bytes: args.max_body_bytes,
    });

    let document_path = store_config.document_path();
    if !document_path.exists() && !args.create_if_missing {
        tracing::warn!(
            "Default document {} does not exist; reads will fail until it is created",
            document_path.display()
        );
    }

    let store = Arc::new(TestStore::new(store_config));
    let router = Router::new(store, api_config);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let server = Server::new(addr, router);

    tracing::info!(
        host = %args.host,
        port = args.port,
        data_dir = %args.data_dir,
        document = %args.document,
        id_allocation = %args.id_allocation,
        delete_policy = %args.delete_policy,
        "Starting writing-test repository server"
    );

    // In-flight store operations run on the blocking pool and finish even
    // after the server task is aborted.
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for Ctrl+C
    signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c")?;
    tracing::info!("Shutting down server...");
    server_handle.abort();

    Ok(())
}
