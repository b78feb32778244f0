//! Gatehouse - account allocation gateway

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::{
    allocator::Allocator,
    auth::{Authenticator, TokenRegistry},
    cache::PartitionCache,
    config::Args,
    queue::WriteBackRegistry,
    server,
    service::AccountService,
    store::{BackingStore, MemoryStore, SheetsStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gatehouse={},info", log_level).into()),
        )
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Gatehouse - account allocation gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Default sheet: {}", args.default_sheet);
    info!("Data rows: {}-{}", args.data_start_row, args.data_end_row);
    info!("Cache TTL: {}s", args.cache_ttl_secs);
    info!("Flush delay: {}ms", args.flush_delay_ms);
    info!("======================================");

    let (backing, auth): (Arc<dyn BackingStore>, Arc<dyn Authenticator>) = if args.dev_mode {
        warn!("Using in-memory store; nothing is persisted");
        (
            Arc::new(MemoryStore::new()),
            Arc::new(TokenRegistry::dev(&args.dev_token, &args.dev_store_id)),
        )
    } else {
        let store = SheetsStore::new(args.sheets_config())?;
        info!("Sheets API: {}", args.sheets_api_base);
        let tokens = match &args.tokens_file {
            Some(path) => TokenRegistry::load(path)?,
            None => anyhow::bail!("TOKENS_FILE is required in production mode"),
        };
        (Arc::new(store), Arc::new(tokens))
    };

    let queues = Arc::new(WriteBackRegistry::new(Arc::clone(&backing), args.queue_config()));
    let cache = Arc::new(
        PartitionCache::new(backing, args.cache_config()).with_write_back(Arc::clone(&queues)),
    );
    let service = Arc::new(AccountService::new(
        cache,
        queues,
        auth,
        Allocator::new(&args.system_email_domains),
        args.default_sheet.clone(),
    ));

    let state = Arc::new(server::AppState::new(args, service));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server::run(state, shutdown).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    info!("Gatehouse stopped");
    Ok(())
}
