use shortlink::config::{Config, PASSWORD_ENV, USAGE};
use shortlink::remote::HttpRemote;
use shortlink::server::{router, spawn_stats_reporter};
use shortlink::storage::{ProxyStore, Store, UrlStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    let config = Config::from_args(args, std::env::var(PASSWORD_ENV).ok())?;
    if config.site.password.is_empty() {
        tracing::warn!("No write password set; anyone can add links");
    }

    // 1. Storage layer:
    let store = match &config.master {
        Some(master) => {
            tracing::info!("Starting as proxy of {}", master);
            Store::Proxy(ProxyStore::new(HttpRemote::new(master, config.rpc_timeout)))
        }
        None => {
            tracing::info!("Starting as authoritative store");
            Store::Authoritative(UrlStore::open(config.store_options()).await)
        }
    };
    let store = Arc::new(store);

    // 2. Stats reporter:
    let stats = spawn_stats_reporter(store.clone());

    // 3. HTTP server:
    let app = router(store.clone(), Arc::new(config.site.clone()));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    tracing::info!("HTTP server listening on {}", config.listen_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await?;

    // 4. Final save:
    stats.abort();
    tracing::info!("Shutting down, flushing store");
    if let Err(e) = store.flush().await {
        tracing::error!("Final flush failed: {}", e);
    }

    Ok(())
}
