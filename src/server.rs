use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Site;
use crate::remote::handlers::{handle_rpc_get, handle_rpc_put};
use crate::remote::protocol::{ENDPOINT_RPC_GET, ENDPOINT_RPC_PUT};
use crate::storage::Store;
use crate::storage::handlers::{handle_add, handle_add_form, handle_redirect};

/// Interval of the background stats log line.
pub const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// All routes of a node. Proxies serve the RPC endpoints too, answering from
/// their cache or forwarding to their own master.
pub fn router(store: Arc<Store>, site: Arc<Site>) -> Router {
    Router::new()
        .route("/add", get(handle_add_form).post(handle_add))
        .route(ENDPOINT_RPC_GET, post(handle_rpc_get))
        .route(ENDPOINT_RPC_PUT, post(handle_rpc_put))
        .route("/:key", get(handle_redirect))
        .layer(Extension(store))
        .layer(Extension(site))
}

/// Logs the size of the local table every `STATS_INTERVAL`.
pub fn spawn_stats_reporter(store: Arc<Store>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);

        loop {
            interval.tick().await;
            tracing::info!("Store stats: role={} entries={}", store.role(), store.len());
        }
    })
}
