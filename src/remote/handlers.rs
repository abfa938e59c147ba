use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::protocol::{GetRequest, GetResponse, PutRequest, PutResponse};
use crate::storage::Store;
use crate::storage::handlers::error_status;

pub async fn handle_rpc_get(
    Extension(store): Extension<Arc<Store>>,
    Json(req): Json<GetRequest>,
) -> (StatusCode, Json<GetResponse>) {
    match store.get(&req.key).await {
        Ok(Some(url)) => (StatusCode::OK, Json(GetResponse { url: Some(url) })),
        Ok(None) => (StatusCode::NOT_FOUND, Json(GetResponse { url: None })),
        Err(e) => {
            tracing::error!("RPC get {} failed: {}", req.key, e);
            (error_status(&e), Json(GetResponse { url: None }))
        }
    }
}

pub async fn handle_rpc_put(
    Extension(store): Extension<Arc<Store>>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    match store.put(&req.url).await {
        Ok(key) => {
            tracing::debug!("RPC put issued key {}", key);
            (
                StatusCode::OK,
                Json(PutResponse {
                    key: Some(key),
                    error: None,
                }),
            )
        }
        Err(e) => {
            tracing::error!("RPC put failed: {}", e);
            (
                error_status(&e),
                Json(PutResponse {
                    key: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
