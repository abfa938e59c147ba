//! Public HTTP handlers: key redirects and the submission form.

use axum::{
    Form,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::StoreError;
use super::service::Store;
use crate::config::Site;

const ADD_FORM: &str = r#"<!doctype html>
<form method="POST" action="/add">
URL: <input type="text" name="url">
Key: <input type="text" name="key">
Password: <input type="password" name="pw">
<input type="submit" value="Add">
</form>
"#;

/// Maps a store error onto the HTTP status a client should see.
pub fn error_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::KeyConflict(_) => StatusCode::CONFLICT,
        StoreError::EmptyUrl => StatusCode::BAD_REQUEST,
        StoreError::KeySpaceExhausted(_) => StatusCode::INSUFFICIENT_STORAGE,
        StoreError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        StoreError::RemoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Remote(_) => StatusCode::BAD_GATEWAY,
        StoreError::Forbidden => StatusCode::FORBIDDEN,
    }
}

/// Compares the submitted secret against the configured one.
pub fn check_password(site: &Site, given: &str) -> Result<(), StoreError> {
    if given == site.password {
        Ok(())
    } else {
        Err(StoreError::Forbidden)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub pw: String,
}

pub async fn handle_redirect(
    Extension(store): Extension<Arc<Store>>,
    Path(key): Path<String>,
) -> Response {
    match store.resolve(&key).await {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
        Err(e) => {
            if !matches!(e, StoreError::KeyNotFound(_)) {
                tracing::error!("Lookup of {} failed: {}", key, e);
            }
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

pub async fn handle_add_form() -> Html<&'static str> {
    Html(ADD_FORM)
}

pub async fn handle_add(
    Extension(store): Extension<Arc<Store>>,
    Extension(site): Extension<Arc<Site>>,
    Form(form): Form<AddForm>,
) -> Response {
    if let Err(e) = check_password(&site, &form.pw) {
        tracing::warn!("Rejected add with bad password");
        return (error_status(&e), e.to_string()).into_response();
    }

    let result = if form.key.is_empty() {
        store.put(&form.url).await
    } else {
        store
            .put_custom(&form.key, &form.url)
            .await
            .map(|()| form.key.clone())
    };

    match result {
        Ok(key) => {
            tracing::info!("Added {} -> {}", key, form.url);
            (StatusCode::OK, site.short_link(&key)).into_response()
        }
        Err(e) => {
            tracing::warn!("Add failed: {}", e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}
