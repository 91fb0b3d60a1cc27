//! HTTP boundary: one route that serves rendered quote documents.
//!
//! The server is a thin adapter over [`crate::generate`]; it owns no
//! pipeline logic beyond translating the error taxonomy into status codes
//! and shaping the response headers.

use crate::config::RenderConfig;
use crate::error::QuoteDocError;
use crate::generate::generate;
use crate::store::QuoteStore;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared handler state: the quote store and the pipeline configuration.
pub struct AppState {
    pub store: Arc<dyn QuoteStore>,
    pub config: RenderConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/quotes/{id}/document", get(quote_document))
        .with_state(state)
}

/// Run the router on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("listening on {addr}");
    }
    axum::serve(listener, router(state)).await
}

async fn quote_document(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match generate(state.store.as_ref(), &id, &state.config).await {
        Ok(artifact) => {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
            let disposition = format!("inline; filename=\"{}\"", artifact.filename);
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(CONTENT_DISPOSITION, value);
            }
            (StatusCode::OK, headers, artifact.bytes).into_response()
        }
        Err(QuoteDocError::NotFound { id }) => {
            info!("quote {id} not found");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Quote not found" })),
            )
                .into_response()
        }
        Err(e) => {
            error!("document generation for {id} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Internal Server Error",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
