//! Router assembly and the HTTP server loop.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::api::error::ApiError;
use crate::api::types::HealthResponse;
use crate::api::{entities, groups, tasks};
use crate::io::store::DocumentStore;
use crate::model::document::Document;
use crate::ops::check::{CheckResult, check_document};

/// Request body cap for every route
pub const BODY_LIMIT: usize = 1024 * 1024;

/// Shared handler state
pub struct AppState {
    pub store: DocumentStore,
}

impl AppState {
    pub fn new(store: DocumentStore) -> Arc<Self> {
        Arc::new(AppState { store })
    }
}

/// Run store work on the blocking pool. The store holds a std mutex
/// across file I/O, which must not park the async workers.
pub(crate) async fn with_store<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&DocumentStore) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.store))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "store task failed");
            ApiError::Internal(e.to_string())
        })?
}

/// Build the `/api` router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/data", get(data))
        .route("/check", get(check))
        .route(
            "/groups",
            get(groups::list_groups)
                .post(groups::create_group)
                .patch(groups::update_groups)
                .delete(groups::delete_group),
        )
        .route(
            "/projects",
            get(entities::list_projects)
                .post(entities::create_projects)
                .patch(entities::update_projects)
                .delete(entities::delete_projects),
        )
        .route(
            "/labels",
            get(entities::list_labels)
                .post(entities::create_labels)
                .patch(entities::update_labels)
                .delete(entities::delete_labels),
        )
        .route(
            "/tasks",
            get(tasks::list_tasks)
                .post(tasks::create_tasks)
                .patch(tasks::update_tasks)
                .delete(tasks::delete_tasks),
        )
        .route("/reorder", post(tasks::reorder));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, state: Arc<AppState>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    tracing::info!(addr = %bound, data = %state.store.path().display(), "taskdeck listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutting down");
        })
        .await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn data(State(state): State<Arc<AppState>>) -> Result<Json<Document>, ApiError> {
    let doc = with_store(&state, |store| Ok(store.snapshot()?)).await?;
    Ok(Json(doc))
}

async fn check(State(state): State<Arc<AppState>>) -> Result<Json<CheckResult>, ApiError> {
    let doc = with_store(&state, |store| Ok(store.snapshot()?)).await?;
    Ok(Json(check_document(&doc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_with_store_reports_panics_as_internal() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::new(DocumentStore::new(tmp.path().join("taskdeck.json")));
        let err = with_store(&state, |_| -> Result<(), ApiError> { panic!("store closure panicked") })
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_with_store_maps_storage_errors() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::new(DocumentStore::new(tmp.path().join("missing.json")));
        let err = with_store(&state, |store| Ok(store.snapshot()?)).await.unwrap_err();
        assert_eq!(err.code(), "DATA_FILE_READ_ERROR");
    }
}

