use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::net;
use tower_http::cors::CorsLayer;

use crate::adapters::{ApiError, NO_CHANGES_DETECTED};
use crate::config::ServerConfig;
use crate::core::{DeleteOutcome, NewToDo, ToDo, ToDoPatch, ToDoService, UpdateOutcome, timestamp};
use crate::storage::ToDoStore;

#[cfg(feature = "tracing")]
use tower_http::trace::TraceLayer;
#[cfg(feature = "tracing")]
use tracing::{info, warn};
#[cfg(feature = "tracing")]
use uuid::Uuid;

pub struct AppState<S: ToDoStore + 'static> {
    pub todo_service: ToDoService<S>,
}

impl<S: ToDoStore + 'static> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self { todo_service: self.todo_service.clone() }
    }
}

/// `Json` whose rejections answer with the API's error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct ExpiryRangeParams {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub from: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionParams {
    pub completion_percentage: i32,
}

pub async fn get_todos<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ToDo>>, ApiError> {
    Ok(Json(state.todo_service.get_all().await?))
}

pub async fn get_todo_by_id<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ToDo>, ApiError> {
    let item = state
        .todo_service
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(item))
}

pub async fn get_todos_by_expiry<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiQuery(range): ApiQuery<ExpiryRangeParams>,
) -> Result<Json<Vec<ToDo>>, ApiError> {
    let items = state
        .todo_service
        .find_by_expiry_range(range.from, range.to)
        .await?;
    Ok(Json(items))
}

pub async fn post_todos<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<NewToDo>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.todo_service.create(body).await?;
    let location = format!("/todos/{}", created.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

pub async fn put_todo<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<ToDoPatch>,
) -> Result<StatusCode, ApiError> {
    let outcome = state.todo_service.update_by_id(id, body).await?;
    require_change(outcome)
}

pub async fn patch_todo_completion<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i32>,
    ApiQuery(params): ApiQuery<CompletionParams>,
) -> Result<StatusCode, ApiError> {
    let outcome = state
        .todo_service
        .update_completion_percentage_by_id(id, params.completion_percentage)
        .await?;
    require_change(outcome)
}

/// Marking an already finished to-do again still answers 204.
pub async fn patch_todo_mark_done<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    match state.todo_service.mark_done(id).await? {
        UpdateOutcome::NotFound => Err(ApiError::NotFound),
        UpdateOutcome::Unchanged | UpdateOutcome::Updated => Ok(StatusCode::NO_CONTENT),
    }
}

pub async fn delete_todo<S: ToDoStore + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    match state.todo_service.delete_by_id(id).await? {
        DeleteOutcome::NotFound => Err(ApiError::NotFound),
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
    }
}

fn require_change(outcome: UpdateOutcome) -> Result<StatusCode, ApiError> {
    match outcome {
        UpdateOutcome::NotFound => Err(ApiError::NotFound),
        UpdateOutcome::Unchanged => Err(ApiError::BadRequest(NO_CHANGES_DETECTED.to_string())),
        UpdateOutcome::Updated => Ok(StatusCode::NO_CONTENT),
    }
}

async fn health_route() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

fn todo_routes<S: ToDoStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/todos", get(get_todos::<S>).post(post_todos::<S>))
        .route("/todos/expiry", get(get_todos_by_expiry::<S>))
        .route(
            "/todos/{id}",
            get(get_todo_by_id::<S>).put(put_todo::<S>).delete(delete_todo::<S>),
        )
        .route("/todos/{id}/completion", patch(patch_todo_completion::<S>))
        .route("/todos/{id}/mark_done", patch(patch_todo_mark_done::<S>))
}

/// The complete application router, ready to serve or to drive in tests.
pub fn router<S: ToDoStore + 'static>(todo_service: ToDoService<S>) -> Router {
    let state = AppState { todo_service };
    let router = Router::<AppState<S>>::new()
        .route("/health", get(health_route))
        .merge(todo_routes::<S>())
        .layer(CorsLayer::permissive());

    #[cfg(feature = "tracing")]
    let router = router.layer(TraceLayer::new_for_http().make_span_with(
        |request: &axum::http::Request<axum::body::Body>| {
            let request_id = Uuid::new_v4();
            tracing::info_span!(
                "http_request",
                %request_id,
                method = ?request.method(),
                uri = %request.uri(),
            )
        },
    ));

    router.with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new<S: ToDoStore + 'static>(
        todo_service: ToDoService<S>,
        config: &ServerConfig,
    ) -> anyhow::Result<Self> {
        let address = config.bind_address();
        let listener = net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to listen on {address}"))?;
        Ok(Self { router: router(todo_service), listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until Ctrl-C, then lets in-flight requests finish.
    pub async fn run(self) -> anyhow::Result<()> {
        #[cfg(feature = "tracing")]
        info!(addr = %self.local_addr()?, "HTTP server listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            #[cfg(feature = "tracing")]
            info!("Shutdown signal received");
        }
        Err(_e) => {
            #[cfg(feature = "tracing")]
            warn!(error = %_e, "Failed to listen for shutdown signal");
            // Without a signal handler the server runs until killed.
            std::future::pending::<()>().await;
        }
    }
}
