//! A minimal demo HTTP front-end over the top-level [`Recur`] API: two
//! routes, `schedule` and `read`, each a thin wrapper with no
//! orchestration logic of its own — auth, multi-tenant routing, and an
//! admin console are explicitly out of scope for this binary.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use recur_core::Recur;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    recur: Arc<Recur>,
}

/// Builds the demo router over an already-configured [`Recur`] instance.
/// The caller owns lifecycle concerns (binding, TLS, shutdown) — this
/// function only wires routes.
pub fn router(recur: Arc<Recur>) -> Router {
    Router::new()
        .route("/tasks/{name}/schedule", post(schedule))
        .route("/tasks/{name}/read", get(read))
        .with_state(AppState { recur })
}

#[derive(Debug, Serialize)]
struct ScheduleResponse {
    memo_key: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn schedule(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<serde_json::Value>,
) -> axum::response::Response {
    match state.recur.schedule(&name, args).await {
        Ok(call) => {
            info!(task_name = %name, memo_key = %call.memo_key, "scheduled via HTTP");
            (
                StatusCode::ACCEPTED,
                Json(ScheduleResponse {
                    memo_key: call.memo_key,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(task_name = %name, error = %e, "schedule failed");
            error_response(StatusCode::BAD_REQUEST, e)
        }
    }
}

async fn read(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let args_raw = match params.get("args") {
        Some(raw) => raw,
        None => return error_response(StatusCode::BAD_REQUEST, "missing `args` query parameter"),
    };
    let args: serde_json::Value = match serde_json::from_str(args_raw) {
        Ok(v) => v,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("invalid JSON in `args`: {e}")),
    };

    match state
        .recur
        .read::<serde_json::Value>(&name, args)
        .await
    {
        Ok(value) => Json(value).into_response(),
        Err(recur_core::RecurError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "no value computed for this call yet")
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recur_backend_memory::{InMemoryCache, InMemoryQueue, InMemoryStore};
    use recur_codec_json::JsonCodec;
    use std::sync::Arc as StdArc;
    use tower::ServiceExt;

    async fn demo_app() -> Router {
        let mut builder = Recur::builder()
            .with_store(StdArc::new(InMemoryStore::new()))
            .with_queue(StdArc::new(InMemoryQueue::new()))
            .with_codec(StdArc::new(JsonCodec::new()))
            .with_cache(StdArc::new(InMemoryCache::new()));
        let _double: recur_core::CallableProxy<u64, u64> =
            builder.register_task("double", |_ctx, n: u64| async move { Ok(n * 2) });
        let recur = builder.build().unwrap();
        router(StdArc::new(recur))
    }

    #[tokio::test]
    async fn schedule_then_worker_then_read_round_trips() {
        let app = demo_app().await;

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/tasks/double/schedule")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("21"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn read_missing_value_is_404() {
        let app = demo_app().await;
        let request = axum::http::Request::builder()
            .method("GET")
            .uri("/tasks/double/read?args=21")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
