use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::controllers::paste;
use crate::models::PasteView;
use crate::pages::Pages;
use crate::storage::{AnyStorage, Storage};
use crate::types::api::NewPasteRequest;
use crate::{ApiError, App};

/// Header carrying a fake "now" in milliseconds since the epoch. Only read
/// when test mode is on.
const TEST_NOW_HEADER: &str = "x-test-now-ms";

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = SocketAddr::new(app.config.host, app.config.port);
    let router = router(app);

    info!("listening on http://{addr}");

    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn router(app: App) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/healthz", get(healthz))
        .route("/api/pastes", post(create_paste))
        .route("/api/pastes/:id", get(get_paste))
        .route("/p/:id", get(view_paste))
        .layer(DefaultBodyLimit::max(app.config.limits.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index(State(pages): State<Pages>) -> crate::ApiResult<Html<String>> {
    pages.index()
}

async fn healthz(State(storage): State<AnyStorage>) -> Response {
    health(&storage)
}

fn health(storage: &impl Storage) -> Response {
    match storage.check_health() {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(err) => {
            error!("health check failed: {err:?}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ok": false, "error": "Health check failed" })),
            )
                .into_response()
        }
    }
}

async fn create_paste(
    State(app): State<App>,
    body: Result<Bytes, BytesRejection>,
) -> crate::ApiResult<impl IntoResponse> {
    // any content type is accepted as long as the body parses as JSON
    let body: Value = serde_json::from_slice(&body?).map_err(|_| ApiError::InvalidBody)?;
    let new_paste = NewPasteRequest::from_json(body)?.validate()?;

    let created = paste::create(&app, new_paste)?;
    let path = format!("/p/{}", created.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, path)], Json(created)))
}

async fn get_paste(
    State(app): State<App>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> crate::ApiResult<Json<PasteView>> {
    let now = test_time_override(&app.config, &headers);
    paste::fetch_and_decrement(&app, &key, now)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn view_paste(
    State(app): State<App>,
    Path(key): Path<String>,
) -> crate::ApiResult<Response> {
    match paste::fetch_and_decrement(&app, &key, None) {
        Some(view) => Ok(app.pages.paste(&key, &view)?.into_response()),
        None => Ok((StatusCode::NOT_FOUND, app.pages.not_found()?).into_response()),
    }
}

fn test_time_override(config: &Config, headers: &HeaderMap) -> Option<DateTime<Utc>> {
    if !config.test_mode {
        return None;
    }

    let millis: i64 = headers
        .get(TEST_NOW_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
