use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::render::{
    generate_ring_svg, render_page, svg_to_png, DEFAULT_RING_SIZE, MAX_RASTER_SIDE,
};
use crate::view::{ViewSnapshot, YearProgressView};

const MIN_RING_SIZE: u32 = 64;
const MAX_RING_SIZE: u32 = 2048;
const MIN_SCALE: f32 = 0.25;
const MAX_SCALE: f32 = 8.0;

// Everything served depends on the clock or the theme.
const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

pub type ViewHandle = Arc<YearProgressView>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RingQuery {
    size: Option<u32>,
    scale: Option<f32>,
}

impl RingQuery {
    fn size(&self) -> u32 {
        self.size
            .unwrap_or(DEFAULT_RING_SIZE)
            .clamp(MIN_RING_SIZE, MAX_RING_SIZE)
    }

    /// Requested scale, lowered further so `size * scale` fits the raster cap.
    fn scale(&self) -> f32 {
        let requested = match self.scale {
            Some(scale) if scale.is_finite() => scale.clamp(MIN_SCALE, MAX_SCALE),
            _ => 1.0,
        };
        requested.min(MAX_RASTER_SIDE as f32 / self.size() as f32)
    }
}

pub fn router(view: ViewHandle) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/theme/toggle", post(toggle_theme))
        .route("/progress", get(progress_json))
        .route("/progress.svg", get(progress_svg))
        .route("/progress.png", get(progress_png))
        .route("/health", get(health_check))
        .with_state(view)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(16 * 1024)),
        )
}

async fn page(State(view): State<ViewHandle>) -> Response {
    let state = view.state().await;
    (NO_CACHE, render_page(&state, view.days_passed())).into_response()
}

async fn toggle_theme(State(view): State<ViewHandle>) -> Redirect {
    view.toggle_theme().await;
    Redirect::to("/")
}

async fn progress_json(State(view): State<ViewHandle>) -> Response {
    let snapshot: ViewSnapshot = view.snapshot().await;
    (NO_CACHE, Json(snapshot)).into_response()
}

async fn progress_svg(State(view): State<ViewHandle>, Query(query): Query<RingQuery>) -> Response {
    let state = view.state().await;
    let svg = generate_ring_svg(&state, query.size());
    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        NO_CACHE,
        svg,
    )
        .into_response()
}

async fn progress_png(
    State(view): State<ViewHandle>,
    Query(query): Query<RingQuery>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let state = view.state().await;
    let svg = generate_ring_svg(&state, query.size());
    let scale = query.scale();

    let png = tokio::task::spawn_blocking(move || svg_to_png(&svg, scale))
        .await
        .map_err(|e| internal_error(format!("Render task failed: {}", e)))?
        .map_err(|e| internal_error(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], NO_CACHE, png).into_response())
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
}

async fn health_check() -> &'static str {
    "OK"
}
