//! HTTP endpoint serving registered previews.

use crate::store::{self, SharedStore};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// State shared with the request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub port: u16,
}

/// Build the preview router.
///
/// The wire contract is deliberately small: an informational root page, the
/// preview lookup, OPTIONS answered 200 everywhere, and a plain-text 404
/// for everything else (unknown methods included, no 405s). The fixed CORS
/// headers go on every response so no handler can forget them.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(info_page).options(preflight).fallback(not_found))
        .route(
            "/preview/:id",
            get(serve_preview).options(preflight).fallback(not_found),
        )
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(state)
}

async fn info_page(State(state): State<AppState>) -> Html<String> {
    let active = state.store.read().await.len();
    Html(format!(
        "<h1>Markdown Preview Server</h1>\n\
         <p>Server running on port {}</p>\n\
         <p>Active previews: {}</p>",
        state.port, active
    ))
}

async fn serve_preview(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // Reject anything that is not exactly a preview id before touching the
    // store; bad ids and stale ids are indistinguishable to the client.
    if !store::is_preview_id(&id) {
        return preview_not_found();
    }

    // Lookups bump the idle timer, hence the write lock.
    let content = state.store.write().await.get(&id).map(str::to_owned);
    match content {
        Some(body) => ([(header::CACHE_CONTROL, "no-cache")], Html(body)).into_response(),
        None => preview_not_found(),
    }
}

fn preview_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Preview not found").into_response()
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

async fn fallback(method: Method) -> Response {
    // Preflights may target any path.
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    not_found().await.into_response()
}
