//! Wire-contract tests for the preview endpoint, driven in-memory.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use mdpreview::http::{router, AppState};
use mdpreview::store::SessionStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::util::ServiceExt;

fn state() -> AppState {
    AppState {
        store: Arc::new(RwLock::new(SessionStore::new())),
        port: 3000,
    }
}

async fn register(state: &AppState, html: &str) -> String {
    state
        .store
        .write()
        .await
        .register(html.to_string(), Path::new("/tmp/doc.md"), 50)
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_cors_headers(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, OPTIONS"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type"
    );
}

#[tokio::test]
async fn info_page_reports_port_and_session_count() {
    let state = state();
    let app = router(state.clone());

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);
    let text = body_text(response).await;
    assert!(text.contains("Markdown Preview Server"));
    assert!(text.contains("port 3000"));
    assert!(text.contains("Active previews: 0"));

    register(&state, "<p>x</p>").await;
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Active previews: 1"));
}

#[tokio::test]
async fn serves_registered_preview_with_html_headers() {
    let state = state();
    let id = register(&state, "<h1>Doc</h1>").await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::get(format!("/preview/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache"
    );
    assert_eq!(body_text(response).await, "<h1>Doc</h1>");
}

#[tokio::test]
async fn unknown_preview_id_is_404() {
    let app = router(state());
    let response = app
        .oneshot(
            Request::get("/preview/0123456789abcdef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors_headers(&response);
    assert_eq!(body_text(response).await, "Preview not found");
}

#[tokio::test]
async fn malformed_preview_ids_are_404() {
    let app = router(state());
    for bad in [
        "/preview/short",
        "/preview/0123456789abcde",   // 15 chars
        "/preview/0123456789abcdef0", // 17 chars
        "/preview/0123456789ABCDEF",  // uppercase
        "/preview/0123456789abcdeg",  // non-hex
    ] {
        let response = app
            .clone()
            .oneshot(Request::get(bad).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{bad}");
        assert_eq!(body_text(response).await, "Preview not found", "{bad}");
    }
}

#[tokio::test]
async fn unknown_paths_are_404() {
    let app = router(state());
    for path in ["/nope", "/preview", "/preview/", "/preview/a/b"] {
        let response = app
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_cors_headers(&response);
        assert_eq!(body_text(response).await, "Not found", "{path}");
    }
}

#[tokio::test]
async fn unknown_methods_are_404_not_405() {
    let app = router(state());
    for (method, path) in [
        (Method::POST, "/"),
        (Method::DELETE, "/"),
        (Method::PUT, "/preview/0123456789abcdef"),
    ] {
        let request = Request::builder()
            .method(method.clone())
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {path}");
        assert_eq!(body_text(response).await, "Not found", "{method} {path}");
    }
}

#[tokio::test]
async fn options_answers_200_on_any_path() {
    let app = router(state());
    for path in ["/", "/preview/0123456789abcdef", "/anything/else"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_cors_headers(&response);
        assert_eq!(body_text(response).await, "", "{path}");
    }
}
