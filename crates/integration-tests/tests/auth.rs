//! Sign-in, sign-out and route protection.

use axum::http::StatusCode;

use supportdesk_integration_tests::{TestApp, body_string, location, session_cookie};
use supportdesk_web::db::StoreOp;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let app = TestApp::new();

    assert_eq!(app.get("/health/ready", None).await.status(), StatusCode::OK);

    app.store.fail(StoreOp::Ping);
    assert_eq!(
        app.get("/health/ready", None).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_root_redirects_to_tickets() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/tickets"));
}

#[tokio::test]
async fn test_pages_redirect_to_login_without_session() {
    let app = TestApp::new();

    for path in ["/tickets", "/tickets/new"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/auth/login"), "{path}");
    }
    assert_eq!(app.store.total_calls(), 0);
}

#[tokio::test]
async fn test_htmx_requests_get_401_with_hx_redirect() {
    let app = TestApp::new();

    let response = app.hx_get("/tickets/list", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("HX-Redirect")
            .and_then(|v| v.to_str().ok()),
        Some("/auth/login")
    );
    assert_eq!(app.store.calls(StoreOp::ListTickets), 0);
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::new();

    let response = app.get("/auth/login?error=username", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("name=\"username\""));
    assert!(body.contains("Please enter a username."));
}

#[tokio::test]
async fn test_blank_username_is_rejected() {
    let app = TestApp::new();

    let response = app
        .post_form("/auth/login", "username=+++", None, false)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login?error=username"));
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_sign_in_shows_tickets_with_flash() {
    let app = TestApp::new();
    let cookie = app.sign_in("ana").await;

    let response = app.get("/tickets", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("ana"));
    assert!(body.contains("Signed in"));
    assert!(body.contains("hx-get=\"/tickets/list\""));
    assert!(body.contains("tickets-changed from:body"));

    // Flash is shown once
    let body = body_string(app.get("/tickets", Some(&cookie)).await).await;
    assert!(!body.contains("Signed in"));
}

#[tokio::test]
async fn test_signed_in_login_page_redirects() {
    let app = TestApp::new();
    let cookie = app.sign_in("ana").await;

    let response = app.get("/auth/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/tickets"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let cookie = app.sign_in("ana").await;

    let response = app.post_form("/auth/logout", "", Some(&cookie), false).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));

    let response = app.get("/tickets", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));
}

#[tokio::test]
async fn test_tampered_cookie_is_ignored() {
    let app = TestApp::new();
    let cookie = app.sign_in("ana").await;
    let tampered = format!("{cookie}x");

    let response = app.get("/tickets", Some(&tampered)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
