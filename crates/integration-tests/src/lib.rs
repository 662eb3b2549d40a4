//! Integration test harness for SupportDesk.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no external services)
//! cargo test -p supportdesk-integration-tests
//!
//! # Live tests against PostgreSQL and a running server
//! DESK_TEST_DATABASE_URL=postgres://... DESK_TEST_BASE_URL=http://localhost:3000 \
//!     cargo test -p supportdesk-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Sign-in, sign-out and route protection
//! - `tickets` - List, creation dialog, detail and status toggle
//! - `live_postgres` - `PgTicketStore` and HTTP smoke tests (ignored by default)
//!
//! Router tests drive the real [`supportdesk_web::app`] with
//! `tower::ServiceExt::oneshot`, backed by [`InMemoryTicketStore`] and a
//! `MemoryStore` for sessions.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

use supportdesk_core::{ProductId, TicketCategory, TicketId, TicketStatus, UserId};
use supportdesk_web::config::{DeskConfig, SentryConfig};
use supportdesk_web::db::InMemoryTicketStore;
use supportdesk_web::models::{Product, Ticket};
use supportdesk_web::state::AppState;

/// High-entropy secret accepted by config validation.
pub const TEST_SESSION_SECRET: &str = "k7#Qz9!mW2@pL5$vB8&nR3*tY6^cX1%a";

/// Configuration that never touches the environment.
#[must_use]
pub fn test_config() -> DeskConfig {
    DeskConfig {
        database_url: SecretString::from("postgres://unused@localhost/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").expect("valid test URL"),
        session_secret: SecretString::from(TEST_SESSION_SECRET),
        sentry: SentryConfig::default(),
    }
}

/// A router over an in-memory store, plus handles to inspect that store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryTicketStore>,
}

impl TestApp {
    /// App with no products and no tickets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(InMemoryTicketStore::new())
    }

    /// App over a pre-built store.
    #[must_use]
    pub fn with_store(store: InMemoryTicketStore) -> Self {
        let store = Arc::new(store);
        let state = AppState::new(test_config(), store.clone());
        let router = supportdesk_web::app(state, MemoryStore::default());
        Self { router, store }
    }

    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `GET path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request("GET", path, cookie, false, Body::empty()))
            .await
    }

    /// HTMX `GET path`.
    pub async fn hx_get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request("GET", path, cookie, true, Body::empty()))
            .await
    }

    /// Form `POST path`. `htmx` adds the `HX-Request` header.
    pub async fn post_form(
        &self,
        path: &str,
        form: &str,
        cookie: Option<&str>,
        htmx: bool,
    ) -> Response<Body> {
        let mut req = request("POST", path, cookie, htmx, Body::from(form.to_owned()));
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded"
                .parse()
                .expect("valid header"),
        );
        self.send(req).await
    }

    /// Sign in as `username` and return the session cookie (`name=value`).
    pub async fn sign_in(&self, username: &str) -> String {
        let response = self
            .post_form("/auth/login", &format!("username={username}"), None, false)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login sets a session cookie")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn request(
    method: &str,
    path: &str,
    cookie: Option<&str>,
    htmx: bool,
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(body).expect("valid request")
}

/// `name=value` of the session cookie set by `response`, if any.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("sd_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

/// Response body as a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

/// Parsed `HX-Trigger` header, if present.
#[must_use]
pub fn hx_trigger(response: &Response<Body>) -> Option<Value> {
    let raw = response.headers().get("HX-Trigger")?.to_str().ok()?;
    serde_json::from_str(raw).ok()
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::LOCATION)?.to_str().ok()
}

/// An open ticket created `age` ago.
#[must_use]
pub fn ticket(title: &str, category: TicketCategory, age: Duration) -> Ticket {
    let created_at: DateTime<Utc> = Utc::now() - age;
    Ticket {
        id: TicketId::generate(),
        user_id: UserId::for_username("fixture"),
        title: title.to_owned(),
        description: format!("{title} details"),
        category,
        product_id: None,
        status: TicketStatus::Open,
        created_at,
        updated_at: created_at,
    }
}

/// A product.
#[must_use]
pub fn product(name: &str, available: bool) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        available,
    }
}
