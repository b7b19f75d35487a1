#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use event_planner::config::Config;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub const PASSWORD: &str = "secret123";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        event_planner::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let router = event_planner::build_app(pool.clone(), &test_config());

        Self { router, db: pool }
    }

    /// Serve the app on an ephemeral local port and return its base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Sign up a user with [`PASSWORD`] and return the response body.
    pub async fn signup(&self, username: &str, role: &str) -> Value {
        let resp = self
            .post_json(
                "/api/auth/signup",
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                    "role": role,
                }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, username: &str) -> String {
        let resp = self
            .post_json(
                "/api/auth/login",
                json!({ "username": username, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await["access_token"]
            .as_str()
            .expect("login should return a token")
            .to_string()
    }

    /// Sign up and log in, returning the token.
    pub async fn user(&self, username: &str) -> String {
        self.signup(username, "user").await;
        self.login(username).await
    }

    pub async fn organizer(&self, username: &str) -> String {
        self.signup(username, "organizer").await;
        self.login(username).await
    }

    /// Create an event as the given organizer and return its id.
    pub async fn create_event(&self, token: &str, title: &str, date: &str) -> String {
        let resp = self
            .post_json(
                "/api/events/",
                json!({
                    "title": title,
                    "date": date,
                    "time": "18:00",
                    "location": "Main Hall",
                    "description": format!("All about {title}"),
                }),
                Some(token),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_str().unwrap().to_string()
    }

    pub async fn invite(&self, token: &str, event_id: &str, usernames: &[&str]) -> Response {
        self.post_json(
            &format!("/api/events/{event_id}/invite"),
            json!({ "usernames": usernames }),
            Some(token),
        )
        .await
    }

    pub async fn rsvp(&self, token: &str, event_id: &str, response: &str) -> Response {
        self.post_json(
            &format!("/api/events/{event_id}/rsvp"),
            json!({ "response": response }),
            Some(token),
        )
        .await
    }

    /// Send a GET request with an optional bearer token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST JSON request with an optional bearer token.
    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional bearer token.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("DELETE");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }
}

pub fn test_config() -> Config {
    Config {
        secret_key: "test-secret".to_string(),
        ..Config::default()
    }
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert the status and the `detail` message of an error response.
pub async fn assert_detail(resp: Response, status: StatusCode, expected: &str) {
    assert_eq!(resp.status(), status);
    let body = body_json(resp).await;
    assert_eq!(body["detail"], expected);
}

/// Usernames in a JSON array field, in order.
pub fn names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}
