//! Shared harness: the full router over an in-memory store, with JWTs
//! minted for seeded users.

#![cfg(feature = "web-axum")]

use std::sync::Arc;

use api_adapters::{router, AppState, SafeHtmlRenderer};
use auth_adapters::JwtAuthenticator;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use domains::NewUser;
use secrecy::SecretString;
use serde_json::{json, Value};
use services::{ForumServices, Repositories};
use storage_adapters::InMemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

pub struct TestApp {
    pub app: Router,
    pub services: ForumServices,
    pub store: Arc<InMemoryStore>,
    auth: Arc<JwtAuthenticator>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let services = ForumServices::new(Repositories::from_store(store.clone()));
        let auth = Arc::new(JwtAuthenticator::new(
            &SecretString::from("integration-secret".to_string()),
            Duration::hours(1),
        ));
        let state = AppState::new(services.clone(), auth.clone(), Arc::new(SafeHtmlRenderer));
        Self {
            app: router(state),
            services,
            store,
            auth,
        }
    }

    async fn create(&self, username: &str, is_staff: bool, is_superuser: bool) -> TestUser {
        let user = self
            .services
            .accounts
            .create_user(NewUser {
                username: username.into(),
                is_staff,
                is_superuser,
            })
            .await
            .expect("user is created");
        TestUser {
            id: user.id,
            username: user.username,
            token: self.auth.issue(user.id).expect("token is issued"),
        }
    }

    pub async fn user(&self, username: &str) -> TestUser {
        self.create(username, false, false).await
    }

    pub async fn staff(&self, username: &str) -> TestUser {
        self.create(username, true, false).await
    }

    pub async fn superuser(&self, username: &str) -> TestUser {
        self.create(username, true, true).await
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        as_user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = as_user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, as_user: Option<&TestUser>) -> (StatusCode, Value) {
        self.request("GET", uri, as_user, None).await
    }

    pub async fn post(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(as_user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(as_user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(as_user), None).await
    }

    /// Creates a thread and returns its slug.
    pub async fn thread(&self, author: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post("/api/threads", author, json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["slug"].as_str().expect("slug").to_string()
    }

    /// Creates a post and returns its id.
    pub async fn reply(&self, author: &TestUser, slug: &str, text: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/threads/{slug}/posts"),
                author,
                json!({ "body": text }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("post id").to_string()
    }

    /// Applies a moderation patch as `moderator`.
    pub async fn moderate(
        &self,
        moderator: &TestUser,
        target: &str,
        patch: Value,
    ) -> (StatusCode, Value) {
        self.patch(&format!("/api/users/{target}/moderation"), moderator, patch)
            .await
    }

    /// Unix seconds `hours` from now.
    pub fn hours_from_now(hours: i64) -> i64 {
        (Utc::now() + Duration::hours(hours)).timestamp()
    }
}
