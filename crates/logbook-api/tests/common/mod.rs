//! Shared harness: an in-memory service driven through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use logbook_api::state::AppStateInner;
use logbook_crypto::{CostParams, Credentials};
use logbook_db::Database;

pub struct TestApp {
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// Title of the first error object.
    pub fn error_title(&self) -> &str {
        self.body["errors"][0]["title"].as_str().unwrap_or_default()
    }
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("open in-memory db");
        let credentials = Credentials::new(CostParams::minimal()).expect("hash params");
        Self {
            router: logbook_api::router(AppStateInner::new(db, credentials)),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, auth: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, auth, None).await
    }

    pub async fn post(&self, uri: &str, auth: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, auth, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, auth: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, auth, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, auth: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, auth, None).await
    }

    /// Enlist `username` with password `pw-<username>` and return (id, auth header).
    pub async fn enlist(&self, username: &str) -> (i64, String) {
        let password = format!("pw-{username}");
        let res = self
            .post(
                "/api/auth/enlist",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": password,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        let id = res.body["data"]["id"].as_str().unwrap().parse().unwrap();
        (id, basic(username, &password))
    }

    /// Write an entry and return its id.
    pub async fn write(&self, auth: &str, content: &str, visibility: &str) -> String {
        let res = self
            .post(
                "/api/entries",
                Some(auth),
                json!({ "content": content, "visibility": visibility }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body["data"]["id"].as_str().unwrap().to_string()
    }
}
