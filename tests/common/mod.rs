#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use fren::fren_config::{
    CorsConfig, CryptoConfig, Environment, JwtConfig, ServerConfig, UploadConfig,
};
use fren::modules::roles::model::RoleId;
use fren::modules::users::model::{User, UserStatus};
use fren::router::init_router;
use fren::state::{AppConfig, AppState, local_storage};
use fren::store::memory::MemoryStore;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery staple";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-jwt-secret".to_string(),
        token_ttl: 60,
    }
}

pub fn test_config(storage_dir: PathBuf) -> AppConfig {
    AppConfig {
        jwt: jwt_config(),
        crypto: CryptoConfig {
            secret: "integration-crypto-secret".to_string(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        server: ServerConfig {
            port: 0,
            environment: Environment::Test,
            request_timeout: Duration::from_secs(10),
            body_limit: 1024 * 1024,
        },
        upload: UploadConfig {
            storage_dir,
            base_url: "http://localhost/files".to_string(),
            max_file_size: 512 * 1024,
            avatar_max_dimension: 100,
        },
        admin: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub storage_dir: PathBuf,
}

pub async fn spawn_app() -> TestApp {
    let storage_dir = std::env::temp_dir().join(format!("fren-test-{}", Uuid::new_v4()));
    let config = test_config(storage_dir.clone());

    let store = Arc::new(MemoryStore::new());
    let storage = local_storage(&config.upload);
    let state = AppState::new(store.clone(), store.clone(), storage, config);
    state.bootstrap().await.unwrap();

    let router = init_router(state.clone()).unwrap();
    TestApp {
        router,
        state,
        store,
        storage_dir,
    }
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}

impl TestApp {
    pub async fn create_user(&self, status: UserStatus, roles: &[RoleId]) -> User {
        let user = self
            .state
            .users
            .create(&unique_email(), "Test", "User", PASSWORD, status)
            .await
            .unwrap();
        for role in roles {
            self.state.roles.enable(user.id, *role).await.unwrap();
        }
        user
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, body)
    }

    /// Logs in and returns the issued token.
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({ "username": email, "password": PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(empty_request(Method::GET, uri, token)).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

pub const BOUNDARY: &str = "fren-test-boundary";

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// Signature and IHDR chunk of a PNG with the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0]);
    data
}
