//! Common test utilities for integration tests.
//!
//! The router runs over the in-memory stores, so most tests need no database.
//! Tests that do need one call [`test_pool`] and are skipped when
//! `TEST_DATABASE_URL` is unset.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use domain::services::{
    InMemoryAccountStore, InMemoryDonationStore, InMemoryPhotoStore, InMemoryProfileStore,
};
use fake::{
    faker::{internet::en::SafeEmail, name::en::Name},
    Fake,
};
use foodlink_api::{
    app::{create_app, Stores},
    config::{
        Config, DatabaseConfig, JwtAuthConfig, LoggingConfig, SecurityConfig, ServerConfig,
        StorageConfig,
    },
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;
use uuid::Uuid;

pub const PHOTO_BASE_URL: &str = "http://photos.test";

/// Connects to `TEST_DATABASE_URL` and applies the migrations.
///
/// Returns `None` when the variable is unset.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Test configuration signing tokens with an HS256 secret.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 8 * 1024 * 1024,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_secs: 1,
            idle_timeout_secs: 1,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "compact".to_string(),
        },
        security: SecurityConfig::default(),
        jwt: JwtAuthConfig {
            secret: "integration-test-secret-of-at-least-32-bytes".to_string(),
            private_key: String::new(),
            public_key: String::new(),
            access_token_expiry_secs: 3600,
            leeway_secs: 0,
        },
        storage: StorageConfig {
            photo_dir: "target/test-photos".to_string(),
            public_base_url: PHOTO_BASE_URL.to_string(),
        },
    }
}

/// Router plus handles on the stores behind it.
pub struct TestApp {
    pub router: Router,
    pub donations: Arc<InMemoryDonationStore>,
    pub photos: Arc<InMemoryPhotoStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_donation_store(InMemoryDonationStore::new())
    }

    pub fn with_donation_store(store: InMemoryDonationStore) -> Self {
        let donations = Arc::new(store);
        let photos = Arc::new(InMemoryPhotoStore::new(PHOTO_BASE_URL));
        let stores = Stores {
            donations: donations.clone(),
            profiles: Arc::new(InMemoryProfileStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            photos: photos.clone(),
        };
        let router = create_app(test_config(), stores).expect("Failed to build test app");

        Self {
            router,
            donations,
            photos,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Signs up a fresh user with the given role.
    pub async fn sign_up(&self, role: &str) -> TestUser {
        let email: String = SafeEmail().fake();
        let email = format!("{}.{}", Uuid::new_v4().simple(), email);
        let full_name: String = Name().fake();
        let password = "plates-and-pans-42".to_string();

        let response = self
            .send(json_request(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "full_name": full_name,
                    "role": role,
                }),
            ))
            .await;
        let status = response.status();
        let json = parse_response_body(response).await;
        assert_eq!(status, StatusCode::CREATED, "sign up failed: {}", json);

        TestUser {
            email,
            password,
            token: json["access_token"].as_str().unwrap().to_string(),
            profile_id: json["profile"]["id"].as_str().unwrap().to_string(),
        }
    }
}

/// A signed-up user and their session token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub email: String,
    pub password: String,
    pub token: String,
    pub profile_id: String,
}

/// Helper to create a JSON request, optionally authenticated.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Helper to create a bodyless request, optionally authenticated.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

const BOUNDARY: &str = "foodlink-test-boundary";

/// Builds a `multipart/form-data` donation post.
pub struct DonationForm {
    fields: Vec<(String, String)>,
    photo: Option<(String, Vec<u8>)>,
}

impl DonationForm {
    /// A valid form: 20 plates of cooked meals good for 6 hours.
    pub fn valid() -> Self {
        Self {
            fields: vec![
                ("food_type".into(), "Cooked Meals".into()),
                ("quantity".into(), "20 plates".into()),
                ("servings".into(), "20".into()),
                ("location".into(), "Community Kitchen, Main St".into()),
                ("expiry_hours".into(), "6".into()),
            ],
            photo: None,
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.retain(|(n, _)| n != name);
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn photo(mut self, content_type: &str, bytes: Vec<u8>) -> Self {
        self.photo = Some((content_type.to_string(), bytes));
        self
    }

    pub fn into_request(self, token: &str) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in &self.fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((content_type, bytes)) = &self.photo {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"food\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/donations")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body))
            .unwrap()
    }
}

/// Posts `form` as `donor` and returns the created donation's id.
pub async fn post_donation(app: &TestApp, donor: &TestUser, form: DonationForm) -> String {
    let response = app.send(form.into_request(&donor.token)).await;
    let status = response.status();
    let json = parse_response_body(response).await;
    assert_eq!(status, StatusCode::CREATED, "post failed: {}", json);
    json["id"].as_str().unwrap().to_string()
}
