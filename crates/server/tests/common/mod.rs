#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use deadpool_sqlite::Pool;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{
    cli::Cli,
    db,
    identity::{DecodedIdentity, IdentityVerifier, InvalidCredential},
    routes, AppState,
};
use shared::{
    model::{FormulaName, Role, User},
    types::UserId,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Accepts `token-<name>` for every name it was built with
#[derive(Debug, Default)]
pub struct StubVerifier {
    identities: HashMap<String, DecodedIdentity>,
}

impl StubVerifier {
    pub fn with(mut self, name: &str) -> Self {
        let identity = DecodedIdentity {
            subject: format!("uid-{name}"),
            name: Some(name.to_owned()),
            email: Some(format!("{name}@example.com")),
            email_verified: true,
            issuer: "https://securetoken.google.com/repbook-test".to_owned(),
            picture: None,
        };
        self.identities.insert(token(name), identity);
        self
    }
}

impl IdentityVerifier for StubVerifier {
    fn verify(&self, token: &str) -> Result<DecodedIdentity, InvalidCredential> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| InvalidCredential::Rejected("unknown test token".to_owned()))
    }
}

pub fn token(name: &str) -> String {
    format!("token-{name}")
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool,
    // Keeps the database file alive for the lifetime of the app
    _dir: TempDir,
}

pub fn test_cli(connection_string: String, formula: FormulaName) -> Cli {
    Cli {
        sqlite_connection_string: connection_string,
        port: 0,
        bind_addr: "127.0.0.1".to_owned(),
        cors_origin: "http://localhost:8080".to_owned(),
        firebase_project_id: "repbook-test".to_owned(),
        firebase_keys_path: "unused.json".into(),
        one_rep_max_formula: formula,
        request_body_limit: 4096,
        debug_delete_database: false,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_formula(FormulaName::Epley).await
    }

    pub async fn with_formula(formula: FormulaName) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repbook.sqlite").to_str().unwrap().to_owned();

        db::run_migrations(&path, "0.1.0").unwrap();
        let pool = db::create_pool(&path).unwrap();

        let verifier = StubVerifier::default()
            .with("alice")
            .with("bob")
            .with("carol")
            .with("admin");
        let state = AppState::new(pool.clone(), test_cli(path, formula), Arc::new(verifier));

        Self { router: routes::router(state), pool, _dir: dir }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        as_user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(name) = as_user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(name)));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            },
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    /// Register `name` with a valid profile and return the created user
    pub async fn register(&self, name: &str) -> Value {
        let (status, user) = self
            .request(
                Method::POST,
                "/api/users",
                Some(name),
                Some(json!({ "username": name, "sex": "FEMALE", "height": 170 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");
        user
    }

    /// Registers `name` and gives them `role` directly in the database
    pub async fn register_with_role(&self, name: &str, role: Role) -> Value {
        let user = self.register(name).await;
        self.set_role(UserId(user["id"].as_i64().unwrap()), Some(role)).await;
        user
    }

    pub async fn set_role(&self, id: UserId, role: Option<Role>) -> User {
        let conn = self.pool.get().await.unwrap();
        conn.interact(move |conn| User::set_role(conn, id, role))
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn reset(&self) {
        let conn = self.pool.get().await.unwrap();
        conn.interact(db::reset_database).await.unwrap().unwrap();
    }

    /// Create a catalog exercise as `admin`, who must already have the role
    pub async fn catalog_exercise(&self, body: Value) -> Value {
        let (status, exercise) =
            self.request(Method::POST, "/api/exercises", Some("admin"), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{exercise}");
        exercise
    }
}

pub fn squat() -> Value {
    serde_json::from_str(include_str!("../fixtures/squat.json")).unwrap()
}
