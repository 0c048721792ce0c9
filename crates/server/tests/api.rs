use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use shared::model::{FormulaName, Role};

mod common;
use common::*;

fn has_violation(body: &Value, field: &str, constraint: &str) -> bool {
    body["violations"]
        .as_array()
        .map(|violations| {
            violations
                .iter()
                .any(|v| v["field"] == field && v["constraint"] == constraint)
        })
        .unwrap_or(false)
}

#[tokio::test]
async fn test_public_operations_need_no_credentials() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);

    // A bad token is ignored on public routes
    let (status, _) = app.request(Method::GET, "/api/ping", Some("mallory"), None).await;
    assert_eq!(status, StatusCode::OK);

    // HEAD is answered by the GET handler under the same tier
    let (status, body) = app.request(Method::HEAD, "/api/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    let (status, _) = app.request(Method::HEAD, "/api/greeting", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::HEAD, "/api/exercises", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_greeting_counts_requests() {
    let app = TestApp::new().await;

    let (status, first) = app.request(Method::GET, "/api/greeting", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, json!({ "id": 1, "content": "Hello, World!" }));

    let (_, second) = app.request(Method::GET, "/api/greeting?name=Ada", None, None).await;
    assert_eq!(second, json!({ "id": 2, "content": "Hello, Ada!" }));

    let (status, body) =
        app.request(Method::GET, "/api/greeting?name=Ada&name=Bob", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert!(has_violation(&body, "query", "format"), "{body}");
}

#[tokio::test]
async fn test_missing_or_invalid_credentials() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/exercises", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "authentication");

    let (status, invalid) = app.request(Method::GET, "/api/exercises", Some("mallory"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Clients can't tell a missing token from a bad one
    assert_eq!(invalid, body);
}

#[tokio::test]
async fn test_insufficient_role_is_forbidden() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = app.request(Method::GET, "/api/users", Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "authorization");

    let (status, _) =
        app.request(Method::POST, "/api/user_exercises", Some("alice"), Some(squat())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        app.request(Method::GET, "/api/exercises/1/statistics", Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "kind": "not_found", "entity": "user" }));

    let user = app.register("alice").await;
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["role"], Value::Null);
    assert!(user.get("firebaseId").is_none());

    let (status, me) = app.request(Method::GET, "/api/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me, user);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/users",
            Some("alice"),
            Some(json!({ "username": "alice2", "sex": "FEMALE", "height": 170 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "firebaseId");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/users",
            Some("bob"),
            Some(json!({ "username": "alice", "sex": "MALE", "height": 180 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["field"], "username");
}

#[tokio::test]
async fn test_registration_reports_every_violation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/users",
            Some("alice"),
            Some(json!({ "username": "al", "email": "a@@b", "height": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert!(has_violation(&body, "username", "length"), "{body}");
    assert!(has_violation(&body, "email", "email_strict"), "{body}");
    assert!(has_violation(&body, "sex", "required"), "{body}");
    assert!(has_violation(&body, "height", "positive"), "{body}");
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_violation(&body, "body", "format"), "{body}");
}

#[tokio::test]
async fn test_unknown_sex_is_reported_with_other_violations() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/users",
            Some("alice"),
            Some(json!({ "username": "al", "email": "a@@b", "sex": "X", "height": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert!(has_violation(&body, "username", "length"), "{body}");
    assert!(has_violation(&body, "email", "email_strict"), "{body}");
    assert!(has_violation(&body, "sex", "format"), "{body}");
    assert!(has_violation(&body, "height", "positive"), "{body}");
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() {
    let app = TestApp::new().await;
    let profile = json!({ "username": "x".repeat(8000), "sex": "MALE", "height": 180 });

    // Streamed without a length, so the limit is hit while buffering
    let (status, body) =
        app.request(Method::POST, "/api/users", Some("alice"), Some(profile.clone())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["kind"], "payload_too_large", "{body}");

    // A declared length over the limit is refused before the handler
    let payload = profile.to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["kind"], "payload_too_large", "{body}");
}

#[tokio::test]
async fn test_missing_content_type_is_unsupported_media_type() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
        .body(Body::from(json!({ "username": "alice", "sex": "MALE", "height": 180 }).to_string()))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["kind"], "unsupported_media_type", "{body}");
}

#[tokio::test]
async fn test_unparseable_path_id_is_a_validation_error() {
    let app = TestApp::new().await;
    app.register("alice").await;
    app.register_with_role("admin", Role::Admin).await;

    for (uri, as_user) in [
        ("/api/exercises/abc", "alice"),
        ("/api/exercises/abc/logs", "alice"),
        ("/api/exercises/1.5/statistics", "alice"),
        ("/api/users/abc", "admin"),
    ] {
        let (status, body) = app.request(Method::GET, uri, Some(as_user), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["kind"], "validation", "{uri}");
        assert!(has_violation(&body, "id", "format"), "{uri}: {body}");
    }
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, user) = app
        .request(
            Method::PUT,
            "/api/me",
            Some("alice"),
            Some(json!({
                "username": "alice_lifts",
                "email": "lifts@example.com",
                "sex": "OTHER",
                "height": 172
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{user}");
    assert_eq!(user["username"], "alice_lifts");
    assert_eq!(user["height"], 172);

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/me",
            Some("alice"),
            Some(json!({ "username": "alice_lifts", "email": "nope", "sex": "OTHER", "height": 172 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_violation(&body, "email", "email_strict"), "{body}");
}

#[tokio::test]
async fn test_admin_manages_roles() {
    let app = TestApp::new().await;
    app.register_with_role("admin", Role::Admin).await;
    let bob = app.register("bob").await;
    let bob_id = bob["id"].as_i64().unwrap();

    let (status, users) = app.request(Method::GET, "/api/users", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(2));

    let (status, user) = app
        .request(
            Method::PUT,
            &format!("/api/users/{bob_id}/role"),
            Some("admin"),
            Some(json!({ "role": "PREMIUM" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "PREMIUM");

    // The new role applies to bob's next request
    let (status, _) =
        app.request(Method::POST, "/api/user_exercises", Some("bob"), Some(squat())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.request(Method::GET, "/api/users/999", Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exercise_ownership() {
    let app = TestApp::new().await;
    app.register_with_role("admin", Role::Admin).await;
    let alice = app.register_with_role("alice", Role::Premium).await;
    app.register("bob").await;

    let catalog = app.catalog_exercise(squat()).await;
    assert_eq!(catalog["kind"], "catalog");
    let catalog_id = catalog["id"].as_i64().unwrap();

    let (status, own) = app
        .request(
            Method::POST,
            "/api/user_exercises",
            Some("alice"),
            Some(json!({
                "name": "Sandbag carry",
                "description": "Bear hug, walk",
                "muscleGroups": ["Abs", "Back"],
                "loggingTypes": ["Distance", "Time"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{own}");
    assert_eq!(own["kind"], "userAuthored");
    assert_eq!(own["createdBy"], alice["id"]);
    let own_id = own["id"].as_i64().unwrap();
    let own_uri = format!("/api/exercises/{own_id}");

    // Others only see the catalog
    let (_, listed) = app.request(Method::GET, "/api/exercises", Some("bob"), None).await;
    assert_eq!(listed, json!([catalog.clone()]));
    let (status, _) = app.request(Method::GET, &own_uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app.request(Method::GET, "/api/exercises", Some("alice"), None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    // Admins can look but not change
    let (status, _) = app.request(Method::GET, &own_uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        app.request(Method::PUT, &own_uri, Some("admin"), Some(squat())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) =
        app.request(Method::PUT, &own_uri, Some("alice"), Some(squat())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Squat");
    assert_eq!(updated["createdBy"], alice["id"]);

    let catalog_uri = format!("/api/exercises/{catalog_id}");
    let (status, _) =
        app.request(Method::DELETE, &catalog_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request(Method::DELETE, &own_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request(Method::GET, &own_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exercise_violations_are_aggregated() {
    let app = TestApp::new().await;
    app.register_with_role("alice", Role::Premium).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/user_exercises",
            Some("alice"),
            Some(json!({
                "name": "x".repeat(257),
                "muscleGroups": [],
                "loggingTypes": ["Reps"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(has_violation(&body, "name", "length"), "{body}");
    assert!(has_violation(&body, "muscleGroups", "not_empty"), "{body}");
    assert_eq!(body["violations"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_logs_and_statistics() {
    let app = TestApp::new().await;
    app.register_with_role("admin", Role::Admin).await;
    app.register_with_role("alice", Role::Premium).await;
    app.register("bob").await;
    let squat_id = app.catalog_exercise(squat()).await["id"].as_i64().unwrap();
    let logs_uri = format!("/api/exercises/{squat_id}/logs");
    let stats_uri = format!("/api/exercises/{squat_id}/statistics");

    let (status, stats) = app.request(Method::GET, &stats_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["formula"], "epley");
    assert_eq!(stats["estimatedOneRepMaxG"], 0);
    assert_eq!(stats["loggedSets"], 0);

    let (status, log) = app
        .request(
            Method::POST,
            &logs_uri,
            Some("alice"),
            Some(json!({ "sets": [
                { "weightG": 100000, "reps": 10 },
                { "weightG": 80000, "reps": 12 }
            ] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{log}");
    assert_eq!(log["exerciseId"], squat_id);

    // Reps alone don't record a RepsWeight set
    let (status, body) = app
        .request(Method::POST, &logs_uri, Some("alice"), Some(json!({ "sets": [{ "reps": 5 }] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, _) = app
        .request(
            Method::POST,
            &logs_uri,
            Some("bob"),
            Some(json!({ "sets": [{ "weightG": 60000, "reps": 5 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, alice_logs) = app.request(Method::GET, &logs_uri, Some("alice"), None).await;
    assert_eq!(alice_logs.as_array().map(Vec::len), Some(1));

    let (_, stats) = app.request(Method::GET, &stats_uri, Some("alice"), None).await;
    assert_eq!(stats["estimatedOneRepMaxG"], 133333);
    assert_eq!(stats["maxWeightG"], 100000);
    assert_eq!(stats["maxReps"], 12);
    assert_eq!(stats["loggedSets"], 2);

    let (status, _) = app
        .request(Method::GET, "/api/exercises/999/logs", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_configured_formula_is_used() {
    let app = TestApp::with_formula(FormulaName::Lombardi).await;
    app.register_with_role("admin", Role::Admin).await;
    let squat_id = app.catalog_exercise(squat()).await["id"].as_i64().unwrap();

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/exercises/{squat_id}/logs"),
            Some("admin"),
            Some(json!({ "sets": [{ "weightG": 100000, "reps": 10 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, stats) = app
        .request(Method::GET, &format!("/api/exercises/{squat_id}/statistics"), Some("admin"), None)
        .await;
    assert_eq!(stats["formula"], "lombardi");
    assert_eq!(stats["estimatedOneRepMaxG"], 125893);
}

#[tokio::test]
async fn test_reset_clears_application_data() {
    let app = TestApp::new().await;
    app.register_with_role("admin", Role::Admin).await;
    app.catalog_exercise(squat()).await;

    app.reset().await;

    let (status, _) = app.request(Method::GET, "/api/me", Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let user = app.register("admin").await;
    assert_eq!(user["id"], 1);
    assert_eq!(user["role"], Value::Null);

    let (_, listed) = app.request(Method::GET, "/api/exercises", Some("admin"), None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["entity"], "route");
}
