//! API integration tests
//!
//! Need a running server and database. Tokens are signed locally with
//! `JWT_SECRET` (or the development default).

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use mindbridge_server::models::user::UserClaims;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

/// Sign a token for a fresh subject
fn token_for(sub: &str, email: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .expect("Failed to sign token")
}

/// Register a new user and return (id, token)
async fn register(client: &Client, body: Value) -> (String, String) {
    let sub = Uuid::new_v4().to_string();
    let email = body["email"].as_str().expect("email").to_string();
    let token = token_for(&sub, &email);

    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    (sub, token)
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_unauthenticated_request() {
    let client = Client::new();

    let response = client
        .get(format!("{}/users/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_register_assigns_roles() {
    let client = Client::new();

    let (_, youth_token) = register(
        &client,
        json!({ "email": unique_email("youth"), "display_name": "Alex Young", "age": 16 }),
    )
    .await;
    let me: Value = client
        .get(format!("{}/users/me", BASE_URL))
        .bearer_auth(&youth_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(me["role"], "youth");
    assert_eq!(me["role_assigned_by"], "system");

    let (counsellor_id, counsellor_token) = register(
        &client,
        json!({
            "email": unique_email("counsellor"),
            "display_name": "Dr. Casey",
            "qualifications": "MSc Counselling Psychology"
        }),
    )
    .await;
    let profile = client
        .get(format!("{}/counsellors/{}", BASE_URL, counsellor_id))
        .bearer_auth(&counsellor_token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(profile.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration_conflicts() {
    let client = Client::new();
    let email = unique_email("dup");
    let (sub, token) = register(
        &client,
        json!({ "email": email, "display_name": "Dup User" }),
    )
    .await;
    assert!(!sub.is_empty());

    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "email": email, "display_name": "Dup User" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_invalid_working_hours_rejected() {
    let client = Client::new();
    let (counsellor_id, token) = register(
        &client,
        json!({ "email": unique_email("hours"), "display_name": "Dr. Hours", "is_professional": true }),
    )
    .await;

    let response = client
        .put(format!("{}/counsellors/{}/settings", BASE_URL, counsellor_id))
        .bearer_auth(&token)
        .json(&json!({
            "working_hours": { "funday": { "enabled": true, "start": "09:00", "end": "17:00" } }
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_booking_to_stats_flow() {
    let client = Client::new();

    let (counsellor_id, counsellor_token) = register(
        &client,
        json!({ "email": unique_email("flow-c"), "display_name": "Dr. Flow", "is_professional": true }),
    )
    .await;
    let (_, youth_token) = register(
        &client,
        json!({ "email": unique_email("flow-y"), "display_name": "Robin Flow", "age": 17 }),
    )
    .await;

    // Monday 09:00-17:00 and Wednesday 10:00-12:00
    let response = client
        .put(format!("{}/counsellors/{}/settings", BASE_URL, counsellor_id))
        .bearer_auth(&counsellor_token)
        .json(&json!({
            "working_hours": {
                "monday": { "enabled": true, "start": "09:00", "end": "17:00" },
                "wednesday": { "enabled": true, "start": "10:00", "end": "12:00" },
                "friday": { "enabled": false, "start": "09:00", "end": "17:00" }
            }
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let appointment: Value = client
        .post(format!("{}/appointments", BASE_URL))
        .bearer_auth(&youth_token)
        .json(&json!({
            "counsellor_id": counsellor_id,
            "appointment_date": (Utc::now() + Duration::hours(2)).to_rfc3339(),
            "session_type": "video"
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["duration"], 50);
    let appointment_id = appointment["id"].as_str().expect("id").to_string();

    // the client cannot confirm
    let response = client
        .put(format!("{}/appointments/{}/status", BASE_URL, appointment_id))
        .bearer_auth(&youth_token)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for status in ["confirmed", "completed"] {
        let response = client
            .put(format!("{}/appointments/{}/status", BASE_URL, appointment_id))
            .bearer_auth(&counsellor_token)
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }

    let response = client
        .post(format!("{}/ratings", BASE_URL))
        .bearer_auth(&youth_token)
        .json(&json!({ "appointment_id": appointment_id, "rating": 5, "review": "Very helpful" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/ratings", BASE_URL))
        .bearer_auth(&youth_token)
        .json(&json!({ "appointment_id": appointment_id, "rating": 4 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let view: Value = client
        .get(format!("{}/counsellors/{}/stats", BASE_URL, counsellor_id))
        .bearer_auth(&counsellor_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(view["state"], "ready");
    assert_eq!(view["status"], "ok");
    assert_eq!(view["stats"]["totalClients"]["value"], 1);
    assert_eq!(view["stats"]["averageRating"]["value"], 5.0);
    assert_eq!(view["stats"]["hoursAvailable"]["value"], 10.0);

    // youth users cannot read a counsellor's stats
    let response = client
        .get(format!("{}/counsellors/{}/stats", BASE_URL, counsellor_id))
        .bearer_auth(&youth_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_booking_in_the_past_rejected() {
    let client = Client::new();
    let (counsellor_id, _) = register(
        &client,
        json!({ "email": unique_email("past-c"), "display_name": "Dr. Past", "is_professional": true }),
    )
    .await;
    let (_, youth_token) = register(
        &client,
        json!({ "email": unique_email("past-y"), "display_name": "Sky Past" }),
    )
    .await;

    let response = client
        .post(format!("{}/appointments", BASE_URL))
        .bearer_auth(&youth_token)
        .json(&json!({
            "counsellor_id": counsellor_id,
            "appointment_date": (Utc::now() - Duration::days(1)).to_rfc3339()
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
