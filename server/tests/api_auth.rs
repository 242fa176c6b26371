//! Integration tests for the authentication endpoints
//!
//! - POST /auth/register
//! - POST /auth/login
//! - bearer token middleware

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_register_then_login() {
        let ctx = TestContext::new();

        let response = ctx
            .server
            .post("/auth/register")
            .json(&json!({ "username": "logintest", "password": "TestLogin123" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let registered: Value = response.json();
        assert_eq!(registered["user"]["username"], "logintest");
        assert_eq!(registered["user"]["translation_enabled"], false);
        assert_eq!(registered["user"]["preferred_language"], "English");
        assert!(registered["user"].get("password").is_none());

        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "username": "logintest", "password": "TestLogin123" }))
            .await;
        response.assert_status_ok();

        let headers = response.headers();
        assert!(headers.get("set-cookie").is_some(), "Set-Cookie header should be present");
        let auth_header = headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth_header.starts_with("Bearer "));

        let body: Value = response.json();
        let token = body["token"].as_str().unwrap();
        assert_eq!(auth_header, format!("Bearer {token}"));

        // the token opens the protected routes
        ctx.server
            .get("/messages/users")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let ctx = TestContext::new();
        ctx.server
            .post("/auth/register")
            .json(&json!({ "username": "alice", "password": "rightpassword" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "username": "alice", "password": "wrongpassword" }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_login_nonexistent_user() {
        let ctx = TestContext::new();
        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "username": "nonexistent", "password": "password123" }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let ctx = TestContext::new();
        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "username": "alice" }))
            .await;

        response.assert_status_unprocessable_entity();
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let ctx = TestContext::new();
        ctx.seed_user(1, "alice", None);

        let response = ctx
            .server
            .post("/auth/register")
            .json(&json!({ "username": "alice", "password": "password123" }))
            .await;

        response.assert_status_conflict();
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let ctx = TestContext::new();
        let response = ctx
            .server
            .post("/auth/register")
            .json(&json!({ "username": "alice", "password": "123" }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let ctx = TestContext::new();
        let response = ctx
            .server
            .get("/messages/users")
            .authorization_bearer("not-a-jwt")
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_token_of_a_deleted_user_is_unauthorized() {
        let ctx = TestContext::new();
        let ghost = server::entities::User {
            user_id: 77,
            username: "ghost".to_string(),
            password: String::new(),
            translation_enabled: false,
            preferred_language: "English".to_string(),
            daily_translation_count: 0,
            last_translation_date: String::new(),
        };

        let response = ctx
            .server
            .get("/messages/users")
            .authorization_bearer(ctx.token_for(&ghost))
            .await;

        response.assert_status_unauthorized();
    }
}
