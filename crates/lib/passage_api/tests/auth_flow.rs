//! End-to-end tests over the router: password login, delegated login and the
//! authorization gate.

mod common;

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use chrono::Duration;
use passage_core::auth::jwt::TokenIssuer;
use passage_core::auth::store::UserStore;
use passage_core::models::auth::Role;
use uuid::Uuid;

use common::{FakeProvider, TEST_SECRET, TestApp, clears_state_cookie, json_body, state_cookie_value};

fn provider() -> FakeProvider {
    FakeProvider::default()
        .with_profile("good-code", "new@example.com", "Grace", "Hopper")
        .with_profile("other-code", "new@example.com", "Someone", "Else")
}

#[tokio::test]
async fn home_page_is_public() {
    let app = TestApp::new(provider());
    let resp = app.get("/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_then_login_yields_token_the_gate_accepts() {
    let app = TestApp::new(provider());
    let token = app.signup_and_login("a@b.com", "secret1").await;

    let resp = app.get("/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["role"], "user");

    let user = app.store.find_user_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(me["userId"], user.id.to_string());
}

#[tokio::test]
async fn signup_response_hides_password_hash() {
    let app = TestApp::new(provider());
    let resp = app
        .post_json(
            "/signup",
            serde_json::json!({"email": "a@b.com", "password": "secret1"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(!body.to_string().contains("$2"));
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let app = TestApp::new(provider());
    let body = serde_json::json!({"email": "a@b.com", "password": "secret1"});
    assert_eq!(app.post_json("/signup", body.clone()).await.status(), StatusCode::CREATED);
    assert_eq!(app.post_json("/signup", body).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn wrong_password_is_unauthorized_without_token() {
    let app = TestApp::new(provider());
    app.signup_and_login("a@b.com", "secret1").await;

    let resp = app
        .post_json(
            "/login",
            serde_json::json!({"email": "a@b.com", "password": "wrong"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert!(body.get("token").is_none());
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn unknown_email_is_unauthorized() {
    let app = TestApp::new(provider());
    let resp = app
        .post_json(
            "/login",
            serde_json::json!({"email": "ghost@b.com", "password": "secret1"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delegated_login_creates_user_and_returns_token() {
    let app = TestApp::new(provider());

    let resp = app.get("/auth/google/login", None, None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let state = state_cookie_value(&resp).expect("state cookie");
    assert!(state.len() >= 22);
    let location = resp.headers()[LOCATION].to_str().unwrap();
    assert!(location.ends_with(&format!("state={state}")));

    let resp = app
        .get(
            &format!("/auth/google/callback?state={state}&code=good-code"),
            None,
            Some(&format!("oauthState={state}")),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(clears_state_cookie(&resp));
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Login successful via Google");
    let token = body["token"].as_str().unwrap();

    let user = app
        .store
        .find_user_by_email("new@example.com")
        .await
        .unwrap()
        .expect("user created");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.first_name, "Grace");
    assert_eq!(user.last_name, "Hopper");
    assert!(!user.password_hash.is_empty());

    let session = app.state.tokens.verify(token).unwrap();
    assert_eq!(session.user_id, user.id);
    assert_eq!(app.get("/me", Some(token), None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn delegated_login_keeps_existing_local_profile() {
    let app = TestApp::new(provider());
    app.signup_and_login("new@example.com", "secret1").await;
    let before = app
        .store
        .find_user_by_email("new@example.com")
        .await
        .unwrap()
        .unwrap();

    let resp = app
        .get(
            "/auth/google/callback?state=s1&code=other-code",
            None,
            Some("oauthState=s1"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let after = app
        .store
        .find_user_by_email("new@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn state_mismatch_is_unauthorized_and_clears_cookie() {
    let app = TestApp::new(provider());
    let resp = app
        .get(
            "/auth/google/callback?state=forged&code=good-code",
            None,
            Some("oauthState=real"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_state_cookie(&resp));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn missing_cookie_is_unauthorized() {
    let app = TestApp::new(provider());
    let resp = app
        .get("/auth/google/callback?state=s&code=good-code", None, None)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_state_cookie(&resp));
}

#[tokio::test]
async fn missing_code_is_bad_request() {
    let app = TestApp::new(provider());
    let resp = app
        .get("/auth/google/callback?state=s", None, Some("oauthState=s"))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(clears_state_cookie(&resp));
}

#[tokio::test]
async fn rejected_code_is_server_error_with_generic_body() {
    let app = TestApp::new(provider());
    let resp = app
        .get(
            "/auth/google/callback?state=s&code=bogus",
            None,
            Some("oauthState=s"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(clears_state_cookie(&resp));
    let body = json_body(resp).await;
    assert!(!body.to_string().contains("invalid_grant"));
}

#[tokio::test]
async fn replayed_callback_after_clearing_is_unauthorized() {
    let app = TestApp::new(provider());
    let resp = app.get("/auth/google/login", None, None).await;
    let state = state_cookie_value(&resp).unwrap();

    let uri = format!("/auth/google/callback?state={state}&code=good-code");
    let first = app
        .get(&uri, None, Some(&format!("oauthState={state}")))
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(clears_state_cookie(&first));

    // The browser now holds the cleared (empty) cookie, or none at all.
    let replay = app.get(&uri, None, Some("oauthState=")).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let replay = app.get(&uri, None, None).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn callback_accepts_form_post() {
    let app = TestApp::new(provider());
    let resp = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/auth/google/callback")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("cookie", "oauthState=s")
                .body(axum::body::Body::from("state=s&code=good-code"))
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(clears_state_cookie(&resp));
}

#[tokio::test]
async fn concurrent_first_logins_create_one_user() {
    let app = TestApp::new(provider());
    let first = app.get(
        "/auth/google/callback?state=a&code=good-code",
        None,
        Some("oauthState=a"),
    );
    let second = app.get(
        "/auth/google/callback?state=b&code=good-code",
        None,
        Some("oauthState=b"),
    );
    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(app.store.len(), 1);

    let a = app.state.tokens.verify(json_body(first).await["token"].as_str().unwrap()).unwrap();
    let b = app.state.tokens.verify(json_body(second).await["token"].as_str().unwrap()).unwrap();
    assert_eq!(a.user_id, b.user_id);
}

#[tokio::test]
async fn admin_route_distinguishes_401_403_200() {
    let app = TestApp::new(provider());

    let user_token = app.signup_and_login("user@b.com", "secret1").await;
    app.signup_and_login("admin@b.com", "secret2").await;
    assert!(app.store.set_role("admin@b.com", Role::Admin).await.unwrap());
    // Role is copied into the token at issuance, so log in again.
    let resp = app
        .post_json(
            "/login",
            serde_json::json!({"email": "admin@b.com", "password": "secret2"}),
        )
        .await;
    let admin_token = json_body(resp).await["token"].as_str().unwrap().to_string();

    assert_eq!(app.get("/users", None, None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get("/users", Some(&user_token), None).await.status(),
        StatusCode::FORBIDDEN
    );

    let resp = app.get("/users", Some(&admin_token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(!body.to_string().contains("$2"));
}

#[tokio::test]
async fn gate_rejects_bad_tokens() {
    let app = TestApp::new(provider());

    let expired = TokenIssuer::new(TEST_SECRET.as_bytes())
        .unwrap()
        .with_ttl(Duration::seconds(-10))
        .issue(Uuid::now_v7(), Role::Admin)
        .unwrap();
    let foreign = TokenIssuer::new(b"someone-else")
        .unwrap()
        .issue(Uuid::now_v7(), Role::Admin)
        .unwrap();

    for token in [expired.as_str(), foreign.as_str(), "garbage"] {
        assert_eq!(
            app.get("/users", Some(token), None).await.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            app.get("/me", Some(token), None).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    let resp = app
        .send(
            axum::http::Request::builder()
                .uri("/me")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_body_gets_generic_validation_error() {
    let app = TestApp::new(provider());

    for uri in ["/login", "/signup"] {
        let resp = app
            .post_json(uri, serde_json::json!({"email": "a@b.com"}))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "Malformed request");
        assert!(!body.to_string().contains("missing field"));
    }

    let resp = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["message"], "Malformed request");
}

#[tokio::test]
async fn malformed_callback_query_gets_generic_validation_error() {
    let app = TestApp::new(provider());
    let resp = app
        .get(
            "/auth/google/callback?state=s&state=s&code=good-code",
            None,
            Some("oauthState=s"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(clears_state_cookie(&resp));
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Malformed request");
    assert!(!body.to_string().contains("duplicate field"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn overlong_signup_password_is_rejected() {
    let app = TestApp::new(provider());
    let resp = app
        .post_json(
            "/signup",
            serde_json::json!({"email": "a@b.com", "password": "a".repeat(80)}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.is_empty());
}
