//! Auth state machine behaviour against a mock SMAF server.

mod common;

use std::time::Duration;

use common::{user_json, Harness};
use serde_json::json;
use smaf_core::api::Registration;
use smaf_core::guard::{guard, GuardDecision, Navigator, Route};
use smaf_core::models::Role;
use smaf_core::{AuthOutcome, SessionStatus};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_login_success(h: &Harness, token: &str, role: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": token,
            "data": user_json(1, "a@b.com", role),
        })))
        .mount(&h.server)
        .await;
}

// -------------------------------------------------------------------------
// Restore
// -------------------------------------------------------------------------

#[tokio::test]
async fn restore_without_token_settles_anonymous() {
    let h = Harness::start(None).await;

    let session = h.auth.restore().await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.user().is_none());
}

#[tokio::test]
async fn restore_with_valid_token_authenticates() {
    let h = Harness::start(Some("abc")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": user_json(9, "analyst@smaf.co", "analyst"),
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.auth.restore().await;

    assert_eq!(session.status(), SessionStatus::Authenticated);
    let user = session.user().expect("user should be set");
    assert_eq!(user.id, 9);
    assert_eq!(user.email, "analyst@smaf.co");
    assert_eq!(user.role, Role::Analyst);
    assert_eq!(session.token(), Some("abc"));
}

#[tokio::test]
async fn restore_with_rejected_token_deletes_it() {
    let h = Harness::start(Some("stale")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Token inválido"})))
        .mount(&h.server)
        .await;

    let session = h.auth.restore().await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(h.stored_token(), None);
}

#[tokio::test]
async fn restore_with_server_error_deletes_token() {
    let h = Harness::start(Some("abc")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let session = h.auth.restore().await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(h.stored_token(), None);
}

#[tokio::test]
async fn restore_with_unsuccessful_envelope_deletes_token() {
    let h = Harness::start(Some("abc")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&h.server)
        .await;

    let session = h.auth.restore().await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(h.stored_token(), None);
}

#[tokio::test]
async fn restore_times_out_to_anonymous() {
    let mut h = Harness::start(Some("abc")).await;
    h.auth = h.auth.with_restore_timeout(Duration::from_millis(100));
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": user_json(1, "a@b.com", "admin")}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&h.server)
        .await;

    let session = h.auth.restore().await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(h.stored_token(), None);
}

// -------------------------------------------------------------------------
// Login / register
// -------------------------------------------------------------------------

#[tokio::test]
async fn successful_login_authenticates_and_persists_token() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "abc", "admin").await;

    let outcome = h.auth.login("a@b.com", "pw").await;

    assert!(outcome.is_authenticated());
    let session = h.auth.session();
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.role(), Some(Role::Admin));
    assert_eq!(session.token(), Some("abc"));
    assert_eq!(h.stored_token().as_deref(), Some("abc"));
}

#[tokio::test]
async fn token_from_login_is_sent_on_next_request() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "T-123", "viewer").await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/stats"))
        .and(header("Authorization", "Bearer T-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"total": 3}})))
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());
    let stats = h.auth.api().transaction_stats().await.expect("stats request failed");

    assert!(stats.success);
    assert_eq!(stats.data.unwrap()["total"], 3);
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Credenciales inválidas",
        })))
        .mount(&h.server)
        .await;

    let outcome = h.auth.login("a@b.com", "wrong").await;

    assert_eq!(outcome, AuthOutcome::Rejected("Credenciales inválidas".to_string()));
    let session = h.auth.session();
    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(session.last_error(), Some("Credenciales inválidas"));
    assert!(session.user().is_none());
    assert!(session.token().is_none());
}

#[tokio::test]
async fn login_http_401_is_a_credential_failure_not_a_redirect() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    let mut events = h.auth.api().subscribe();
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "error": {"message": "Usuario o contraseña incorrectos"},
        })))
        .mount(&h.server)
        .await;

    let outcome = h.auth.login("a@b.com", "wrong").await;

    assert_eq!(outcome.error(), Some("Usuario o contraseña incorrectos"));
    assert_eq!(h.auth.status(), SessionStatus::Failed);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn login_without_server_message_uses_fallback() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&h.server)
        .await;

    let outcome = h.auth.login("a@b.com", "pw").await;

    assert_eq!(outcome.error(), Some("Login failed"));
    assert_eq!(h.auth.session().last_error(), Some("Login failed"));
}

#[tokio::test]
async fn login_against_unreachable_server_fails_closed() {
    let store = std::sync::Arc::new(smaf_core::auth::MemoryTokenStore::new());
    let api = smaf_core::ApiClient::new("http://127.0.0.1:9/api", store).unwrap();
    let auth = smaf_core::AuthManager::new(api);
    auth.restore().await;

    let outcome = auth.login("a@b.com", "pw").await;

    assert!(!outcome.is_authenticated());
    assert_eq!(auth.status(), SessionStatus::Failed);
    assert!(auth.session().last_error().is_some());
}

#[tokio::test]
async fn concurrent_login_is_rejected_while_one_is_in_flight() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "success": true,
                    "token": "abc",
                    "data": user_json(1, "a@b.com", "admin"),
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let (first, second) = tokio::join!(
        h.auth.login("a@b.com", "pw"),
        h.auth.login("a@b.com", "pw"),
    );

    assert!(first.is_authenticated());
    assert_eq!(
        second.error(),
        Some("An authentication attempt is already in progress")
    );
    assert_eq!(h.auth.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn register_auto_authenticates() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "token": "fresh",
            "data": user_json(2, "nuevo@smaf.co", "viewer"),
        })))
        .mount(&h.server)
        .await;

    let outcome = h
        .auth
        .register(&Registration {
            name: "Nuevo".to_string(),
            email: "nuevo@smaf.co".to_string(),
            password: "secreto1".to_string(),
            role: Role::Viewer,
        })
        .await;

    assert!(outcome.is_authenticated());
    assert_eq!(h.auth.session().role(), Some(Role::Viewer));
    assert_eq!(h.stored_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn create_client_leaves_admin_session_untouched() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "admin-token", "admin").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(header("Authorization", "Bearer admin-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "token": "client-token",
            "data": user_json(30, "cliente@smaf.co", "viewer"),
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());
    let before = h.auth.session();

    let created = h
        .auth
        .create_client(&Registration {
            name: "Cliente".to_string(),
            email: "cliente@smaf.co".to_string(),
            password: "secreto1".to_string(),
            role: Role::Viewer,
        })
        .await
        .expect("client creation failed");

    assert_eq!(created.id, 30);
    assert_eq!(h.auth.session(), before);
    assert_eq!(h.stored_token().as_deref(), Some("admin-token"));
}

#[tokio::test]
async fn create_client_failure_does_not_touch_session() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "admin-token", "admin").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "El email ya existe"})))
        .mount(&h.server)
        .await;

    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());
    let err = h
        .auth
        .create_client(&Registration {
            name: "Cliente".to_string(),
            email: "dup@smaf.co".to_string(),
            password: "secreto1".to_string(),
            role: Role::Viewer,
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "El email ya existe");
    assert_eq!(h.auth.status(), SessionStatus::Authenticated);
    assert!(h.auth.session().last_error().is_none());
}

// -------------------------------------------------------------------------
// Logout and forced logout
// -------------------------------------------------------------------------

#[tokio::test]
async fn logout_deletes_token_before_returning() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "abc", "analyst").await;
    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());

    h.auth.logout();

    assert_eq!(h.stored_token(), None);
    assert_eq!(h.auth.status(), SessionStatus::Anonymous);
    assert!(h.auth.session().user().is_none());
}

#[tokio::test]
async fn server_401_forces_logout_and_redirect() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    let mut navigator = Navigator::new(Route::Transfer, h.auth.api().subscribe());
    mount_login_success(&h, "abc", "admin").await;
    Mock::given(method("GET"))
        .and(path("/api/fraud-rules/stats"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Token expirado"})))
        .mount(&h.server)
        .await;

    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());
    assert_eq!(navigator.navigate(Route::FraudRules, &h.auth.session()), GuardDecision::Render);

    let err = h.auth.api().rule_stats().await.unwrap_err();

    assert!(matches!(err, smaf_core::ApiError::AuthorizationExpired));
    assert_eq!(h.stored_token(), None);
    let session = h.auth.session();
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.token().is_none());
    assert_eq!(navigator.poll_redirect(), Some(Route::Login));
    assert_eq!(navigator.current(), Route::Login);
}

#[tokio::test]
async fn relogin_after_forced_logout_is_not_undone() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "abc", "admin").await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());
    let _ = h.auth.api().transaction_stats().await;
    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());

    assert_eq!(h.auth.status(), SessionStatus::Authenticated);
    assert_eq!(h.stored_token().as_deref(), Some("abc"));
}

// -------------------------------------------------------------------------
// Route guard against live sessions
// -------------------------------------------------------------------------

#[tokio::test]
async fn viewer_is_sent_to_landing_page_from_admin_view() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "abc", "viewer").await;
    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());

    let decision = guard(Route::FraudRules, &h.auth.session());

    assert_eq!(decision, GuardDecision::Redirect(Route::Dashboard));
}

#[tokio::test]
async fn guard_waits_until_restore_settles() {
    let h = Harness::start(None).await;

    assert_eq!(guard(Route::Dashboard, &h.auth.session()), GuardDecision::Wait);
    h.auth.restore().await;
    assert_eq!(
        guard(Route::Dashboard, &h.auth.session()),
        GuardDecision::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn subscribers_see_session_changes() {
    let h = Harness::start(None).await;
    let mut rx = h.auth.subscribe();
    h.auth.restore().await;

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn server_401_reaches_session_subscribers() {
    let h = Harness::start(None).await;
    h.auth.restore().await;
    mount_login_success(&h, "abc", "admin").await;
    Mock::given(method("GET"))
        .and(path("/api/fraud-rules/stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;
    assert!(h.auth.login("a@b.com", "pw").await.is_authenticated());

    let mut rx = h.auth.subscribe();
    assert_eq!(rx.borrow_and_update().status(), SessionStatus::Authenticated);

    let _ = h.auth.api().rule_stats().await;

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.status(), SessionStatus::Anonymous);
    assert!(seen.user().is_none());
    assert!(seen.token().is_none());
    assert_eq!(h.stored_token(), None);
}

#[tokio::test]
async fn login_is_rejected_while_restore_is_in_flight() {
    let h = Harness::start(Some("abc")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": user_json(1, "a@b.com", "admin")}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&h.server)
        .await;

    let (restored, outcome) = tokio::join!(h.auth.restore(), h.auth.login("a@b.com", "pw"));

    assert_eq!(restored.status(), SessionStatus::Authenticated);
    assert_eq!(
        outcome.error(),
        Some("An authentication attempt is already in progress")
    );
    assert_eq!(h.stored_token().as_deref(), Some("abc"));
}
