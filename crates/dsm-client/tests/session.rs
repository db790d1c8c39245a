//! Session lifecycle tests against a mocked DSM host.
//!
//! Login goes to `auth.cgi` as an url-encoded POST, logout as a GET; file
//! calls go to `entry.cgi` with the SID in `_sid`.

use dsm_client::{
    ApiClient, DsmConfig, DsmError, FileStation, SessionManager, SessionOrigin, SessionState,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> DsmConfig {
    DsmConfig::new(server.uri(), "admin", "s3cret")
}

fn manager(config: &DsmConfig) -> SessionManager {
    SessionManager::new(ApiClient::new(config).unwrap(), config)
}

fn login_ok(sid: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"sid": sid}}))
}

fn login_mock() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/webapi/auth.cgi"))
        .and(body_string_contains("method=login"))
}

// ============================================================================
// Login / reuse
// ============================================================================

#[tokio::test]
async fn ensure_session_logs_in_once_and_reuses_sid() {
    let server = MockServer::start().await;
    login_mock()
        .and(body_string_contains("account=admin"))
        .and(body_string_contains("passwd=s3cret"))
        .and(body_string_contains("session=FileStation"))
        .and(body_string_contains("format=sid"))
        .respond_with(login_ok("sid-1"))
        .expect(1)
        .mount(&server)
        .await;

    let session = manager(&config(&server));

    let first = session.ensure_session().await.unwrap();
    assert_eq!(first.sid, "sid-1");
    assert_eq!(first.origin, SessionOrigin::NewLogin);

    let second = session.ensure_session().await.unwrap();
    assert_eq!(second.sid, "sid-1");
    assert_eq!(second.origin, SessionOrigin::Cached);

    assert_eq!(
        session.state().await,
        SessionState::LoggedIn {
            sid: "sid-1".to_string()
        }
    );
}

#[tokio::test]
async fn login_sends_configured_api_version() {
    let server = MockServer::start().await;
    login_mock()
        .and(body_string_contains("version=6"))
        .respond_with(login_ok("sid-v6"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server).with_api_version(6);
    let session = manager(&config);
    assert_eq!(session.login().await.unwrap(), "sid-v6");
}

#[tokio::test]
async fn rejected_credentials_are_an_authentication_error() {
    let server = MockServer::start().await;
    login_mock()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": {"code": 400}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = manager(&config(&server));
    let err = session.ensure_session().await.unwrap_err();

    match err {
        DsmError::Authentication { code, reason } => {
            assert_eq!(code, Some(400));
            assert!(reason.contains("incorrect password"), "reason: {}", reason);
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
    assert!(!session.is_logged_in().await);
}

#[tokio::test]
async fn login_without_sid_is_an_authentication_error() {
    let server = MockServer::start().await;
    login_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {}})))
        .mount(&server)
        .await;

    let session = manager(&config(&server));
    let err = session.login().await.unwrap_err();
    assert!(matches!(err, DsmError::Authentication { code: None, .. }));
}

#[tokio::test]
async fn unreachable_host_is_an_authentication_error() {
    let config = DsmConfig::new("http://127.0.0.1:1", "admin", "pw");
    let session = manager(&config);

    let err = session.ensure_session().await.unwrap_err();
    assert!(matches!(err, DsmError::Authentication { code: None, .. }));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn logout_twice_sends_one_request() {
    let server = MockServer::start().await;
    login_mock()
        .respond_with(login_ok("sid-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webapi/auth.cgi"))
        .and(query_param("method", "logout"))
        .and(query_param("_sid", "sid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let session = manager(&config(&server));
    session.login().await.unwrap();

    session.logout().await;
    session.logout().await;

    assert_eq!(session.state().await, SessionState::LoggedOut);
}

#[tokio::test]
async fn failed_logout_still_clears_the_session() {
    let server = MockServer::start().await;
    login_mock()
        .respond_with(login_ok("sid-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webapi/auth.cgi"))
        .and(query_param("method", "logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = manager(&config(&server));
    session.login().await.unwrap();
    session.logout().await;

    assert!(!session.is_logged_in().await);
}

// ============================================================================
// Expiry recovery
// ============================================================================

#[tokio::test]
async fn session_timeout_triggers_one_relogin_and_retry() {
    let server = MockServer::start().await;

    login_mock()
        .respond_with(login_ok("sid-1"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    login_mock()
        .respond_with(login_ok("sid-2"))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/webapi/entry.cgi"))
        .and(query_param("api", "SYNO.FileStation.List"))
        .and(query_param("_sid", "sid-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": {"code": 119}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webapi/entry.cgi"))
        .and(query_param("api", "SYNO.FileStation.List"))
        .and(query_param("_sid", "sid-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "files": [{"path": "/photos/a.jpg", "name": "a.jpg", "isdir": false}],
                "total": 1,
                "offset": 0
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server);
    let session = Arc::new(manager(&config));
    session.login().await.unwrap();

    let files = FileStation::new(session.clone(), &config);
    let listing = files.list_folder("/photos").await.unwrap();

    assert_eq!(listing.files.len(), 1);
    assert_eq!(listing.files[0].name, "a.jpg");
    assert_eq!(
        session.state().await,
        SessionState::LoggedIn {
            sid: "sid-2".to_string()
        }
    );
}

#[tokio::test]
async fn other_remote_errors_do_not_relogin() {
    let server = MockServer::start().await;
    login_mock()
        .respond_with(login_ok("sid-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webapi/entry.cgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": {"code": 408}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server);
    let files = FileStation::new(Arc::new(manager(&config)), &config);
    let err = files.list_folder("/missing").await.unwrap_err();

    match err {
        DsmError::RemoteCall { code, message, .. } => {
            assert_eq!(code, 408);
            assert_eq!(message, "No such file or directory");
        }
        other => panic!("expected remote call error, got {:?}", other),
    }
}

#[tokio::test]
async fn second_expiry_in_a_row_is_reported() {
    let server = MockServer::start().await;
    login_mock()
        .respond_with(login_ok("sid-x"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webapi/entry.cgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": {"code": 106}})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server);
    let files = FileStation::new(Arc::new(manager(&config)), &config);
    let err = files.info().await.unwrap_err();
    assert!(err.is_session_expired());
}
