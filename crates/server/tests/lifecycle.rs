//! Lifecycle paths that must not touch a browser.

use okta_auth::{Cookie, ExecutableCache, SessionState, SessionStore};
use okta_auth_mcp::lifecycle::{LoginOptions, perform_login, verify_session};
use okta_auth_mcp::login::Credentials;

#[tokio::test]
async fn login_without_credentials_is_rejected_before_any_browser_work() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let cache = ExecutableCache::new();
    let url = "https://portal.example.com/app";

    // No browser is available in this environment, so reaching the launch
    // path would surface a launch error instead of a structured report.
    for creds in [
        Credentials::default(),
        Credentials {
            identifier: Some("alex@example.com".to_string()),
            ..Credentials::default()
        },
        Credentials {
            identifier: Some("alex@example.com".to_string()),
            secret: Some("   ".to_string()),
            ..Credentials::default()
        },
    ] {
        let report = perform_login(&store, &cache, url, &creds, &LoginOptions::default())
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.domain_key, None);
        assert_eq!(report.url, url);
        assert!(report.message.contains("required"));
    }
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn check_without_stored_session_never_launches_a_browser() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let cache = ExecutableCache::new();

    let report = verify_session(
        &store,
        &cache,
        "https://portal.example.com/app",
        &LoginOptions::default(),
    )
    .await
    .unwrap();

    assert!(!report.valid);
    assert_eq!(report.domain_key, "portal.example.com");
    assert!(report.message.contains("No stored session"));
}

#[tokio::test]
async fn check_with_empty_stored_session_reports_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let cache = ExecutableCache::new();
    let url = "https://portal.example.com/app";

    store
        .save(url, &SessionState { cookies: vec![], origins: vec![] })
        .unwrap();

    let report = verify_session(&store, &cache, url, &LoginOptions::default())
        .await
        .unwrap();

    assert!(!report.valid);
    assert!(report.message.contains("empty"));
}

#[test]
fn stored_cookies_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let url = "https://portal.example.com/app";

    let state = SessionState {
        cookies: vec![Cookie::new("sid", "abc123", "portal.example.com").path("/")],
        origins: vec![],
    };
    store.save(url, &state).unwrap();

    let restored = store.load(url).unwrap().unwrap();
    assert_eq!(restored.cookies.len(), 1);
    assert_eq!(restored.cookies[0].name, "sid");
    assert_eq!(
        restored.cookies[0].domain.as_deref(),
        Some("portal.example.com")
    );
}
