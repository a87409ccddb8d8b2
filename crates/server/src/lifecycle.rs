//! Tool-facing operations: run one browser attempt end to end and report.
//!
//! The browser session is torn down on every path, including errors; the
//! session store is only written after the page is authenticated.

use std::time::Duration;

use okta_auth::{ExecutableCache, SessionState, SessionStore, derive_domain_key};
use serde::Serialize;
use tracing::{info, warn};

use crate::browser::{BrowserSession, LaunchSpec, PageDriver};
use crate::error::Result;
use crate::login::{self, Credentials, LoginPage};

pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(60);

/// Channel probed when the caller does not name one.
const DEFAULT_CHANNEL: &str = "chrome";

#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    pub headed: bool,
    /// Browser channel name ("chrome", "msedge", ...). `None` probes the
    /// default channel and falls back to chromiumoxide's own discovery.
    pub channel: Option<String>,
    pub timeout: Option<Duration>,
}

/// `url` always echoes the requested URL; where the browser ended up is
/// reported separately as `final_url`. `domain_key` is null unless a
/// session was saved.
#[derive(Debug, Serialize)]
pub struct LoginReport {
    pub success: bool,
    pub domain_key: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub valid: bool,
    pub domain_key: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub message: String,
}

fn resolve_executable(cache: &ExecutableCache, channel: Option<&str>) -> Option<std::path::PathBuf> {
    let channel = channel.unwrap_or(DEFAULT_CHANNEL);
    let resolved = cache.resolve(channel);
    if resolved.is_none() {
        info!(
            target = "okta_auth_mcp",
            %channel,
            "channel executable not found, deferring to default browser discovery"
        );
    }
    resolved
}

/// Drive a full login attempt against `url` and persist the resulting
/// session on success.
pub async fn perform_login(
    store: &SessionStore,
    cache: &ExecutableCache,
    url: &str,
    creds: &Credentials,
    opts: &LoginOptions,
) -> Result<LoginReport> {
    // Input error, not a driver error: report it before any browser work.
    if !creds.has_login_pair() {
        return Ok(LoginReport {
            success: false,
            domain_key: None,
            url: url.to_string(),
            final_url: None,
            message: "Username and password are required".to_string(),
            session_file: None,
        });
    }

    // Login always starts from a clean context; a stale stored session must
    // not mask a failing credential set.
    let spec = LaunchSpec {
        executable: resolve_executable(cache, opts.channel.as_deref()),
        headed: opts.headed,
        session: None,
        timeout: opts.timeout.unwrap_or(DEFAULT_NAV_TIMEOUT),
    };
    let session = BrowserSession::launch(spec).await?;
    let outcome = attempt_login(&session, url, creds).await;
    session.close().await;

    match outcome? {
        Some((state, final_url)) => {
            if !state.is_effective() {
                warn!(
                    target = "okta_auth_mcp",
                    domain_key = %derive_domain_key(url),
                    "authenticated but exported session carries no cookies or storage"
                );
            }
            let key = store.save(url, &state)?;
            let session_file = store.load_path(url).map(|p| p.display().to_string());
            Ok(LoginReport {
                success: true,
                domain_key: Some(key),
                url: url.to_string(),
                final_url: Some(final_url),
                message: "Login successful; session saved".to_string(),
                session_file,
            })
        }
        None => Ok(LoginReport {
            success: false,
            domain_key: None,
            url: url.to_string(),
            final_url: None,
            message: "Login did not complete; no session saved".to_string(),
            session_file: None,
        }),
    }
}

async fn attempt_login(
    session: &BrowserSession,
    url: &str,
    creds: &Credentials,
) -> Result<Option<(SessionState, String)>> {
    session.goto(url).await?;

    let driver = PageDriver::new(session.page());
    if !login::auto_login(&driver, creds).await? {
        return Ok(None);
    }

    let state = session.export_state().await?;
    let final_url = driver
        .current_url()
        .await
        .unwrap_or_else(|_| url.to_string());
    Ok(Some((state, final_url)))
}

/// Check whether the stored session for `url` still authenticates. A URL
/// with no stored session reports invalid without launching a browser.
pub async fn verify_session(
    store: &SessionStore,
    cache: &ExecutableCache,
    url: &str,
    opts: &LoginOptions,
) -> Result<SessionReport> {
    let domain_key = derive_domain_key(url);
    let Some(stored) = store.load(url).unwrap_or_default() else {
        return Ok(SessionReport {
            valid: false,
            domain_key,
            url: url.to_string(),
            final_url: None,
            message: "No stored session for this domain".to_string(),
        });
    };
    if !stored.is_effective() {
        return Ok(SessionReport {
            valid: false,
            domain_key,
            url: url.to_string(),
            final_url: None,
            message: "Stored session is empty".to_string(),
        });
    }

    let spec = LaunchSpec {
        executable: resolve_executable(cache, opts.channel.as_deref()),
        headed: opts.headed,
        session: Some(stored.clone()),
        timeout: opts.timeout.unwrap_or(DEFAULT_NAV_TIMEOUT),
    };
    let session = BrowserSession::launch(spec).await?;
    let outcome = probe_session(&session, url, &stored).await;
    session.close().await;

    let (valid, final_url) = outcome?;
    Ok(SessionReport {
        valid,
        domain_key,
        url: url.to_string(),
        final_url: Some(final_url),
        message: if valid {
            "Session is valid".to_string()
        } else {
            "Session is expired or invalid".to_string()
        },
    })
}

async fn probe_session(
    session: &BrowserSession,
    url: &str,
    stored: &SessionState,
) -> Result<(bool, String)> {
    session.goto_with_session(url, stored).await?;
    let driver = PageDriver::new(session.page());
    let valid = login::is_authenticated(&driver).await;
    let final_url = driver
        .current_url()
        .await
        .unwrap_or_else(|_| url.to_string());
    Ok((valid, final_url))
}
