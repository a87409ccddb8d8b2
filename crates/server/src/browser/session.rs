//! Browser lifecycle: launch, session-state restore/export, teardown.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use futures::StreamExt;
use okta_auth::{Cookie, LocalStorageEntry, OriginState, SessionState};
use tracing::{debug, warn};

use crate::error::{AuthError, Result};

/// How a browser should be launched for one attempt.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    /// Explicit executable resolved for a requested channel. `None` lets
    /// chromiumoxide discover its default Chromium.
    pub executable: Option<PathBuf>,
    pub headed: bool,
    /// Stored session to restore into the fresh context.
    pub session: Option<SessionState>,
    /// Navigation budget.
    pub timeout: Duration,
}

/// One browser process plus the page the attempt runs on. The CDP event
/// handler task is owned here and aborted on close, so teardown is
/// guaranteed on every exit path.
pub struct BrowserSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    page: chromiumoxide::Page,
    timeout: Duration,
}

impl BrowserSession {
    /// Launch a browser per `spec`. When an explicit executable was
    /// requested and launch fails, retries once with the default discovery
    /// before surfacing the failure.
    pub async fn launch(spec: LaunchSpec) -> Result<Self> {
        match Self::launch_once(&spec, spec.executable.clone()).await {
            Ok(session) => Ok(session),
            Err(err) if spec.executable.is_some() => {
                warn!(
                    target = "okta_auth_mcp",
                    error = %err,
                    "requested browser channel failed, retrying with default browser"
                );
                Self::launch_once(&spec, None).await
            }
            Err(err) => Err(err),
        }
    }

    async fn launch_once(spec: &LaunchSpec, executable: Option<PathBuf>) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 800)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        if spec.headed {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(AuthError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AuthError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        let session = Self {
            browser,
            handler_task,
            page,
            timeout: spec.timeout,
        };
        if let Some(state) = &spec.session {
            session.restore_cookies(state).await?;
        }
        Ok(session)
    }

    pub fn page(&self) -> &chromiumoxide::Page {
        &self.page
    }

    /// Navigate within the session's timeout budget.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let nav = tokio::time::timeout(self.timeout, self.page.goto(url)).await;
        match nav {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AuthError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(AuthError::Navigation {
                url: url.to_string(),
                message: format!("timed out after {}ms", self.timeout.as_millis()),
            }),
        }
    }

    /// Navigate with a stored session applied: cookies are already in the
    /// context; localStorage can only be seeded from the origin itself, so
    /// when the stored state carries entries for the target origin the page
    /// is loaded, seeded, and reloaded once.
    pub async fn goto_with_session(&self, url: &str, state: &SessionState) -> Result<()> {
        self.goto(url).await?;

        let origin: String = self
            .page
            .evaluate("window.location.origin")
            .await?
            .into_value()
            .unwrap_or_default();
        let Some(stored) = state.origins.iter().find(|o| o.origin == origin) else {
            return Ok(());
        };
        if stored.local_storage.is_empty() {
            return Ok(());
        }

        debug!(target = "okta_auth_mcp", %origin, entries = stored.local_storage.len(), "seeding localStorage");
        let entries = serde_json::to_string(&stored.local_storage)?;
        let js = format!(
            "(function(entries) {{ for (const e of entries) {{ try {{ localStorage.setItem(e.name, e.value); }} catch (_) {{}} }} return true; }})({entries})"
        );
        self.page.evaluate(js).await?;
        self.goto(url).await
    }

    async fn restore_cookies(&self, state: &SessionState) -> Result<()> {
        if state.cookies.is_empty() {
            return Ok(());
        }
        let cookies: Vec<CookieParam> = state
            .cookies
            .iter()
            .map(|c| {
                let mut cookie = CookieParam::new(c.name.clone(), c.value.clone());
                cookie.domain = c.domain.clone();
                cookie.path = c.path.clone();
                cookie.secure = c.secure;
                cookie.http_only = c.http_only;
                cookie
            })
            .collect();
        self.page.set_cookies(cookies).await?;
        Ok(())
    }

    /// Capture the context's session state: all cookies plus the current
    /// origin's localStorage.
    pub async fn export_state(&self) -> Result<SessionState> {
        let cookies = self
            .page
            .get_cookies()
            .await?
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: Some(c.domain),
                path: Some(c.path),
                // Expiry is not round-tripped; restored cookies become
                // session cookies, which the validity check tolerates.
                expires: None,
                http_only: Some(c.http_only),
                secure: Some(c.secure),
                same_site: None,
            })
            .collect();

        let storage: serde_json::Value = self
            .page
            .evaluate(
                "(function() { const out = { origin: window.location.origin, entries: [] }; \
                 try { for (let i = 0; i < localStorage.length; i++) { const k = localStorage.key(i); \
                 out.entries.push({ name: k, value: localStorage.getItem(k) }); } } catch (_) {} \
                 return out; })()",
            )
            .await?
            .into_value()
            .unwrap_or(serde_json::Value::Null);

        let mut origins = Vec::new();
        if let (Some(origin), Some(entries)) = (
            storage.get("origin").and_then(|v| v.as_str()),
            storage.get("entries").and_then(|v| v.as_array()),
        ) {
            let local_storage: Vec<LocalStorageEntry> = entries
                .iter()
                .filter_map(|e| {
                    Some(LocalStorageEntry {
                        name: e.get("name")?.as_str()?.to_string(),
                        value: e.get("value")?.as_str()?.to_string(),
                    })
                })
                .collect();
            if !local_storage.is_empty() {
                origins.push(OriginState {
                    origin: origin.to_string(),
                    local_storage,
                });
            }
        }

        Ok(SessionState { cookies, origins })
    }

    /// Tear down the browser process and its CDP handler task. Errors
    /// during shutdown are logged, not surfaced; the process is gone either
    /// way.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!(target = "okta_auth_mcp", error = %e, "browser close");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}
