//! Login heuristics engine.
//!
//! Drives a page already positioned at a login URL through Okta's UI
//! variants: single-page and two-step credential forms, MFA factor pickers,
//! and TOTP code entry (including the individual digit-box layout). The
//! engine works against the [`LoginPage`] seam so flows can be exercised
//! with scripted pages instead of a live browser.
//!
//! Per-candidate errors (timeouts, detached elements, probes interrupted by
//! navigation) are recovered locally and the next candidate is tried; only
//! exhausting a whole cascade escalates to a step failure.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::selectors::{
    CODE_FACTOR_SELECTORS, MFA_SUBMIT_SELECTORS, Matcher, NEXT_SELECTORS, OTP_SELECTORS,
    PASSWORD_SELECTORS, SUBMIT_SELECTORS, USERNAME_SELECTORS,
};

/// Host fragment identifying the identity provider. Any page whose host
/// contains it is still "on Okta".
pub const IDP_HOST_FRAGMENT: &str = "okta";

/// Per-candidate visibility probe budget.
const CANDIDATE_PROBE: Duration = Duration::from_millis(1500);
/// Poll interval inside bounded probes.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Settle pause after a credential submit or "next" click.
const STEP_SETTLE: Duration = Duration::from_secs(3);
/// Settle pause after an MFA submit.
const MFA_SETTLE: Duration = Duration::from_secs(5);
/// How long a two-step flow waits for the secret field to appear.
const SECRET_WAIT: Duration = Duration::from_secs(10);
/// Completion poll: ticks and tick length.
const AUTH_POLL_TICKS: u32 = 10;
const AUTH_POLL_TICK: Duration = Duration::from_secs(1);

/// Credentials for one login attempt. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub identifier: Option<String>,
    pub secret: Option<String>,
    pub totp_seed: Option<String>,
}

impl Credentials {
    /// Both the identifier and the secret are present and non-blank.
    pub fn has_login_pair(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.identifier) && filled(&self.secret)
    }
}

/// Engine phases, logged as the attempt progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginPhase {
    Unknown,
    SingleStep,
    TwoStepIdentifier,
    TwoStepSecret,
    MfaPending,
    Authenticated,
    Failed,
}

/// Page operations the engine needs. Implemented over chromiumoxide in
/// `browser::page` and by `testing::MockLoginPage` for flow tests.
///
/// All probes are instantaneous; the engine supplies the bounded retry
/// loops around them.
#[async_trait]
pub trait LoginPage: Send + Sync {
    /// Current page URL.
    async fn current_url(&self) -> Result<String>;

    /// Fill the first visible element matching `matcher` with `value`.
    /// Returns whether a fill happened.
    async fn try_fill(&self, matcher: &Matcher, value: &str) -> Result<bool>;

    /// Click the first visible element matching `matcher`.
    async fn try_click(&self, matcher: &Matcher) -> Result<bool>;

    /// Whether any identifier/secret login field is visible right now.
    async fn login_fields_visible(&self) -> Result<bool>;

    /// Number of single-character code input boxes currently visible.
    async fn digit_box_count(&self) -> Result<usize>;

    /// Fill the `index`-th single-character code box with `digit`.
    async fn fill_digit_box(&self, index: usize, digit: char) -> Result<bool>;
}

/// Fill the first usable element across a cascade, giving each candidate a
/// short bounded visibility window. Candidate errors count as "no match".
pub async fn fill_first_match(page: &dyn LoginPage, cascade: &[Matcher], value: &str) -> bool {
    for matcher in cascade {
        if probe_candidate(|| page.try_fill(matcher, value)).await {
            debug!(target = "okta_auth_mcp", ?matcher, "filled");
            return true;
        }
    }
    false
}

/// Click the first usable element across a cascade.
pub async fn click_first_match(page: &dyn LoginPage, cascade: &[Matcher]) -> bool {
    for matcher in cascade {
        if probe_candidate(|| page.try_click(matcher)).await {
            debug!(target = "okta_auth_mcp", ?matcher, "clicked");
            return true;
        }
    }
    false
}

/// Retry one candidate's instantaneous probe until it succeeds or its
/// window closes.
async fn probe_candidate<F, Fut>(mut attempt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + CANDIDATE_PROBE;
    loop {
        if attempt().await.unwrap_or(false) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// The authentication signal, applied identically before login (idempotent
/// re-entry) and while polling for completion: the page's host no longer
/// contains the identity-provider fragment AND no login field becomes
/// visible within one bounded probe window.
pub async fn is_authenticated(page: &dyn LoginPage) -> bool {
    let Ok(url) = page.current_url().await else {
        return false;
    };
    if host_of(&url).contains(IDP_HOST_FRAGMENT) {
        return false;
    }

    let deadline = Instant::now() + CANDIDATE_PROBE;
    loop {
        if page.login_fields_visible().await.unwrap_or(false) {
            return false;
        }
        if Instant::now() >= deadline {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Attempt an automated Okta login. Returns whether the page ended up
/// authenticated.
pub async fn auto_login(page: &dyn LoginPage, creds: &Credentials) -> Result<bool> {
    let (Some(identifier), Some(secret)) = (&creds.identifier, &creds.secret) else {
        warn!(target = "okta_auth_mcp", "no identifier or secret provided, skipping auto-login");
        return Ok(false);
    };

    info!(target = "okta_auth_mcp", phase = ?LoginPhase::Unknown, "attempting automatic login");

    // Idempotent re-entry: login on an already-valid session is a no-op.
    if is_authenticated(page).await {
        info!(target = "okta_auth_mcp", "already authenticated");
        return Ok(true);
    }

    let user_ok = fill_first_match(page, USERNAME_SELECTORS, identifier).await;
    if !user_ok {
        warn!(target = "okta_auth_mcp", "could not fill identifier field");
    }
    let mut pass_ok = fill_first_match(page, PASSWORD_SELECTORS, secret).await;

    match (user_ok, pass_ok) {
        (true, false) => {
            // Identifier-only screen: secret comes after a "next" click.
            debug!(
                target = "okta_auth_mcp",
                phase = ?LoginPhase::TwoStepIdentifier,
                "two-step login detected"
            );
            click_first_match(page, NEXT_SELECTORS).await;
            tokio::time::sleep(STEP_SETTLE).await;

            let deadline = Instant::now() + SECRET_WAIT;
            loop {
                pass_ok = fill_first_match(page, PASSWORD_SELECTORS, secret).await;
                if pass_ok || Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            if !pass_ok {
                warn!(
                    target = "okta_auth_mcp",
                    phase = ?LoginPhase::TwoStepSecret,
                    "secret field never appeared after next"
                );
                return Ok(false);
            }
            debug!(target = "okta_auth_mcp", phase = ?LoginPhase::TwoStepSecret, "secret filled");
            click_first_match(page, SUBMIT_SELECTORS).await;
        }
        (true, true) => {
            debug!(
                target = "okta_auth_mcp",
                phase = ?LoginPhase::SingleStep,
                "single-step login form"
            );
            click_first_match(page, SUBMIT_SELECTORS).await;
        }
        _ => {
            warn!(target = "okta_auth_mcp", "could not fill identifier or secret fields");
            return Ok(false);
        }
    }

    tokio::time::sleep(STEP_SETTLE).await;

    if let Some(seed) = &creds.totp_seed {
        info!(target = "okta_auth_mcp", phase = ?LoginPhase::MfaPending, "handling MFA with TOTP");
        // Steer factor pickers toward code entry; absence is fine.
        click_first_match(page, CODE_FACTOR_SELECTORS).await;

        let code = okta_auth::totp::generate(seed)?;
        let mut otp_ok = fill_first_match(page, OTP_SELECTORS, &code).await;

        if !otp_ok {
            otp_ok = fill_digit_boxes(page, &code).await;
        }

        if !otp_ok {
            warn!(target = "okta_auth_mcp", "could not enter MFA code");
            return Ok(false);
        }
        click_first_match(page, MFA_SUBMIT_SELECTORS).await;
        tokio::time::sleep(MFA_SETTLE).await;
    }

    info!(target = "okta_auth_mcp", "waiting for authentication to complete");
    for _ in 0..AUTH_POLL_TICKS {
        tokio::time::sleep(AUTH_POLL_TICK).await;
        if is_authenticated(page).await {
            let host = host_of(&page.current_url().await.unwrap_or_default());
            info!(
                target = "okta_auth_mcp",
                phase = ?LoginPhase::Authenticated,
                %host,
                "authenticated"
            );
            return Ok(true);
        }
    }

    warn!(
        target = "okta_auth_mcp",
        phase = ?LoginPhase::Failed,
        "authentication did not complete within poll budget"
    );
    Ok(false)
}

/// Distribute a code across a row of single-character input boxes. Needs at
/// least six boxes; fewer means this is not a code-entry layout.
async fn fill_digit_boxes(page: &dyn LoginPage, code: &str) -> bool {
    let count = page.digit_box_count().await.unwrap_or(0);
    if count < 6 {
        return false;
    }
    for (index, digit) in code.chars().take(count).enumerate() {
        if !page.fill_digit_box(index, digit).await.unwrap_or(false) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction_is_lowercased() {
        assert_eq!(host_of("https://Portal.Example.COM/x"), "portal.example.com");
        assert_eq!(host_of("garbage"), "");
    }

    #[test]
    fn idp_fragment_detection() {
        assert!(host_of("https://corp.okta.com/login").contains(IDP_HOST_FRAGMENT));
        assert!(!host_of("https://portal.example.com").contains(IDP_HOST_FRAGMENT));
    }
}
