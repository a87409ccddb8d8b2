//! MCP tool surface. Every response is a structured JSON payload rendered
//! as text content; input errors and driver failures come back as
//! `success:false` / `valid:false` / `{error}` payloads rather than MCP
//! protocol errors.

use std::sync::Arc;
use std::time::Duration;

use okta_auth::{ExecutableCache, SessionStore};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::lifecycle::{self, LoginOptions};
use crate::login::Credentials;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginArgs {
    /// Target URL that redirects through Okta for sign-in.
    pub url: String,
    /// Okta username or email.
    pub identifier: String,
    /// Okta password.
    pub secret: String,
    /// Base32 TOTP seed for MFA code entry.
    pub totp_seed: Option<String>,
    /// Run the browser with a visible window.
    pub headed: Option<bool>,
    /// Navigation timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckSessionArgs {
    /// URL whose stored session should be validated.
    pub url: String,
    /// Navigation timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteSessionArgs {
    /// URL whose stored session should be removed.
    pub url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCookiesArgs {
    /// URL whose stored session cookies should be returned.
    pub url: String,
    /// Only return cookies whose domain contains this substring.
    pub domain_filter: Option<String>,
}

#[derive(Clone)]
pub struct OktaAuthServer {
    store: SessionStore,
    cache: Arc<ExecutableCache>,
    tool_router: ToolRouter<Self>,
}

fn payload(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl OktaAuthServer {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            cache: Arc::new(ExecutableCache::new()),
            tool_router: Self::tool_router(),
        }
    }

    fn options(&self, headed: Option<bool>, timeout_ms: Option<u64>) -> LoginOptions {
        LoginOptions {
            headed: headed.unwrap_or(false),
            channel: None,
            timeout: timeout_ms.map(Duration::from_millis),
        }
    }

    #[tool(
        description = "Log in to an Okta-protected URL with username/password (and optional TOTP MFA), then persist the authenticated browser session for reuse."
    )]
    async fn okta_login(
        &self,
        Parameters(args): Parameters<LoginArgs>,
    ) -> Result<CallToolResult, McpError> {
        let creds = Credentials {
            identifier: Some(args.identifier),
            secret: Some(args.secret),
            totp_seed: args.totp_seed,
        };
        let opts = self.options(args.headed, args.timeout_ms);
        match lifecycle::perform_login(&self.store, &self.cache, &args.url, &creds, &opts).await {
            Ok(report) => payload(
                serde_json::to_value(&report)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?,
            ),
            Err(err) => {
                error!(target = "okta_auth_mcp", error = %err, "login attempt failed");
                payload(json!({
                    "success": false,
                    "domain_key": serde_json::Value::Null,
                    "message": format!("Login error: {}: {err}", err.category()),
                    "url": args.url,
                }))
            }
        }
    }

    #[tool(
        description = "Check whether the stored session for a URL still authenticates. Reports invalid without opening a browser when no session is stored."
    )]
    async fn okta_check_session(
        &self,
        Parameters(args): Parameters<CheckSessionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let opts = self.options(None, args.timeout_ms);
        match lifecycle::verify_session(&self.store, &self.cache, &args.url, &opts).await {
            Ok(report) => payload(
                serde_json::to_value(&report)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?,
            ),
            Err(err) => {
                error!(target = "okta_auth_mcp", error = %err, "session check failed");
                payload(json!({
                    "valid": false,
                    "domain_key": serde_json::Value::Null,
                    "message": format!("Session check error: {}: {err}", err.category()),
                    "url": args.url,
                }))
            }
        }
    }

    #[tool(description = "List all stored sessions with their metadata.")]
    async fn okta_list_sessions(&self) -> Result<CallToolResult, McpError> {
        let sessions = self.store.list();
        payload(json!({
            "count": sessions.len(),
            "sessions": sessions,
        }))
    }

    #[tool(description = "Delete the stored session for a URL's domain.")]
    async fn okta_delete_session(
        &self,
        Parameters(args): Parameters<DeleteSessionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let deleted = self.store.delete(&args.url);
        payload(json!({
            "deleted": deleted,
            "message": if deleted {
                "Session deleted"
            } else {
                "No stored session for this domain"
            },
            "url": args.url,
        }))
    }

    #[tool(
        description = "Return the cookies from the stored session for a URL, optionally filtered by cookie domain substring."
    )]
    async fn okta_get_cookies(
        &self,
        Parameters(args): Parameters<GetCookiesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let state = match self.store.load(&args.url) {
            Ok(Some(state)) => state,
            Ok(None) => {
                return payload(json!({
                    "error": "No stored session for this domain",
                    "url": args.url,
                }));
            }
            Err(err) => {
                return payload(json!({
                    "error": format!("Stored session unreadable: {err}"),
                    "url": args.url,
                }));
            }
        };

        let cookies: Vec<_> = match &args.domain_filter {
            Some(filter) => {
                let needle = filter.to_lowercase();
                state
                    .cookies
                    .into_iter()
                    .filter(|c| {
                        c.domain
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                    })
                    .collect()
            }
            None => state.cookies,
        };

        payload(json!({
            "count": cookies.len(),
            "cookies": cookies,
            "url": args.url,
        }))
    }
}

#[tool_handler]
impl ServerHandler for OktaAuthServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Automates Okta SSO browser login and manages stored sessions. \
                 Use okta_login to sign in and persist a session, \
                 okta_check_session to validate a stored session, \
                 okta_list_sessions / okta_delete_session to manage the store, \
                 and okta_get_cookies to read stored cookies."
                    .to_string(),
            ),
        }
    }
}
