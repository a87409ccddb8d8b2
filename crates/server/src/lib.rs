//! MCP server automating Okta SSO browser login: drives a Chromium-family
//! browser through the sign-in flow (including two-step and TOTP MFA
//! screens), persists the authenticated session per domain, and exposes
//! session management tools over stdio.

pub mod browser;
pub mod cli;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod login;
pub mod selectors;
pub mod server;
pub mod testing;

pub use error::{AuthError, Result};
pub use server::OktaAuthServer;
