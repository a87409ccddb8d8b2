//! Driverless building blocks for Okta SSO session automation: persisted
//! session state, the per-domain session store, TOTP generation, and system
//! browser discovery. Browser control and the tool surface live in the
//! `okta-auth-mcp` server crate.

pub mod error;
pub mod locator;
pub mod state;
pub mod store;
pub mod totp;

pub use error::{Error, Result};
pub use locator::ExecutableCache;
pub use state::{Cookie, LocalStorageEntry, OriginState, SameSite, SessionState};
pub use store::{SessionMeta, SessionStore, derive_domain_key};
