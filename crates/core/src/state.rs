// Cookie and SessionState types for persisted authentication sessions.
//
// The on-disk shape matches Playwright's storage_state JSON (camelCase
// cookie fields), so stored blobs interoperate with Playwright tooling.

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[serde(rename = "None")]
    None,
    #[default]
    #[serde(rename = "Lax")]
    Lax,
    #[serde(rename = "Strict")]
    Strict,
}

/// A browser cookie captured from (or restored into) an authenticated context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name
    pub name: String,

    /// Cookie value
    pub value: String,

    /// Domain the cookie applies to (e.g., ".example.com")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Path for the cookie (default: "/")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Unix timestamp in seconds. -1 means session cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,

    /// Whether the cookie is HTTP-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,

    /// Whether the cookie requires HTTPS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    /// SameSite attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: Some(domain.into()),
            path: None,
            expires: None,
            http_only: None,
            secure: None,
            same_site: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }
}

/// A localStorage entry within an origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageEntry {
    pub name: String,
    pub value: String,
}

/// localStorage state for a single origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    /// The origin URL (e.g., "https://example.com")
    pub origin: String,

    /// localStorage entries for this origin
    pub local_storage: Vec<LocalStorageEntry>,
}

/// Complete authenticated-session state: cookies plus per-origin storage.
///
/// Captured from a browser context after a successful login and restored
/// into fresh contexts when validating or reusing a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// All cookies in the browser context
    pub cookies: Vec<Cookie>,

    /// localStorage data per origin
    pub origins: Vec<OriginState>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies(cookies: Vec<Cookie>) -> Self {
        Self {
            cookies,
            origins: Vec::new(),
        }
    }

    /// True iff the state carries at least one cookie or one origin entry.
    pub fn is_effective(&self) -> bool {
        !self.cookies.is_empty() || !self.origins.is_empty()
    }

    /// Loads session state from a JSON file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Saves session state to a JSON file.
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_serializes_camel_case() {
        let cookie = Cookie::new("sid", "abc", ".example.com")
            .http_only(true)
            .secure(true);

        let json = serde_json::to_string(&cookie).unwrap();
        assert!(json.contains("\"httpOnly\":true"));
        assert!(json.contains("\"secure\":true"));
    }

    #[test]
    fn state_roundtrip_preserves_counts() {
        let state = SessionState {
            cookies: vec![Cookie::new("sid", "abc", ".example.com")],
            origins: vec![OriginState {
                origin: "https://example.com".to_string(),
                local_storage: vec![LocalStorageEntry {
                    name: "token".to_string(),
                    value: "xyz".to_string(),
                }],
            }],
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"localStorage\""));

        let restored: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.cookies.len(), 1);
        assert_eq!(restored.origins.len(), 1);
        assert!(restored.is_effective());
    }

    #[test]
    fn empty_state_is_not_effective() {
        assert!(!SessionState::new().is_effective());
    }
}
