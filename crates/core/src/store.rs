//! Per-domain session storage.
//!
//! Sessions are stored as `{domain_key}.json` session blobs with companion
//! `{domain_key}.meta.json` metadata files under a single directory
//! (default `$HOME/.okta-auth-mcp/sessions`). Filenames are a deterministic
//! function of the domain key, so repeated saves overwrite rather than
//! accumulate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::state::SessionState;

/// Metadata persisted alongside each session blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    /// URL the session was captured for.
    pub source_url: String,
    pub domain_key: String,
    /// Save time, seconds since the Unix epoch.
    pub saved_at: u64,
    pub saved_at_iso: String,
    pub cookie_count: usize,
    pub origin_count: usize,
    /// Whether the companion session blob still exists. Computed during
    /// [`SessionStore::list`], not persisted.
    #[serde(default)]
    pub session_file_exists: bool,
}

/// Filesystem-backed store mapping domain keys to session blobs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

/// Derive a filesystem-safe key from a URL's network host.
///
/// Lowercased host; falls back to the raw lowercased input when the URL has
/// no host (malformed or relative). `:` and `/` are replaced with `_`.
/// Identical hosts always map to the identical key regardless of path or
/// query string.
pub fn derive_domain_key(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{h}:{port}"),
                None => h.to_string(),
            })
        })
        .unwrap_or_default()
        .to_lowercase();

    let raw = if host.is_empty() {
        url.to_lowercase()
    } else {
        host
    };
    raw.replace([':', '/'], "_")
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `$HOME/.okta-auth-mcp/sessions`.
    pub fn default_location() -> Self {
        let base = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(".okta-auth-mcp").join("sessions"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.meta.json"))
    }

    /// Persist a session for a URL, overwriting any prior record for the
    /// same domain key. Returns the key.
    pub fn save(&self, url: &str, state: &SessionState) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Store {
            path: self.dir.clone(),
            source,
        })?;

        let key = derive_domain_key(url);
        let blob_path = self.session_path(&key);
        // Re-serialize rather than byte-copy so malformed input fails here.
        let blob = serde_json::to_string_pretty(state)?;
        fs::write(&blob_path, blob).map_err(|source| Error::Store {
            path: blob_path,
            source,
        })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let meta = SessionMeta {
            source_url: url.to_string(),
            domain_key: key.clone(),
            saved_at: now,
            saved_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            cookie_count: state.cookies.len(),
            origin_count: state.origins.len(),
            session_file_exists: true,
        };
        let meta_path = self.meta_path(&key);
        fs::write(&meta_path, serde_json::to_string_pretty(&meta)?).map_err(|source| {
            Error::Store {
                path: meta_path,
                source,
            }
        })?;

        debug!(target = "okta_auth", %key, cookies = meta.cookie_count, "session saved");
        Ok(key)
    }

    /// Path to the stored session blob for a URL, or `None` when absent.
    pub fn load_path(&self, url: &str) -> Option<PathBuf> {
        let path = self.session_path(&derive_domain_key(url));
        path.exists().then_some(path)
    }

    /// Load and parse the stored session blob for a URL.
    pub fn load(&self, url: &str) -> Result<Option<SessionState>> {
        match self.load_path(url) {
            Some(path) => Ok(Some(SessionState::from_file(&path).map_err(|source| {
                Error::Store { path, source }
            })?)),
            None => Ok(None),
        }
    }

    /// True iff a session exists for the URL and carries at least one cookie
    /// or origin entry. Malformed stored JSON reads as "not effective".
    pub fn is_effective(&self, url: &str) -> bool {
        self.load_path(url)
            .and_then(|path| SessionState::from_file(path).ok())
            .map(|state| state.is_effective())
            .unwrap_or(false)
    }

    /// All stored session metadata, sorted by domain key. Corrupt metadata
    /// entries are skipped.
    pub fn list(&self) -> Vec<SessionMeta> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut sessions: Vec<SessionMeta> = entries
            .flatten()
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .ends_with(".meta.json")
            })
            .filter_map(|e| {
                let content = fs::read_to_string(e.path()).ok()?;
                let mut meta: SessionMeta = serde_json::from_str(&content).ok()?;
                meta.session_file_exists = self.session_path(&meta.domain_key).exists();
                Some(meta)
            })
            .collect();

        sessions.sort_by(|a, b| a.domain_key.cmp(&b.domain_key));
        sessions
    }

    /// Remove the session blob and metadata for a URL. Returns whether
    /// anything existed to remove; a second delete returns false.
    pub fn delete(&self, url: &str) -> bool {
        let key = derive_domain_key(url);
        let mut deleted = false;
        for path in [self.session_path(&key), self.meta_path(&key)] {
            if path.exists() && fs::remove_file(&path).is_ok() {
                deleted = true;
            }
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Cookie, LocalStorageEntry, OriginState};

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("sessions"));
        (dir, store)
    }

    fn one_cookie_state() -> SessionState {
        SessionState::with_cookies(vec![Cookie::new("sid", "abc", ".example.com")])
    }

    #[test]
    fn domain_key_is_host_only() {
        assert_eq!(
            derive_domain_key("https://portal.example.com/app?x=1"),
            "portal.example.com"
        );
        assert_eq!(
            derive_domain_key("https://portal.example.com/other/path"),
            "portal.example.com"
        );
        assert_eq!(
            derive_domain_key("https://Portal.Example.COM"),
            "portal.example.com"
        );
    }

    #[test]
    fn domain_key_replaces_separators() {
        assert_eq!(
            derive_domain_key("https://portal.example.com:8443/app"),
            "portal.example.com_8443"
        );
    }

    #[test]
    fn domain_key_falls_back_to_raw_url() {
        assert_eq!(derive_domain_key("not a url"), "not a url");
        assert_eq!(derive_domain_key("/Relative/Path"), "_relative_path");
    }

    #[test]
    fn different_hosts_get_different_keys() {
        assert_ne!(
            derive_domain_key("https://a.example.com"),
            derive_domain_key("https://b.example.com")
        );
    }

    #[test]
    fn save_then_load_roundtrips_counts() {
        let (_tmp, store) = store();
        let url = "https://portal.example.com/app?x=1";

        let key = store.save(url, &one_cookie_state()).unwrap();
        assert_eq!(key, "portal.example.com");

        let path = store.load_path(url).expect("session blob should exist");
        let restored = SessionState::from_file(path).unwrap();

        let sessions = store.list();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].domain_key, key);
        assert_eq!(sessions[0].cookie_count, restored.cookies.len());
        assert_eq!(sessions[0].origin_count, restored.origins.len());
        assert!(sessions[0].session_file_exists);
    }

    #[test]
    fn save_overwrites_prior_record() {
        let (_tmp, store) = store();
        let url = "https://portal.example.com";

        store.save(url, &one_cookie_state()).unwrap();
        let richer = SessionState {
            cookies: vec![
                Cookie::new("sid", "abc", ".example.com"),
                Cookie::new("csrf", "def", ".example.com"),
            ],
            origins: vec![],
        };
        store.save(url, &richer).unwrap();

        let sessions = store.list();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].cookie_count, 2);
    }

    #[test]
    fn is_effective_requires_cookies_or_origins() {
        let (_tmp, store) = store();
        let url = "https://portal.example.com";

        assert!(!store.is_effective(url));

        store.save(url, &SessionState::new()).unwrap();
        assert!(!store.is_effective(url));

        let origins_only = SessionState {
            cookies: vec![],
            origins: vec![OriginState {
                origin: "https://portal.example.com".to_string(),
                local_storage: vec![LocalStorageEntry {
                    name: "k".to_string(),
                    value: "v".to_string(),
                }],
            }],
        };
        store.save(url, &origins_only).unwrap();
        assert!(store.is_effective(url));
    }

    #[test]
    fn is_effective_false_on_malformed_blob() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("portal.example.com.json"), "{bad json").unwrap();

        assert!(!store.is_effective("https://portal.example.com"));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_tmp, store) = store();
        let url = "https://portal.example.com";

        store.save(url, &one_cookie_state()).unwrap();
        assert!(store.delete(url));
        assert!(store.load_path(url).is_none());
        assert!(!store.delete(url));
    }

    #[test]
    fn list_skips_corrupt_metadata() {
        let (_tmp, store) = store();
        store
            .save("https://a.example.com", &one_cookie_state())
            .unwrap();
        fs::write(store.dir().join("broken.meta.json"), "not json").unwrap();

        let sessions = store.list();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].domain_key, "a.example.com");
    }

    #[test]
    fn list_is_sorted_by_domain_key() {
        let (_tmp, store) = store();
        store
            .save("https://zeta.example.com", &one_cookie_state())
            .unwrap();
        store
            .save("https://alpha.example.com", &one_cookie_state())
            .unwrap();

        let keys: Vec<_> = store.list().into_iter().map(|m| m.domain_key).collect();
        assert_eq!(keys, vec!["alpha.example.com", "zeta.example.com"]);
    }

    #[test]
    fn list_flags_missing_session_blob() {
        let (_tmp, store) = store();
        let url = "https://portal.example.com";
        store.save(url, &one_cookie_state()).unwrap();
        fs::remove_file(store.dir().join("portal.example.com.json")).unwrap();

        let sessions = store.list();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].session_file_exists);
    }
}
