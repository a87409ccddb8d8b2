//! System browser executable discovery.
//!
//! Resolves a browser channel name ("chrome", "msedge", ...) to a runnable
//! executable: environment-variable overrides first, then platform install
//! locations, each candidate verified with a `--version` probe. Results are
//! cached per channel for the lifetime of the cache object.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Env vars consulted before platform discovery, per channel.
fn env_override_keys(channel: &str) -> &'static [&'static str] {
    match channel {
        "chrome" => &["BROWSER_EXECUTABLE", "CHROME_PATH", "GOOGLE_CHROME_SHIM"],
        "chrome-beta" => &["BROWSER_EXECUTABLE", "CHROME_BETA_PATH"],
        "chrome-canary" => &["BROWSER_EXECUTABLE", "CHROME_CANARY_PATH"],
        "msedge" => &["BROWSER_EXECUTABLE", "EDGE_PATH", "MSEDGE_PATH"],
        "msedge-beta" => &["BROWSER_EXECUTABLE", "MSEDGE_BETA_PATH"],
        _ => &["BROWSER_EXECUTABLE"],
    }
}

/// Process-scoped cache of verified executable lookups.
///
/// Deliberately an explicit object rather than a global: callers own the
/// "resolve once, remember" property.
#[derive(Debug, Default)]
pub struct ExecutableCache {
    resolved: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl ExecutableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a channel to a verified executable path, or `None` when the
    /// channel is unavailable. Cached per channel.
    pub fn resolve(&self, channel: &str) -> Option<PathBuf> {
        let normalized = channel.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(cached) = self
            .resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&normalized)
        {
            return cached.clone();
        }

        let found = discover(&normalized);
        debug!(target = "okta_auth", channel = %normalized, found = ?found, "browser channel resolved");
        self.resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(normalized, found.clone());
        found
    }

    /// Whether the channel resolves to a launchable browser.
    pub fn is_available(&self, channel: &str) -> bool {
        self.resolve(channel).is_some()
    }
}

fn discover(channel: &str) -> Option<PathBuf> {
    if let Some(path) = env_override(channel) {
        if verify_launch(&path) {
            return Some(path);
        }
    }
    candidate_paths(channel)
        .into_iter()
        .find(|p| is_executable(p) && verify_launch(p))
}

fn env_override(channel: &str) -> Option<PathBuf> {
    for key in env_override_keys(channel) {
        if let Some(value) = std::env::var_os(key) {
            let candidate = PathBuf::from(value);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(target_os = "macos")]
fn candidate_paths(channel: &str) -> Vec<PathBuf> {
    let bundles: &[&str] = match channel {
        "chrome" => &["Google Chrome"],
        "chrome-beta" => &["Google Chrome Beta"],
        "chrome-canary" => &["Google Chrome Canary"],
        "msedge" => &["Microsoft Edge"],
        "msedge-beta" => &["Microsoft Edge Beta"],
        _ => &[],
    };
    let home = std::env::var_os("HOME").map(PathBuf::from);
    bundles
        .iter()
        .flat_map(|bundle| {
            let rel = format!("{bundle}.app/Contents/MacOS/{bundle}");
            let mut paths = vec![PathBuf::from("/Applications").join(&rel)];
            if let Some(home) = &home {
                paths.push(home.join("Applications").join(&rel));
            }
            paths
        })
        .collect()
}

#[cfg(target_os = "windows")]
fn candidate_paths(channel: &str) -> Vec<PathBuf> {
    let suffixes: &[&str] = match channel {
        "chrome" => &["Google/Chrome/Application/chrome.exe"],
        "chrome-beta" => &["Google/Chrome Beta/Application/chrome.exe"],
        "chrome-canary" => &["Google/Chrome SxS/Application/chrome.exe"],
        "msedge" => &["Microsoft/Edge/Application/msedge.exe"],
        "msedge-beta" => &["Microsoft/Edge Beta/Application/msedge.exe"],
        _ => &[],
    };
    ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
        .iter()
        .filter_map(std::env::var_os)
        .map(PathBuf::from)
        .flat_map(|root| suffixes.iter().map(move |s| root.join(s)))
        .collect()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn candidate_paths(channel: &str) -> Vec<PathBuf> {
    let binaries: &[&str] = match channel {
        "chrome" => &[
            "google-chrome",
            "google-chrome-stable",
            "chromium-browser",
            "chromium",
        ],
        "chrome-beta" => &["google-chrome-beta"],
        "chrome-canary" => &["google-chrome-unstable", "google-chrome-dev"],
        "msedge" => &["microsoft-edge", "microsoft-edge-stable"],
        "msedge-beta" => &["microsoft-edge-beta"],
        _ => &[],
    };
    binaries
        .iter()
        .filter_map(|binary| which_in_path(binary))
        .collect()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn which_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("exe") | Some("bat") | Some("cmd")
        )
    }
}

/// Run `<exe> --version` and require a zero exit within the probe budget.
fn verify_launch(executable: &Path) -> bool {
    let spawned = Command::new(executable)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let Ok(mut child) = spawned else {
        return false;
    };

    let deadline = Instant::now() + PROBE_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.success(),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return false;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(_) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_channel_resolves_to_none() {
        let cache = ExecutableCache::new();
        assert_eq!(cache.resolve(""), None);
        assert_eq!(cache.resolve("   "), None);
    }

    #[test]
    fn unknown_channel_is_cached_as_unavailable() {
        let cache = ExecutableCache::new();
        assert!(!cache.is_available("netscape-navigator"));
        // Second lookup hits the cache; same answer.
        assert!(!cache.is_available("netscape-navigator"));
    }

    #[cfg(unix)]
    #[test]
    fn env_override_must_point_at_an_executable() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("missing-browser");
        // Points at nothing; discovery must fall through, not error.
        unsafe { std::env::set_var("MSEDGE_BETA_PATH", &bogus) };
        let cache = ExecutableCache::new();
        let resolved = cache.resolve("msedge-beta");
        assert_ne!(resolved, Some(bogus));
        unsafe { std::env::remove_var("MSEDGE_BETA_PATH") };
    }
}
