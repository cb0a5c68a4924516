use super::driver::StoredCookie;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

/// Per-host cookie files under one directory: `<dir>/<host>.json`.
#[derive(Debug, Clone)]
pub struct CookieStore {
    dir: PathBuf,
}

impl CookieStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, host: &str) -> PathBuf {
        self.dir.join(format!("{}.json", host))
    }

    /// True when a readable, non-empty cookie file exists for `host`.
    pub fn has_cookies_for(&self, host: &str) -> bool {
        match self.load(host) {
            Ok(cookies) => !cookies.is_empty(),
            Err(e) => {
                if self.path_for(host).exists() {
                    warn!("[cookies] ignoring unreadable cookie file for {}: {:#}", host, e);
                }
                false
            }
        }
    }

    pub fn load(&self, host: &str) -> Result<Vec<StoredCookie>> {
        let path = self.path_for(host);
        let body = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cookies from {}", path.display()))?;
        let cookies: Vec<StoredCookie> = serde_json::from_str(&body)
            .with_context(|| format!("Malformed cookie file {}", path.display()))?;
        Ok(cookies)
    }

    pub fn save(&self, host: &str, cookies: &[StoredCookie]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cookie dir {}", self.dir.display()))?;
        let path = self.path_for(host);
        let body = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&path, body)
            .with_context(|| format!("Failed to write cookies to {}", path.display()))?;
        info!("[cookies] saved {} cookie(s) to {}", cookies.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::cookie;

    #[test]
    fn missing_file_means_no_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path());
        assert!(!store.has_cookies_for("www.youtube.com"));
    }

    #[test]
    fn saved_cookies_are_found_for_their_host_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("nested"));
        store
            .save("www.youtube.com", &[cookie("SID", "abc"), cookie("HSID", "def")])
            .unwrap();

        assert!(store.has_cookies_for("www.youtube.com"));
        assert!(!store.has_cookies_for("studio.youtube.com"));
        let loaded = store.load("www.youtube.com").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "SID");
    }

    #[test]
    fn empty_or_corrupt_files_are_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path());
        std::fs::write(store.path_for("empty.host"), "[]").unwrap();
        std::fs::write(store.path_for("bad.host"), "not json").unwrap();

        assert!(!store.has_cookies_for("empty.host"));
        assert!(!store.has_cookies_for("bad.host"));
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path());
        std::fs::write(
            store.path_for("www.youtube.com"),
            r#"[{"name":"SID","value":"x","domain":".youtube.com"}]"#,
        )
        .unwrap();

        let loaded = store.load("www.youtube.com").unwrap();
        assert_eq!(loaded[0].path, "/");
        assert!(!loaded[0].secure);
    }
}
