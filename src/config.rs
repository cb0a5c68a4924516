use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SETTLE_MS: u64 = 1000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_ELEMENT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 3600;

/// Delays and timeouts applied between and around UI interactions.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Pause after every interaction so the page can catch up.
    pub settle: Duration,
    pub poll_interval: Duration,
    pub element_timeout: Duration,
    pub processing_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            element_timeout: Duration::from_secs(DEFAULT_ELEMENT_TIMEOUT_SECS),
            processing_timeout: Duration::from_secs(DEFAULT_PROCESSING_TIMEOUT_SECS),
        }
    }
}

impl Pacing {
    /// No waiting at all; lookups fail on the first miss.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            poll_interval: Duration::ZERO,
            element_timeout: Duration::ZERO,
            processing_timeout: Duration::from_millis(50),
        }
    }

    pub async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub cookies_dir: PathBuf,
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub pacing: Pacing,
}

impl AppConfig {
    /// Resolve directories, falling back to `~/.tube-publisher` when no data
    /// directory is given.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        cookies_dir: Option<PathBuf>,
        chrome_path: Option<PathBuf>,
        headless: bool,
        pacing: Pacing,
    ) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        let cookies_dir = cookies_dir.unwrap_or_else(|| data_dir.join("cookies"));
        Ok(Self {
            data_dir,
            cookies_dir,
            chrome_path,
            headless,
            pacing,
        })
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.data_dir.join("profiles").join("studio")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot find home directory")?;
    Ok(home.join(".tube-publisher"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_dir_defaults_under_data_dir() {
        let cfg = AppConfig::resolve(
            Some(PathBuf::from("/tmp/tp")),
            None,
            None,
            false,
            Pacing::default(),
        )
        .unwrap();
        assert_eq!(cfg.cookies_dir, PathBuf::from("/tmp/tp/cookies"));
        assert_eq!(cfg.profile_dir(), PathBuf::from("/tmp/tp/profiles/studio"));
    }

    #[test]
    fn explicit_cookies_dir_wins() {
        let cfg = AppConfig::resolve(
            Some(PathBuf::from("/tmp/tp")),
            Some(PathBuf::from("/srv/cookies")),
            None,
            true,
            Pacing::default(),
        )
        .unwrap();
        assert_eq!(cfg.cookies_dir, PathBuf::from("/srv/cookies"));
        assert!(cfg.headless);
    }
}
