use super::cookies::CookieStore;
use super::driver::StudioDriver;
use crate::config::Pacing;
use crate::platforms::traits::PlatformInfo;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{error, info, warn};

/// Blocks until the operator has signed in by hand.
#[async_trait]
pub trait LoginPrompt: Send {
    async fn wait_for_sign_in(&mut self) -> Result<()>;
}

/// Waits for Enter on stdin.
pub struct ConsolePrompt;

#[async_trait]
impl LoginPrompt for ConsolePrompt {
    async fn wait_for_sign_in(&mut self) -> Result<()> {
        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| ())
        })
        .await
        .context("Console prompt task failed")?
        .context("Failed to read from stdin")
    }
}

/// One authenticated browser session against a platform.
pub struct StudioSession<D: StudioDriver> {
    driver: D,
    platform: PlatformInfo,
    cookies: CookieStore,
    prompt: Box<dyn LoginPrompt>,
    pacing: Pacing,
    closed: bool,
}

impl<D: StudioDriver> StudioSession<D> {
    pub fn new(
        driver: D,
        platform: PlatformInfo,
        cookies: CookieStore,
        prompt: Box<dyn LoginPrompt>,
        pacing: Pacing,
    ) -> Self {
        Self {
            driver,
            platform,
            cookies,
            prompt,
            pacing,
            closed: false,
        }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Restore saved cookies, or wait for a manual sign-in and save the
    /// resulting cookies.
    pub async fn ensure_logged_in(&mut self) -> Result<()> {
        let host = self.platform.cookie_host.clone();
        self.driver
            .goto(&self.platform.home_url)
            .await
            .with_context(|| format!("Failed to open {}", self.platform.home_url))?;
        self.pacing.settle().await;

        if self.cookies.has_cookies_for(&host) {
            let saved = self.cookies.load(&host)?;
            info!("[login] restoring {} saved cookie(s) for {}", saved.len(), host);
            self.driver
                .set_cookies(&saved)
                .await
                .context("Failed to restore cookies")?;
            self.pacing.settle().await;
            self.driver.reload().await.context("Failed to reload after restoring cookies")?;
        } else {
            info!("[login] no saved cookies for {}. Please sign in and then press enter", host);
            self.prompt.wait_for_sign_in().await?;
            self.driver
                .goto(&self.platform.home_url)
                .await
                .with_context(|| format!("Failed to open {}", self.platform.home_url))?;
            self.pacing.settle().await;
            let captured = self.driver.cookies().await.context("Failed to read cookies")?;
            self.cookies.save(&host, &captured)?;
        }
        Ok(())
    }

    /// Release the browser. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.driver.close().await.context("Failed to close browser")?;
        info!("[session] browser closed");
        Ok(())
    }

    /// Close the session after a workflow, passing its result through.
    /// Failures are logged before being returned.
    pub async fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.close().await?;
                Ok(value)
            }
            Err(e) => {
                error!("[session] workflow aborted: {:#}", e);
                if let Err(close_err) = self.close().await {
                    warn!("[session] close after failure also failed: {:#}", close_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::youtube;
    use crate::testing::{cookie, Action, FakeStudio};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPrompt(Arc<AtomicUsize>);

    #[async_trait]
    impl LoginPrompt for CountingPrompt {
        async fn wait_for_sign_in(&mut self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn session(
        studio: FakeStudio,
        store: CookieStore,
    ) -> (StudioSession<FakeStudio>, Arc<AtomicUsize>) {
        let prompts = Arc::new(AtomicUsize::new(0));
        let session = StudioSession::new(
            studio,
            youtube::info(),
            store,
            Box::new(CountingPrompt(prompts.clone())),
            Pacing::immediate(),
        );
        (session, prompts)
    }

    #[tokio::test]
    async fn saved_cookies_skip_the_interactive_pause() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path());
        store
            .save(&youtube::info().cookie_host, &[cookie("SID", "abc")])
            .unwrap();

        let (mut session, prompts) = session(FakeStudio::new(), store);
        session.ensure_logged_in().await.unwrap();

        assert_eq!(prompts.load(Ordering::SeqCst), 0);
        let studio = session.driver_mut();
        assert_eq!(studio.installed_cookies, vec![cookie("SID", "abc")]);
        let set = studio.position(&Action::SetCookies(1)).unwrap();
        let reload = studio.position(&Action::Reload).unwrap();
        assert!(set < reload);
    }

    #[tokio::test]
    async fn missing_cookies_pause_once_then_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path());
        let studio = FakeStudio::new().with_browser_cookies(vec![cookie("SID", "fresh")]);

        let (mut session, prompts) = session(studio, store.clone());
        session.ensure_logged_in().await.unwrap();

        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        let host = youtube::info().cookie_host;
        assert!(store.has_cookies_for(&host));
        assert_eq!(store.load(&host).unwrap()[0].value, "fresh");
        assert_eq!(
            session.driver_mut().visited(),
            vec![youtube::YOUTUBE_URL, youtube::YOUTUBE_URL]
        );
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session(FakeStudio::new(), CookieStore::new(dir.path()));
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(session.driver_mut().close_calls, 1);
    }

    #[tokio::test]
    async fn finish_closes_on_failure_and_returns_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session(FakeStudio::new(), CookieStore::new(dir.path()));

        let result = session
            .finish::<()>(Err(anyhow::anyhow!("page layout changed")))
            .await;

        assert!(result.unwrap_err().to_string().contains("page layout changed"));
        assert_eq!(session.driver_mut().close_calls, 1);
    }
}
