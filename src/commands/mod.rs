pub mod history;
pub mod schedule;
pub mod upload;

use crate::browser::automation::{launch_studio_browser, CdpDriver};
use crate::browser::cookies::CookieStore;
use crate::browser::session::{ConsolePrompt, StudioSession};
use crate::config::AppConfig;
use crate::platforms::youtube;
use anyhow::Result;

/// Launch Chrome and wrap it in a console-prompting YouTube session.
pub async fn open_session(config: &AppConfig) -> Result<StudioSession<CdpDriver>> {
    let driver = launch_studio_browser(config).await?;
    Ok(StudioSession::new(
        driver,
        youtube::info(),
        CookieStore::new(&config.cookies_dir),
        Box::new(ConsolePrompt),
        config.pacing,
    ))
}
