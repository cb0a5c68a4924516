use super::chrome::{launch_chrome_with_debug, resolve_chrome, wait_for_chrome_ready};
use super::driver::{DriverError, DriverResult, StoredCookie, StudioDriver};
use crate::config::AppConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{info, warn};
use std::path::Path;
use std::process::Child;
use std::time::Duration;
use tokio::task::JoinHandle;

const CHROME_READY_TIMEOUT: Duration = Duration::from_secs(30);

// Runs with `this` bound to the element. True when a click at its center
// would land on the element itself.
const CLICK_TARGET_JS: &str = r#"function() {
    const r = this.getBoundingClientRect();
    const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
    return !hit || hit === this || this.contains(hit) || hit.contains(this);
}"#;

const SELECT_ALL_JS: &str = r#"function() {
    this.focus();
    document.execCommand('selectAll', false, null);
}"#;

/// [`StudioDriver`] backed by a Chrome instance over CDP.
pub struct CdpDriver {
    browser: Option<Browser>,
    page: Page,
    chrome: Option<Child>,
    handler: Option<JoinHandle<()>>,
}

/// Launch Chrome on the configured profile and attach to its first page.
pub async fn launch_studio_browser(config: &AppConfig) -> Result<CdpDriver> {
    let chrome_path = resolve_chrome(config.chrome_path.as_deref())?;
    let profile_dir = config.profile_dir();
    let (mut child, port) =
        launch_chrome_with_debug(&chrome_path, &profile_dir, config.headless, "about:blank")?;

    if let Err(e) = wait_for_chrome_ready(port, &profile_dir, CHROME_READY_TIMEOUT).await {
        let _ = child.kill();
        return Err(e);
    }

    match connect_to_chrome(port).await {
        Ok((browser, page, handler)) => Ok(CdpDriver {
            browser: Some(browser),
            page,
            chrome: Some(child),
            handler: Some(handler),
        }),
        Err(e) => {
            let _ = child.kill();
            Err(e)
        }
    }
}

/// Connect to an already-running Chrome instance via CDP
async fn connect_to_chrome(port: u16) -> Result<(Browser, Page, JoinHandle<()>)> {
    let debug_url = format!("http://127.0.0.1:{}", port);

    let (browser, mut handler) = Browser::connect(&debug_url)
        .await
        .with_context(|| format!("Failed to connect to Chrome on port {}", port))?;

    let handle = tokio::spawn(async move {
        while let Some(_event) = handler.next().await {}
    });

    let pages = browser.pages().await.context("Failed to get pages")?;
    let page = match pages.into_iter().next() {
        Some(page) => page,
        None => browser
            .new_page("about:blank")
            .await
            .context("Failed to open a page")?,
    };

    info!("Connected to Chrome CDP on port {}", port);
    Ok((browser, page, handle))
}

fn cdp(err: CdpError) -> DriverError {
    DriverError::Cdp(err.to_string())
}

impl CdpDriver {
    async fn find(&self, xpath: &str) -> DriverResult<Element> {
        self.page
            .find_xpaths(xpath)
            .await
            .map_err(cdp)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::ElementNotFound(xpath.to_string()))
    }

    async fn call_on(&self, element: &Element, function: &str) -> DriverResult<serde_json::Value> {
        let returns = element.call_js_fn(function, false).await.map_err(cdp)?;
        Ok(returns.result.value.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl StudioDriver for CdpDriver {
    async fn goto(&mut self, url: &str) -> DriverResult<()> {
        self.page.goto(url).await.map_err(cdp)?;
        Ok(())
    }

    async fn reload(&mut self) -> DriverResult<()> {
        self.page.reload().await.map_err(cdp)?;
        Ok(())
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.page.url().await.map_err(cdp)?.unwrap_or_default())
    }

    async fn count(&mut self, xpath: &str) -> DriverResult<usize> {
        Ok(self.page.find_xpaths(xpath).await.map_err(cdp)?.len())
    }

    async fn click(&mut self, xpath: &str) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        element.scroll_into_view().await.map_err(cdp)?;
        let on_target = self.call_on(&element, CLICK_TARGET_JS).await?;
        if on_target == serde_json::Value::Bool(false) {
            return Err(DriverError::ClickIntercepted(xpath.to_string()));
        }
        element.click().await.map_err(cdp)?;
        Ok(())
    }

    async fn type_text(&mut self, xpath: &str, text: &str) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        element.focus().await.map_err(cdp)?;
        element.type_str(text).await.map_err(cdp)?;
        Ok(())
    }

    async fn select_all(&mut self, xpath: &str) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        self.call_on(&element, SELECT_ALL_JS).await?;
        Ok(())
    }

    async fn press_key(&mut self, xpath: &str, key: &str) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        element.press_key(key).await.map_err(cdp)?;
        Ok(())
    }

    async fn hover(&mut self, xpath: &str) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        element.scroll_into_view().await.map_err(cdp)?;
        element.hover().await.map_err(cdp)?;
        Ok(())
    }

    async fn scroll_into_view(&mut self, xpath: &str) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        element.scroll_into_view().await.map_err(cdp)?;
        Ok(())
    }

    async fn attach_file(&mut self, xpath: &str, file: &Path) -> DriverResult<()> {
        let element = self.find(xpath).await?;
        let mut params = SetFileInputFilesParams::new(vec![file.display().to_string()]);
        params.backend_node_id = Some(element.backend_node_id.clone());
        self.page.execute(params).await.map_err(cdp)?;
        info!("File set successfully: {}", file.display());
        Ok(())
    }

    async fn text(&mut self, xpath: &str) -> DriverResult<String> {
        let element = self.find(xpath).await?;
        Ok(element.inner_text().await.map_err(cdp)?.unwrap_or_default())
    }

    async fn attribute(&mut self, xpath: &str, name: &str) -> DriverResult<Option<String>> {
        let element = self.find(xpath).await?;
        element.attribute(name).await.map_err(cdp)
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<serde_json::Value> {
        let result = self.page.evaluate(script).await.map_err(cdp)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn cookies(&mut self) -> DriverResult<Vec<StoredCookie>> {
        let cookies = self.page.get_cookies().await.map_err(cdp)?;
        Ok(cookies
            .into_iter()
            .map(|c| StoredCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                expires: c.expires,
                http_only: c.http_only,
                secure: c.secure,
                session: c.session,
            })
            .collect())
    }

    async fn set_cookies(&mut self, cookies: &[StoredCookie]) -> DriverResult<()> {
        let params: Vec<CookieParam> = cookies
            .iter()
            .map(|c| {
                let mut param = CookieParam::new(c.name.clone(), c.value.clone());
                param.domain = Some(c.domain.clone());
                param.path = Some(c.path.clone());
                param.http_only = Some(c.http_only);
                param.secure = Some(c.secure);
                if !c.session && c.expires > 0.0 {
                    param.expires = Some(TimeSinceEpoch::new(c.expires));
                }
                param
            })
            .collect();
        self.page.set_cookies(params).await.map_err(cdp)?;
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser.close failed, killing the process: {}", e);
            }
        }
        if let Some(mut child) = self.chrome.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        Ok(())
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        if let Some(mut child) = self.chrome.take() {
            let _ = child.kill();
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
