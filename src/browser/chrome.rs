use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

const DEBUG_PORT_START: u16 = 9300;
const DEBUG_PORT_END: u16 = 9800;
const WINDOW_SIZE: (u32, u32) = (1280, 900);

#[derive(Debug, Deserialize)]
struct CdpTarget {
    #[serde(rename = "type")]
    target_type: String,
}

/// Allocate an available debugging port by probing localhost listeners.
pub fn allocate_port() -> Result<u16> {
    for port in DEBUG_PORT_START..=DEBUG_PORT_END {
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return Ok(port);
        }
    }

    bail!(
        "No available Chrome debugging port in range {}-{}",
        DEBUG_PORT_START,
        DEBUG_PORT_END
    )
}

/// Use `configured` when given, otherwise look for a Chrome install.
pub fn resolve_chrome(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => bail!("Configured Chrome binary {} does not exist", path.display()),
        None => detect_chrome(),
    }
}

/// Detect Chrome installation path on the current OS
pub fn detect_chrome() -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let paths = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for p in &paths {
            let path = PathBuf::from(p);
            if path.exists() {
                return Ok(path);
            }
        }
        if let Ok(path) = which::which("google-chrome") {
            return Ok(path);
        }
    }

    #[cfg(target_os = "windows")]
    {
        let paths = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for p in &paths {
            let path = PathBuf::from(p);
            if path.exists() {
                return Ok(path);
            }
        }
        if let Ok(path) = which::which("chrome") {
            return Ok(path);
        }
    }

    #[cfg(target_os = "linux")]
    {
        let names = [
            "google-chrome",
            "google-chrome-stable",
            "chromium-browser",
            "chromium",
        ];
        for name in &names {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }
    }

    bail!("Could not find Chrome browser. Install Google Chrome or pass --chrome")
}

fn launch_args(profile_dir: &Path, port: u16, headless: bool, url: &str) -> Vec<String> {
    let mut args = vec![
        format!("--user-data-dir={}", profile_dir.display()),
        format!("--remote-debugging-port={}", port),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-default-apps".to_string(),
        "--deny-permission-prompts".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        format!("--window-size={},{}", WINDOW_SIZE.0, WINDOW_SIZE.1),
    ];
    if headless {
        args.push("--headless=new".to_string());
    } else {
        args.push("--new-window".to_string());
    }
    args.push(url.to_string());
    args
}

/// Launch Chrome with a debugging port and return (Child, port)
pub fn launch_chrome_with_debug(
    chrome_path: &Path,
    profile_dir: &Path,
    headless: bool,
    url: &str,
) -> Result<(Child, u16)> {
    if is_profile_busy(profile_dir) {
        bail!(
            "PROFILE_BUSY: the browser profile {} is in use by another Chrome window. Close it and retry.",
            profile_dir.display()
        );
    }
    std::fs::create_dir_all(profile_dir)
        .with_context(|| format!("Failed to create profile dir {}", profile_dir.display()))?;

    let port = allocate_port()?;
    info!(
        "[Chrome launch] preparing profile={} port={} headless={} url={}",
        profile_dir.display(),
        port,
        headless,
        url
    );

    let child = Command::new(chrome_path)
        .args(launch_args(profile_dir, port, headless, url))
        .spawn()
        .context("Failed to launch Chrome")?;

    info!(
        "Launched Chrome (PID: {}, port: {}) profile: {}",
        child.id(),
        port,
        profile_dir.display()
    );
    Ok((child, port))
}

/// Wait until the debugging endpoint answers and has a page target.
pub async fn wait_for_chrome_ready(port: u16, profile_dir: &Path, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    let mut saw_version = false;

    loop {
        if start.elapsed() > timeout {
            if saw_version {
                bail!(
                    "CHROME_NOT_READY: debugging port {} answers but no page appeared within {}s",
                    port,
                    timeout.as_secs()
                );
            }
            if is_profile_busy(profile_dir) {
                bail!(
                    "PROFILE_BUSY: Chrome profile {} is held by another session (port {})",
                    profile_dir.display(),
                    port
                );
            }
            bail!(
                "CHROME_NOT_READY: Chrome did not come up within {}s (port {})",
                timeout.as_secs(),
                port
            );
        }

        if is_port_version_ready(port).await {
            saw_version = true;
            match has_page_target(port).await {
                Ok(true) => {
                    info!("Chrome is ready on port {}", port);
                    return Ok(());
                }
                Ok(false) => debug!("Chrome on port {} has no page target yet", port),
                Err(e) => debug!("Page target check on port {} failed: {:#}", port, e),
            }
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn is_port_version_ready(port: u16) -> bool {
    let version_url = format!("http://127.0.0.1:{}/json/version", port);
    match reqwest::get(&version_url).await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

async fn has_page_target(port: u16) -> Result<bool> {
    let list_url = format!("http://127.0.0.1:{}/json/list", port);
    let resp = reqwest::get(&list_url)
        .await
        .context("Failed to query Chrome json/list")?;

    if !resp.status().is_success() {
        return Ok(false);
    }

    let body = resp.text().await.unwrap_or_default();
    Ok(page_target_in(&body))
}

fn page_target_in(body: &str) -> bool {
    let targets: Vec<CdpTarget> = serde_json::from_str(body).unwrap_or_default();
    targets.iter().any(|target| target.target_type == "page")
}

fn has_singleton_artifacts(profile_dir: &Path) -> bool {
    ["SingletonLock", "SingletonCookie", "SingletonSocket"]
        .iter()
        .any(|name| profile_dir.join(name).exists())
}

fn singleton_lock_pid(profile_dir: &Path) -> Option<u32> {
    let lock_path = profile_dir.join("SingletonLock");
    let target = std::fs::read_link(lock_path).ok()?;
    let name = target.file_name()?.to_string_lossy();
    let pid_part = name.rsplit('-').next()?;
    pid_part.parse::<u32>().ok()
}

#[cfg(unix)]
fn is_pid_running(pid: u32) -> bool {
    let pid_text = pid.to_string();
    let output = match Command::new("ps")
        .args(["-p", &pid_text, "-o", "pid="])
        .output()
    {
        Ok(output) => output,
        Err(_) => return false,
    };
    if !output.status.success() {
        return false;
    }
    !String::from_utf8_lossy(&output.stdout).trim().is_empty()
}

#[cfg(not(unix))]
fn is_pid_running(_pid: u32) -> bool {
    false
}

/// A profile is busy while a live Chrome holds its singleton lock.
pub fn is_profile_busy(profile_dir: &Path) -> bool {
    if !has_singleton_artifacts(profile_dir) {
        return false;
    }

    match singleton_lock_pid(profile_dir) {
        Some(pid) => is_pid_running(pid),
        None => true,
    }
}
