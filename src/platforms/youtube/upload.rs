use super::locators::*;
use super::metadata::{PublishSlot, VideoMetadata};
use crate::browser::driver::{DriverError, DriverResult, StudioDriver};
use crate::browser::session::StudioSession;
use crate::browser::wait::{is_present, wait_for};
use crate::config::Pacing;
use crate::platforms::traits::PlatformInfo;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

const NEXT_PAGES: usize = 3;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file input {0} not found on the upload page")]
    FileInputMissing(String),

    #[error("video was still uploading after {}s", .0.as_secs())]
    ProcessingTimeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub video_id: Option<String>,
}

impl UploadOutcome {
    pub fn rejected() -> Self {
        Self {
            success: false,
            video_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub video_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub metadata: VideoMetadata,
    pub made_for_kids: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoIdLookup {
    Found(String),
    NotFound,
}

/// Log in, run the upload dialog, and close the browser on every path.
pub async fn upload<D: StudioDriver>(
    session: &mut StudioSession<D>,
    request: &UploadRequest,
) -> Result<UploadOutcome> {
    let result = match session.ensure_logged_in().await {
        Ok(()) => {
            let platform = session.platform().clone();
            let pacing = *session.pacing();
            run_upload(session.driver_mut(), &platform, request, &pacing).await
        }
        Err(e) => Err(e),
    };
    session.finish(result).await
}

/// Walk the upload dialog on an already logged-in browser.
pub async fn run_upload<D>(
    driver: &mut D,
    platform: &PlatformInfo,
    request: &UploadRequest,
    pacing: &Pacing,
) -> Result<UploadOutcome>
where
    D: StudioDriver + ?Sized,
{
    let meta = &request.metadata;

    info!("[upload] Step 1: opening {}", platform.upload_url);
    driver.goto(&platform.home_url).await?;
    pacing.settle().await;
    driver
        .goto(&platform.upload_url)
        .await
        .context("Failed to open the upload page")?;
    pacing.settle().await;

    info!("[upload] Step 2: attaching {}", request.video_path.display());
    let video = absolute(&request.video_path)?;
    match wait_for(driver, INPUT_FILE_VIDEO, pacing).await {
        Ok(()) => {}
        Err(DriverError::ElementNotFound(_)) | Err(DriverError::Timeout { .. }) => {
            return Err(UploadError::FileInputMissing(INPUT_FILE_VIDEO.to_string()).into());
        }
        Err(e) => return Err(e).context("Failed to look up the file input"),
    }
    driver
        .attach_file(INPUT_FILE_VIDEO, &video)
        .await
        .context("Failed to attach video")?;
    debug!("Attached video {}", request.video_path.display());

    if let Some(thumbnail) = &request.thumbnail_path {
        let thumbnail_abs = absolute(thumbnail)?;
        wait_for(driver, INPUT_FILE_THUMBNAIL, pacing).await?;
        driver
            .attach_file(INPUT_FILE_THUMBNAIL, &thumbnail_abs)
            .await
            .context("Failed to attach thumbnail")?;
        driver.run_script(SHOW_THUMBNAIL_LOADER_JS).await?;
        debug!("Attached thumbnail {}", thumbnail.display());
    }

    info!("[upload] Step 3: filling details");
    wait_for(driver, TITLE_FIELD, pacing).await?;
    write_in_field(driver, TITLE_FIELD, &meta.title, true, pacing)
        .await
        .context("Failed to set title")?;
    debug!("The video title was set to \"{}\"", meta.title);

    if !meta.description.is_empty() {
        wait_for(driver, DESCRIPTION_FIELD, pacing).await?;
        write_in_field(driver, DESCRIPTION_FIELD, &meta.description, false, pacing)
            .await
            .context("Failed to set description")?;
        debug!("The video description was set to \"{}\"", meta.description);
    }

    let audience = if request.made_for_kids {
        MADE_FOR_KIDS_RADIO
    } else {
        NOT_MADE_FOR_KIDS_RADIO
    };
    click(driver, audience, pacing).await?;
    debug!(
        "Selected {}",
        if request.made_for_kids { "made for kids" } else { "not made for kids" }
    );

    if !meta.tags.is_empty() {
        click(driver, MORE_OPTIONS_BUTTON, pacing).await?;
        debug!("Clicked MORE OPTIONS");
        set_tags(driver, &meta.joined_tags(), pacing).await?;
        debug!("The tags were set to \"{}\"", meta.joined_tags());
    }

    info!("[upload] Step 4: advancing to visibility");
    for page in 1..=NEXT_PAGES {
        click(driver, NEXT_BUTTON, pacing).await?;
        debug!("Clicked next ({}/{})", page, NEXT_PAGES);
    }

    match &meta.schedule {
        None => {
            click(driver, PUBLIC_RADIO, pacing).await?;
            debug!("Made the video public");
        }
        Some(slot) => {
            click(driver, SCHEDULE_RADIO, pacing).await?;
            debug!("Clicked schedule");
            set_schedule(driver, slot, pacing).await?;
        }
    }

    let video_id = match get_video_id(driver, pacing).await {
        VideoIdLookup::Found(id) => Some(id),
        VideoIdLookup::NotFound => {
            warn!("{}", VIDEO_NOT_FOUND_ERROR);
            None
        }
    };

    info!("[upload] Step 5: waiting for the upload to finish");
    wait_for_processing(driver, pacing).await?;

    wait_for(driver, DONE_BUTTON, pacing).await?;
    let disabled = driver.attribute(DONE_BUTTON, "aria-disabled").await?;
    if disabled.as_deref() == Some("true") {
        // e.g. "File is a duplicate of a video you have already uploaded"
        let message = match driver.text(ERROR_CONTAINER).await {
            Ok(text) => text.trim().to_string(),
            Err(_) => "done button disabled without an error message".to_string(),
        };
        error!("[upload] {}", message);
        return Ok(UploadOutcome::rejected());
    }

    driver.click(DONE_BUTTON).await.context("Failed to click done")?;
    info!(
        "[upload] Published the video with video_id = {}",
        video_id.as_deref().unwrap_or("unknown")
    );
    pacing.settle().await;
    driver.goto(&platform.home_url).await?;

    Ok(UploadOutcome {
        success: true,
        video_id,
    })
}

/// Focus, optionally select everything, then type.
async fn write_in_field<D>(
    driver: &mut D,
    xpath: &str,
    text: &str,
    select_all: bool,
    pacing: &Pacing,
) -> DriverResult<()>
where
    D: StudioDriver + ?Sized,
{
    driver.click(xpath).await?;
    pacing.settle().await;
    if select_all {
        driver.select_all(xpath).await?;
        pacing.settle().await;
    }
    driver.type_text(xpath, text).await?;
    pacing.settle().await;
    Ok(())
}

async fn click<D>(driver: &mut D, xpath: &str, pacing: &Pacing) -> Result<()>
where
    D: StudioDriver + ?Sized,
{
    wait_for(driver, xpath, pacing).await?;
    driver
        .click(xpath)
        .await
        .with_context(|| format!("Failed to click {}", xpath))?;
    pacing.settle().await;
    Ok(())
}

async fn set_tags<D>(driver: &mut D, tags: &str, pacing: &Pacing) -> Result<()>
where
    D: StudioDriver + ?Sized,
{
    wait_for(driver, TAGS_INPUT, pacing).await?;
    match write_in_field(driver, TAGS_INPUT, tags, false, pacing).await {
        Ok(()) => Ok(()),
        Err(DriverError::ClickIntercepted(_)) => {
            warn!("[upload] tag field click was intercepted; clearing tags and retrying");
            driver
                .click(TAGS_CLEAR_BUTTON)
                .await
                .context("Failed to clear tags")?;
            pacing.settle().await;
            write_in_field(driver, TAGS_INPUT, tags, false, pacing)
                .await
                .context("Failed to set tags after clearing")
        }
        Err(e) => Err(e).context("Failed to set tags"),
    }
}

async fn set_schedule<D>(driver: &mut D, slot: &PublishSlot, pacing: &Pacing) -> Result<()>
where
    D: StudioDriver + ?Sized,
{
    click(driver, SCHEDULE_DATE_DROPDOWN, pacing).await?;
    wait_for(driver, SCHEDULE_DATE_INPUT, pacing).await?;
    let date = slot.picker_date();
    write_in_field(driver, SCHEDULE_DATE_INPUT, &date, true, pacing)
        .await
        .context("Failed to set schedule date")?;
    driver.press_key(SCHEDULE_DATE_INPUT, "Enter").await?;
    pacing.settle().await;
    debug!("Set date to {}", date);

    click(driver, SCHEDULE_TIME_DROPDOWN, pacing).await?;
    let item = schedule_time_item(slot.picker_index());
    wait_for(driver, &item, pacing).await?;
    driver.scroll_into_view(&item).await?;
    pacing.settle().await;
    driver
        .click(&item)
        .await
        .context("Failed to pick schedule time")?;
    pacing.settle().await;
    debug!("Set time to {}", slot.time.format("%H:%M"));
    Ok(())
}

/// Never fails: any driver error while reading the link is a missing id.
async fn get_video_id<D>(driver: &mut D, pacing: &Pacing) -> VideoIdLookup
where
    D: StudioDriver + ?Sized,
{
    match read_video_link(driver, pacing).await {
        Ok(Some(href)) => video_id_from_link(&href),
        Ok(None) => VideoIdLookup::NotFound,
        Err(e) => {
            debug!("Reading the video link failed: {}", e);
            VideoIdLookup::NotFound
        }
    }
}

async fn read_video_link<D>(driver: &mut D, pacing: &Pacing) -> DriverResult<Option<String>>
where
    D: StudioDriver + ?Sized,
{
    if !is_present(driver, VIDEO_URL_ELEMENT, pacing).await? {
        return Ok(None);
    }
    driver.attribute(VIDEO_URL_ELEMENT, "href").await
}

/// The trailing path segment of a video link.
pub fn video_id_from_link(href: &str) -> VideoIdLookup {
    let path = href.split(['?', '#']).next().unwrap_or("");
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(id) if !id.is_empty() && !id.contains(':') => VideoIdLookup::Found(id.to_string()),
        _ => VideoIdLookup::NotFound,
    }
}

async fn wait_for_processing<D>(driver: &mut D, pacing: &Pacing) -> Result<()>
where
    D: StudioDriver + ?Sized,
{
    wait_for(driver, STATUS_CONTAINER, pacing).await?;
    let start = Instant::now();
    loop {
        let status = driver.text(STATUS_CONTAINER).await?;
        if !status.contains(UPLOADING_MARKER) {
            debug!("Upload status: {}", status.trim());
            return Ok(());
        }
        if start.elapsed() >= pacing.processing_timeout {
            return Err(UploadError::ProcessingTimeout(pacing.processing_timeout).into());
        }
        debug!("Still uploading: {}", status.trim());
        tokio::time::sleep(pacing.poll_interval.max(pacing.settle)).await;
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Cannot resolve current directory")?;
    Ok(cwd.join(path))
}
