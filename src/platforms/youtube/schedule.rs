use super::datetime::{extract_clock, parse_day_label, to_iso, Locale};
use super::locators::{row_date_cell, PAGE_LANG_JS, TOOLTIP, VIDEO_ROWS};
use crate::browser::driver::StudioDriver;
use crate::browser::session::StudioSession;
use crate::config::Pacing;
use crate::platforms::traits::PlatformInfo;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{debug, info, warn};
use serde::Serialize;

const SORT_BY_DATE_DESC: &str = r#"{"columnType":"date","sortOrder":"DESCENDING"}"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub scheduled: Vec<String>,
    pub public: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Scheduled,
    Public,
}

impl ListFilter {
    fn filter_json(&self) -> &'static str {
        match self {
            Self::Scheduled => r#"[{"name":"HAS_SCHEDULE","value":["HAS_SCHEDULE"]}]"#,
            Self::Public => r#"[{"name":"VISIBILITY","value":["PUBLIC"]}]"#,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Public => "public",
        }
    }
}

/// Log in, read both lists, and close the browser on every path.
pub async fn get_schedule<D: StudioDriver>(
    session: &mut StudioSession<D>,
    tz: Option<Tz>,
) -> Result<ScheduleReport> {
    let result = match session.ensure_logged_in().await {
        Ok(()) => {
            let platform = session.platform().clone();
            let pacing = *session.pacing();
            let today = chrono::Local::now().date_naive();
            collect_schedule(session.driver_mut(), &platform, tz, &pacing, today).await
        }
        Err(e) => Err(e),
    };
    session.finish(result).await
}

pub async fn collect_schedule<D>(
    driver: &mut D,
    platform: &PlatformInfo,
    tz: Option<Tz>,
    pacing: &Pacing,
    today: NaiveDate,
) -> Result<ScheduleReport>
where
    D: StudioDriver + ?Sized,
{
    driver
        .goto(&platform.studio_url)
        .await
        .context("Failed to open Studio")?;
    pacing.settle().await;
    let current = driver.current_url().await?;
    let channel = channel_id_from_url(&current)
        .with_context(|| format!("Could not find a channel id in {}", current))?;
    info!("[schedule] reading lists for channel {}", channel);

    let mut report = ScheduleReport::default();
    for filter in [ListFilter::Scheduled, ListFilter::Public] {
        let url = list_url(&platform.studio_url, &channel, filter)?;
        let stamps = read_list(driver, &url, tz, pacing, today).await?;
        info!("[schedule] {} {} item(s)", stamps.len(), filter.as_str());
        match filter {
            ListFilter::Scheduled => report.scheduled = stamps,
            ListFilter::Public => report.public = stamps,
        }
    }
    Ok(report)
}

async fn read_list<D>(
    driver: &mut D,
    url: &str,
    tz: Option<Tz>,
    pacing: &Pacing,
    today: NaiveDate,
) -> Result<Vec<String>>
where
    D: StudioDriver + ?Sized,
{
    driver
        .goto(url)
        .await
        .with_context(|| format!("Failed to open {}", url))?;
    pacing.settle().await;

    let lang = driver.run_script(PAGE_LANG_JS).await?;
    let locale = Locale::from_lang(lang.as_str().unwrap_or(""));
    let rows = driver.count(VIDEO_ROWS).await?;
    debug!("{} row(s), page language {}", rows, locale.language());

    let mut stamps = Vec::new();
    for index in 1..=rows {
        let cell = row_date_cell(index);
        if driver.count(&cell).await? == 0 {
            continue;
        }
        driver.hover(&cell).await?;
        pacing.settle().await;

        if driver.count(TOOLTIP).await? == 0 {
            debug!("Row {} has no tooltip", index);
            continue;
        }
        let tooltip = driver.text(TOOLTIP).await?;
        let Some(time) = extract_clock(&tooltip) else {
            debug!("Row {} tooltip has no time: {}", index, tooltip.trim());
            continue;
        };

        let label = driver.text(&cell).await?;
        let day = label.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
        let Some(date) = parse_day_label(day, &locale, today) else {
            warn!("[schedule] row {}: unrecognized date '{}'", index, day);
            continue;
        };

        match to_iso(date.and_time(time), tz) {
            Some(stamp) => stamps.push(stamp),
            None => warn!("[schedule] row {}: {} {} does not exist in the target zone", index, date, time),
        }
    }
    Ok(stamps)
}

/// Channel id from a Studio URL such as `https://studio.youtube.com/channel/UC.../videos`.
pub fn channel_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/channel/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

pub fn list_url(studio_url: &str, channel: &str, filter: ListFilter) -> Result<String> {
    let base = format!(
        "{}/channel/{}/videos/upload",
        studio_url.trim_end_matches('/'),
        channel
    );
    let mut url = reqwest::Url::parse(&base).with_context(|| format!("Bad Studio URL {}", base))?;
    url.query_pairs_mut()
        .append_pair("filter", filter.filter_json())
        .append_pair("sort", SORT_BY_DATE_DESC);
    Ok(url.to_string())
}
