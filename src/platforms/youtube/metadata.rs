use super::datetime;
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// Metadata file as written by the user; every key is optional and `null`
/// counts as unset.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    schedule: Option<Vec<String>>,
}

/// A future publish time, as entered in the schedule picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl PublishSlot {
    pub fn parse(date: &str, time: &str) -> Result<Self> {
        Ok(Self {
            date: datetime::parse_schedule_date(date)?,
            time: datetime::parse_hhmm(time)?,
        })
    }

    pub fn picker_date(&self) -> String {
        datetime::format_picker_date(self.date)
    }

    pub fn picker_index(&self) -> usize {
        datetime::slot_index_of(self.time)
    }

    /// The moment the platform will actually publish at.
    pub fn effective(&self) -> NaiveDateTime {
        self.date.and_time(datetime::slot_start(self.time))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub schedule: Option<PublishSlot>,
}

impl VideoMetadata {
    fn from_raw(raw: RawMetadata, video_path: &Path) -> Result<Self> {
        let mut title = raw.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            title = video_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            warn!("The video title was not found in a metadata file");
            warn!("The video title was set to {}", title);
        }
        let description = raw.description.unwrap_or_default();
        if description.is_empty() {
            warn!("The video description was not found in a metadata file");
        }

        let tags = raw
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let schedule = match raw.schedule.unwrap_or_default().as_slice() {
            [] => None,
            [date, time] => Some(PublishSlot::parse(date, time).context("Invalid schedule")?),
            other => bail!(
                "Schedule must be a [date, time] pair, got {} value(s)",
                other.len()
            ),
        };

        Ok(Self {
            title,
            description,
            tags,
            schedule,
        })
    }

    /// Tags as typed into the tag field.
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}

/// Load metadata for `video_path`. Without a metadata file every field takes
/// its default.
pub fn load_metadata(metadata_path: Option<&Path>, video_path: &Path) -> Result<VideoMetadata> {
    let raw = match metadata_path {
        None => RawMetadata::default(),
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
            parse_raw(&body).with_context(|| format!("Malformed metadata file {}", path.display()))?
        }
    };
    VideoMetadata::from_raw(raw, video_path)
}

fn parse_raw(body: &str) -> Result<RawMetadata> {
    Ok(serde_json::from_str(body)?)
}
