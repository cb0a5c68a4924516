use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Published,
    Scheduled,
    Rejected,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Scheduled => "scheduled",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "pending" => Self::Pending,
            "published" => Self::Published,
            "scheduled" => Self::Scheduled,
            "rejected" => Self::Rejected,
            "failed" => Self::Failed,
            other => bail!("Unknown upload status '{}'", other),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: i64,
    pub video_path: String,
    pub title: String,
    pub status: UploadStatus,
    pub video_id: Option<String>,
    pub scheduled_for: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}

pub fn insert_upload(
    conn: &Connection,
    video_path: &str,
    title: &str,
    scheduled_for: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO uploads (video_path, title, status, scheduled_for) VALUES (?1, ?2, ?3, ?4)",
        params![video_path, title, UploadStatus::Pending.as_str(), scheduled_for],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_upload(
    conn: &Connection,
    id: i64,
    status: UploadStatus,
    video_id: Option<&str>,
    error_message: Option<&str>,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE uploads SET status = ?1, video_id = ?2, error_message = ?3, finished_at = datetime('now') WHERE id = ?4",
        params![status.as_str(), video_id, error_message, id],
    )?;
    if changed == 0 {
        bail!("Upload record {} does not exist", id);
    }
    Ok(())
}

pub fn get_recent_uploads(conn: &Connection, limit: usize) -> Result<Vec<UploadRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, video_path, title, status, video_id, scheduled_for, error_message, created_at FROM uploads ORDER BY id DESC LIMIT ?1"
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, video_path, title, status, video_id, scheduled_for, error_message, created_at)| {
                Ok(UploadRecord {
                    id,
                    video_path,
                    title,
                    status: UploadStatus::parse(&status)?,
                    video_id,
                    scheduled_for,
                    error_message,
                    created_at,
                })
            },
        )
        .collect()
}
