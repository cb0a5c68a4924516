use super::open_session;
use crate::config::AppConfig;
use crate::database::queries::{self, UploadStatus};
use crate::database::Database;
use crate::platforms::youtube::metadata::load_metadata;
use crate::platforms::youtube::upload::{upload, UploadOutcome, UploadRequest};
use anyhow::{bail, Result};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct UploadArgs {
    pub video: PathBuf,
    pub metadata: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub made_for_kids: bool,
}

impl UploadArgs {
    pub fn into_request(self) -> Result<UploadRequest> {
        if !self.video.is_file() {
            bail!("Video file not found: {}", self.video.display());
        }
        if let Some(thumbnail) = &self.thumbnail {
            if !thumbnail.is_file() {
                bail!("Thumbnail file not found: {}", thumbnail.display());
            }
        }
        let metadata = load_metadata(self.metadata.as_deref(), &self.video)?;
        Ok(UploadRequest {
            video_path: self.video,
            thumbnail_path: self.thumbnail,
            metadata,
            made_for_kids: self.made_for_kids,
        })
    }
}

/// Upload one video and record the attempt in the history database.
pub async fn run(config: &AppConfig, args: UploadArgs) -> Result<UploadOutcome> {
    let request = args.into_request()?;
    let db = Database::new(&config.data_dir)?;
    let scheduled_for = request
        .metadata
        .schedule
        .map(|slot| slot.effective().format("%Y-%m-%d %H:%M").to_string());
    let record_id = db.with_conn(|conn| {
        queries::insert_upload(
            conn,
            &request.video_path.display().to_string(),
            &request.metadata.title,
            scheduled_for.as_deref(),
        )
    })?;
    info!(
        "[upload] #{} {} ({})",
        record_id,
        request.metadata.title,
        request.video_path.display()
    );

    let result = match open_session(config).await {
        Ok(mut session) => upload(&mut session, &request).await,
        Err(e) => Err(e),
    };

    if let Err(e) = record_result(&db, record_id, &request, &result) {
        warn!("[upload] could not update history record #{}: {:#}", record_id, e);
    }
    result
}

/// History status for a finished upload.
pub fn status_for(request: &UploadRequest, outcome: &UploadOutcome) -> UploadStatus {
    if !outcome.success {
        UploadStatus::Rejected
    } else if request.metadata.schedule.is_some() {
        UploadStatus::Scheduled
    } else {
        UploadStatus::Published
    }
}

pub fn record_result(
    db: &Database,
    record_id: i64,
    request: &UploadRequest,
    result: &Result<UploadOutcome>,
) -> Result<()> {
    db.with_conn(|conn| match result {
        Ok(outcome) => queries::finish_upload(
            conn,
            record_id,
            status_for(request, outcome),
            outcome.video_id.as_deref(),
            None,
        ),
        Err(e) => queries::finish_upload(
            conn,
            record_id,
            UploadStatus::Failed,
            None,
            Some(&format!("{:#}", e)),
        ),
    })
}
