use crate::config::AppConfig;
use crate::database::queries::{self, UploadRecord};
use crate::database::Database;
use anyhow::Result;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

pub fn run(config: &AppConfig, limit: usize) -> Result<Vec<UploadRecord>> {
    let db = Database::new(&config.data_dir)?;
    db.with_conn(|conn| queries::get_recent_uploads(conn, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Pacing;
    use crate::database::queries::UploadStatus;

    #[test]
    fn lists_recorded_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::resolve(
            Some(dir.path().to_path_buf()),
            None,
            None,
            false,
            Pacing::default(),
        )
        .unwrap();
        assert!(run(&config, DEFAULT_HISTORY_LIMIT).unwrap().is_empty());

        let db = Database::new(&config.data_dir).unwrap();
        db.with_conn(|conn| {
            let id = queries::insert_upload(conn, "/v/clip.mp4", "clip", None)?;
            queries::finish_upload(conn, id, UploadStatus::Rejected, None, None)
        })
        .unwrap();
        drop(db);

        let records = run(&config, DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, UploadStatus::Rejected);
    }
}
