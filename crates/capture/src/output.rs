//! Clip file layout
//!
//! Clips are grouped by month: `{storage}/{YYYY}-{MM}/{DD-HH_MM_SS}__{type}_{camera}.mkv`.

use std::path::{Path, PathBuf};

use chrono::Datelike;

use contracts::{CameraId, DetectionEvent};

use crate::error::{CaptureError, Result};

/// Output file for one camera of an event
pub fn clip_path(storage: &Path, event: &DetectionEvent, camera_id: CameraId) -> PathBuf {
    let at = event.occurred_at;
    let month_dir = format!("{}-{:02}", at.year(), at.month());
    let file_name = format!(
        "{}__{}_{}.mkv",
        at.format("%d-%H_%M_%S"),
        event.event_type.as_str(),
        camera_id
    );
    storage.join(month_dir).join(file_name)
}

/// Create the directory `clip` will be written into
pub async fn ensure_clip_dir(clip: &Path) -> Result<()> {
    let Some(dir) = clip.parent() else {
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| CaptureError::OutputDir {
            path: dir.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::EventType;

    fn event(event_type: EventType) -> DetectionEvent {
        DetectionEvent::new(
            event_type,
            vec![1, 2],
            NaiveDate::from_ymd_opt(2022, 1, 5)
                .unwrap()
                .and_hms_opt(9, 7, 3)
                .unwrap(),
        )
    }

    #[test]
    fn test_clip_path_layout() {
        let path = clip_path(Path::new("/srv/cctv"), &event(EventType::LineCrossing), 2);
        assert_eq!(
            path,
            PathBuf::from("/srv/cctv/2022-01/05-09_07_03__line_crossing_2.mkv")
        );
    }

    #[test]
    fn test_clip_path_per_camera() {
        let a = clip_path(Path::new("clips"), &event(EventType::Motion), 1);
        let b = clip_path(Path::new("clips"), &event(EventType::Motion), 2);
        assert_ne!(a, b);
        assert_eq!(a.parent(), b.parent());
    }

    #[tokio::test]
    async fn test_ensure_clip_dir_creates_month_dir() {
        let storage = tempfile::tempdir().unwrap();
        let path = clip_path(storage.path(), &event(EventType::Intrusion), 1);

        ensure_clip_dir(&path).await.unwrap();
        ensure_clip_dir(&path).await.unwrap();
        assert!(storage.path().join("2022-01").is_dir());
    }
}
