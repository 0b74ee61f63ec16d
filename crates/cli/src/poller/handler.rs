//! Capture handler selection.

use capture::FfmpegCaptureHandler;
use contracts::{CaptureHandler, DetectionEvent};
use tracing::info;

/// Handler the dispatcher runs for every event
pub enum NotifierHandler {
    /// Record clips with ffmpeg
    Ffmpeg(FfmpegCaptureHandler),
    /// Only log the event (`--no-capture`)
    LogOnly,
}

impl CaptureHandler for NotifierHandler {
    async fn handle(&self, event: &DetectionEvent) -> bool {
        match self {
            Self::Ffmpeg(handler) => handler.handle(event).await,
            Self::LogOnly => {
                info!(event = %event, "Capture disabled, event logged only");
                true
            }
        }
    }
}
