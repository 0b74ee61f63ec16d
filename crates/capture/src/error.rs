//! Capture error types

use std::time::Duration;

use contracts::CameraId;
use thiserror::Error;

/// Why a single camera capture failed
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Clip directory could not be created
    #[error("failed to prepare clip directory '{path}': {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// ffmpeg could not be started
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// ffmpeg ran but reported failure
    #[error("capture of camera {camera_id} exited with {status}: {stderr}")]
    Exit {
        camera_id: CameraId,
        status: String,
        stderr: String,
    },

    /// ffmpeg did not finish in time and was killed
    #[error("capture of camera {camera_id} timed out after {after:?}")]
    Timeout { camera_id: CameraId, after: Duration },
}

/// Result alias
pub type Result<T> = std::result::Result<T, CaptureError>;
