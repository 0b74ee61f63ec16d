//! # Capture
//!
//! Clip capture for detection events.
//!
//! Responsibilities:
//! - Build DVR playback RTSP URLs for an event's cameras
//! - Lay out clip files by month under the storage location
//! - Record clips with ffmpeg as a `CaptureHandler`

pub mod error;
pub mod ffmpeg;
pub mod output;
pub mod rtsp;

pub use contracts::{CaptureHandler, DetectionEvent};
pub use error::{CaptureError, Result};
pub use ffmpeg::{CaptureSettings, FfmpegCaptureHandler};
pub use output::{clip_path, ensure_clip_dir};
pub use rtsp::{capture_uris, redact, rtsp_url, DvrEndpoint};
