//! ffmpeg-backed capture handler

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, instrument, warn};

use contracts::{CameraId, CaptureHandler, DetectionEvent, NotifierConfig, StreamCaptureConfig};

use crate::error::{CaptureError, Result};
use crate::output::{clip_path, ensure_clip_dir};
use crate::rtsp::{redact, rtsp_url, DvrEndpoint};

/// Stderr tail kept in error messages
const STDERR_TAIL: usize = 512;

/// How clips are recorded
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Root directory for clips
    pub storage: PathBuf,
    /// Recorded length per camera
    pub clip_length: Duration,
    /// Time allowed beyond `clip_length` before ffmpeg is killed
    pub grace: Duration,
    /// ffmpeg executable
    pub ffmpeg_path: String,
}

impl CaptureSettings {
    pub fn from_config(config: &StreamCaptureConfig) -> Self {
        Self {
            storage: PathBuf::from(&config.storage_location),
            clip_length: Duration::from_secs(config.detection_clip_length_secs),
            grace: Duration::from_secs(config.capture_grace_secs),
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }

    fn deadline(&self) -> Duration {
        self.clip_length.saturating_add(self.grace)
    }
}

/// Records one clip per camera of an event by running ffmpeg
///
/// Cameras are captured one after another; the handler reports success
/// only when every camera's clip was written. Output files are overwritten,
/// so a retried event replaces any partial clip from an earlier attempt.
#[derive(Debug, Clone)]
pub struct FfmpegCaptureHandler {
    endpoint: DvrEndpoint,
    settings: CaptureSettings,
}

impl FfmpegCaptureHandler {
    pub fn new(endpoint: DvrEndpoint, settings: CaptureSettings) -> Self {
        Self { endpoint, settings }
    }

    /// Build from the notifier configuration and the resolved DVR password
    pub fn from_config(config: &NotifierConfig, dvr_password: impl Into<String>) -> Self {
        Self::new(
            DvrEndpoint::from_config(&config.dvr, dvr_password),
            CaptureSettings::from_config(&config.stream_capture),
        )
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Capture a single camera of `event`, returning the written clip path
    #[instrument(name = "capture_camera", skip(self, event), fields(event = %event))]
    pub async fn capture_camera(
        &self,
        event: &DetectionEvent,
        camera_id: CameraId,
    ) -> Result<PathBuf> {
        let url = rtsp_url(&self.endpoint, event, camera_id, self.settings.clip_length);
        let output = clip_path(&self.settings.storage, event, camera_id);
        ensure_clip_dir(&output).await?;

        info!(
            source = %redact(&url),
            output = %output.display(),
            "Recording clip"
        );

        let mut child = Command::new(&self.settings.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-rtsp_transport", "tcp", "-i"])
            .arg(&url)
            .arg("-t")
            .arg(self.settings.clip_length.as_secs().to_string())
            .args(["-c", "copy", "-y"])
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: self.settings.ffmpeg_path.clone(),
                source,
            })?;

        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text).await;
                text
            })
        });

        let deadline = self.settings.deadline();
        let status = match tokio::time::timeout(deadline, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                reap(&mut child).await;
                return Err(CaptureError::Spawn {
                    program: self.settings.ffmpeg_path.clone(),
                    source: e,
                });
            }
            Err(_) => {
                reap(&mut child).await;
                return Err(CaptureError::Timeout {
                    camera_id,
                    after: deadline,
                });
            }
        };

        if !status.success() {
            let stderr = match stderr {
                Some(reader) => reader.await.unwrap_or_default(),
                None => String::new(),
            };
            return Err(CaptureError::Exit {
                camera_id,
                status: status.to_string(),
                stderr: tail(stderr.trim(), STDERR_TAIL).to_string(),
            });
        }

        debug!(output = %output.display(), "Clip written");
        Ok(output)
    }
}

/// Kill the child if still running and wait for it to exit
async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Capture process already gone");
    }
}

/// Last `max_chars` characters of `text`
fn tail(text: &str, max_chars: usize) -> &str {
    let start = text
        .char_indices()
        .rev()
        .nth(max_chars.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    &text[start..]
}

impl CaptureHandler for FfmpegCaptureHandler {
    async fn handle(&self, event: &DetectionEvent) -> bool {
        if event.camera_ids.is_empty() {
            warn!(event = %event, "Event has no cameras, nothing to capture");
            return true;
        }

        let mut all_captured = true;
        for camera_id in &event.camera_ids {
            if let Err(e) = self.capture_camera(event, *camera_id).await {
                warn!(event = %event, camera_id, error = %e, "Capture failed");
                all_captured = false;
            }
        }
        all_captured
    }
}
