//! Alert email body parser
//!
//! The DVR sends plain-text bodies of the form:
//!
//! ```text
//! EVENT TYPE:       Motion Detected
//! EVENT TIME:       2022-01-15,19:30:57
//! DVR NAME:         Embedded Net DVR
//! CAMERA NAME(NUM): Camera 01(D1)
//! ```

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::warn;

use contracts::{CameraId, DetectionEvent, EventType};

use crate::error::MessageParseError;

const EVENT_TIME_FORMAT: &str = "%Y-%m-%d,%H:%M:%S";

static EVENT_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"EVENT TYPE:\s+([\w ]+)").expect("event type pattern"));

static CAMERA_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CAMERA NAME\(NUM\):\s+(.+)").expect("camera line pattern"));

static CAMERA_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Camera (\d\d)").expect("camera id pattern"));

static EVENT_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"EVENT TIME:\s+(\d{4}-\d{2}-\d{2},\d{2}:\d{2}:\d{2})").expect("event time pattern")
});

/// Parse a detection event out of an alert email body
///
/// An unrecognised event type label is not an error: it is logged and
/// mapped to [`EventType::Misc`].
pub fn parse_message(text: &str) -> Result<DetectionEvent, MessageParseError> {
    let event_type = event_type(text)?;
    let camera_ids = camera_ids(text)?;
    let occurred_at = event_time(text)?;

    Ok(DetectionEvent::new(event_type, camera_ids, occurred_at))
}

fn event_type(text: &str) -> Result<EventType, MessageParseError> {
    let raw = EVENT_TYPE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or(MessageParseError::EventType)?;

    Ok(EventType::from_alert_label(raw).unwrap_or_else(|| {
        warn!(label = raw, "Could not determine the event type '{raw}'");
        EventType::Misc
    }))
}

fn camera_ids(text: &str) -> Result<Vec<CameraId>, MessageParseError> {
    let line = CAMERA_LINE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(MessageParseError::CameraIds)?;

    let ids: Vec<CameraId> = CAMERA_ID_RE
        .captures_iter(line.as_str())
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect();

    if ids.is_empty() {
        return Err(MessageParseError::CameraIds);
    }
    Ok(ids)
}

fn event_time(text: &str) -> Result<NaiveDateTime, MessageParseError> {
    let raw = EVENT_TIME_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(MessageParseError::DateTime)?;

    NaiveDateTime::parse_from_str(raw.as_str(), EVENT_TIME_FORMAT)
        .map_err(|_| MessageParseError::DateTime)
}
