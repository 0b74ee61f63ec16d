//! DetectionEvent - event source output, capture handler input
//!
//! One parsed CCTV alert: what fired, on which cameras, and when.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera channel number as printed by the DVR (`Camera 01` -> 1)
pub type CameraId = u32;

/// Kind of detection reported by the DVR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LineCrossing,
    Motion,
    Intrusion,
    Misc,
}

impl EventType {
    /// All variants, in declaration order
    pub const ALL: [EventType; 4] = [
        EventType::LineCrossing,
        EventType::Motion,
        EventType::Intrusion,
        EventType::Misc,
    ];

    /// Label used for this event type in alert emails
    pub fn alert_label(&self) -> &'static str {
        match self {
            EventType::LineCrossing => "line crossing",
            EventType::Motion => "Motion Detected",
            EventType::Intrusion => "intrusion",
            EventType::Misc => "misc",
        }
    }

    /// Look up an event type by its alert email label (exact match)
    pub fn from_alert_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.alert_label() == label)
    }

    /// Lower-case name used in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LineCrossing => "line_crossing",
            EventType::Motion => "motion",
            EventType::Intrusion => "intrusion",
            EventType::Misc => "misc",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detection alert
///
/// Immutable once created. Handlers receive it by reference and the
/// dispatcher never mutates it between retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// What the DVR detected
    pub event_type: EventType,

    /// Cameras involved, in the order the alert lists them (may be empty)
    pub camera_ids: Vec<CameraId>,

    /// DVR wall-clock time of the detection
    pub occurred_at: NaiveDateTime,
}

impl DetectionEvent {
    /// Create a new detection event
    pub fn new(event_type: EventType, camera_ids: Vec<CameraId>, occurred_at: NaiveDateTime) -> Self {
        Self {
            event_type,
            camera_ids,
            occurred_at,
        }
    }

    /// Camera ids joined with `-` (e.g. `1-2`), for logs and file names
    pub fn camera_label(&self) -> String {
        self.camera_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for DetectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@[{}] {}",
            self.event_type,
            self.camera_label(),
            self.occurred_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
