//! Conversion Event Logger
//!
//! One structured record per converted item, written through `tracing` under
//! the `conversion_events` target so it lands in the NDJSON file log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use texspeak_core::Stage;
use tracing::info;

pub const EVENT_TARGET: &str = "conversion_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionEvent {
    Converted {
        index: usize,
        display_mode: bool,
        description_chars: usize,
    },
    Failed {
        index: usize,
        stage: Stage,
        error: String,
    },
}

impl ConversionEvent {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Converted { .. } => None,
            Self::Failed { stage, .. } => Some(*stage),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversionLogEntry {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ConversionEvent,
}

pub struct ConversionEventLogger;

impl ConversionEventLogger {
    pub fn entry(run_id: &str, event: ConversionEvent) -> ConversionLogEntry {
        ConversionLogEntry {
            run_id: run_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(run_id: &str, event: ConversionEvent) {
        let entry = Self::entry(run_id, event);
        let outcome = match entry.event.stage() {
            None => "converted",
            Some(stage) => stage.as_str(),
        };
        info!(target: EVENT_TARGET, outcome, event = ?entry, "Conversion event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_events_serialize_with_stage() {
        let entry = ConversionEventLogger::entry(
            "run-1",
            ConversionEvent::Failed {
                index: 2,
                stage: Stage::Parse,
                error: "unbalanced group".into(),
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["event"]["type"], "failed");
        assert_eq!(json["event"]["stage"], "parse");
        assert_eq!(json["event"]["index"], 2);
    }

    #[test]
    fn converted_events_have_no_stage() {
        let event = ConversionEvent::Converted {
            index: 0,
            display_mode: true,
            description_chars: 12,
        };
        assert_eq!(event.stage(), None);
        ConversionEventLogger::log_event("run-2", event);
    }
}
