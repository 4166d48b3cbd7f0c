use crate::{
    janitor::{Outcome, PassReport},
    unit::{LastError, Tick, UnitStats},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub root: String,
    pub running: bool,
    pub passes: u64,
    pub skipped: u64,
    pub dropped_total: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_outcome: Option<Outcome>,
    pub last_error: Option<LastError>,
    pub next_run: Option<DateTime<Utc>>,
}

impl UnitStatus {
    pub fn new(
        root: &Path,
        running: bool,
        stats: UnitStats,
        next_run: Option<DateTime<Utc>>,
    ) -> Self {
        UnitStatus {
            root: root.display().to_string(),
            running,
            passes: stats.passes,
            skipped: stats.skipped,
            dropped_total: stats.dropped_total,
            last_run: stats.last_run,
            last_outcome: stats.last_outcome,
            last_error: stats.last_error,
            next_run,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanerStatus {
    pub version: String,
    pub started_at: Option<DateTime<Utc>>,
    pub units: Vec<UnitStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scheduled {
    pub root: String,
    // skipped / completed / failed
    pub result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Scheduled {
    pub fn new(root: &Path, tick: Tick) -> Self {
        let mut scheduled = Scheduled {
            root: root.display().to_string(),
            result: "skipped",
            outcome: None,
            dropped: None,
            kind: None,
            message: None,
        };
        match tick {
            Tick::Skipped => {}
            Tick::Completed(PassReport { outcome, dropped }) => {
                scheduled.result = "completed";
                scheduled.outcome = Some(outcome);
                scheduled.dropped = Some(dropped);
            }
            Tick::Failed(e) => {
                scheduled.result = "failed";
                scheduled.kind = Some(e.kind());
                scheduled.message = Some(e.to_string());
            }
        }

        scheduled
    }
}
