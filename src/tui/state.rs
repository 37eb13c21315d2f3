use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::fetch::{DataOrigin, LoadOutcome};
use crate::github::types::Project;

/// Where the listing pipeline currently stands, as the UI shows it.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncPhase {
    Syncing,
    Ready,
    Failed(String),
}

/// Snapshot published by the engine task over the watch channel. The
/// TUI clones it every frame, so it stays plain data.
#[derive(Debug, Clone)]
pub struct AppState {
    pub username: String,
    pub phase: SyncPhase,
    pub projects: Vec<Project>,
    pub origin: Option<DataOrigin>,
    pub warning: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
    /// Bumped whenever a new listing is published. The TUI watches it
    /// to restart the reveal animation and clamp the selection.
    pub sync_seq: u64,
    pub stagger_ms: u64,
    pub start_time: Instant,
    pub logs: VecDeque<LogEntry>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl AppState {
    pub fn new(username: &str, stagger_ms: u64) -> Self {
        Self {
            username: username.to_string(),
            phase: SyncPhase::Syncing,
            projects: Vec::new(),
            origin: None,
            warning: None,
            last_sync: None,
            sync_seq: 0,
            stagger_ms,
            start_time: Instant::now(),
            logs: VecDeque::with_capacity(200),
        }
    }

    pub fn begin_sync(&mut self) {
        self.phase = SyncPhase::Syncing;
        self.push_log("INFO", "sync started".to_string());
    }

    pub fn apply_outcome(&mut self, outcome: LoadOutcome) {
        let LoadOutcome {
            projects,
            origin,
            warning,
        } = outcome;
        self.push_log(
            "INFO",
            format!("{} projects ({})", projects.len(), origin.label()),
        );
        if let Some(w) = &warning {
            self.push_log("WARN", w.clone());
        }
        self.projects = projects;
        self.origin = Some(origin);
        self.warning = warning;
        self.phase = SyncPhase::Ready;
        self.last_sync = Some(Utc::now());
        self.sync_seq += 1;
    }

    pub fn apply_failure(&mut self, message: String) {
        self.push_log("ERROR", message.clone());
        self.phase = SyncPhase::Failed(message);
    }

    pub fn project_by_id(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= 200 {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}
