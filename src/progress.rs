use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const JOURNAL_FILE: &str = "progress.jsonl";
pub const STATUS_FILE: &str = "current_status.json";

/// One line of the progress journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub scan_id: String,
    pub target: String,
    pub event_type: EventType,
    pub message: String,
    pub progress_percentage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    ScanStarted,
    ToolsMissing { tools: Vec<String> },
    StageStarted { index: usize, name: String },
    StageCompleted { index: usize, name: String },
    /// Stage exited zero but its artifact is empty or absent. Not fatal.
    ArtifactWarning { index: usize, path: String },
    StageFailed { index: usize, name: String, error: String },
    ScanCompleted,
    ScanFailed { error: String },
}

impl EventType {
    pub fn is_warning(&self) -> bool {
        matches!(self, EventType::ArtifactWarning { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventType::ToolsMissing { .. } | EventType::StageFailed { .. } | EventType::ScanFailed { .. }
        )
    }
}

/// Appends progress events to `progress.jsonl` and keeps `current_status.json`
/// pointing at the latest one.
#[derive(Clone)]
pub struct ProgressTracker {
    scan_id: String,
    target: String,
    journal_dir: PathBuf,
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressTracker {
    pub fn new(scan_id: String, target: String, journal_dir: PathBuf) -> Self {
        fs::create_dir_all(&journal_dir).ok();

        Self {
            scan_id,
            target,
            journal_dir,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    pub fn journal_path(&self) -> PathBuf {
        self.journal_dir.join(JOURNAL_FILE)
    }

    pub fn add_event(&self, event_type: EventType, message: String, progress: f32) {
        let event = ProgressEvent {
            timestamp: Utc::now(),
            scan_id: self.scan_id.clone(),
            target: self.target.clone(),
            event_type,
            message,
            progress_percentage: progress,
        };

        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }

        self.save_to_file(&event);
    }

    // Journal writes are best effort; a read-only cwd must not stop a run.
    fn save_to_file(&self, event: &ProgressEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.journal_path())
            {
                writeln!(file, "{}", json).ok();
            }
        }

        self.save_current_status();
    }

    fn save_current_status(&self) {
        let status_file = self.journal_dir.join(STATUS_FILE);

        if let Ok(events) = self.events.lock() {
            if let Some(event) = events.last() {
                let status = serde_json::json!({
                    "scan_id": self.scan_id,
                    "target": self.target,
                    "last_update": event.timestamp,
                    "progress": event.progress_percentage,
                    "current_message": event.message,
                    "event_type": event.event_type,
                    "total_events": events.len(),
                });

                if let Ok(json) = serde_json::to_string_pretty(&status) {
                    fs::write(&status_file, json).ok();
                }
            }
        }
    }

    pub fn scan_started(&self) {
        self.add_event(
            EventType::ScanStarted,
            format!("Starting reconnaissance on {}", self.target),
            0.0,
        );
    }

    pub fn tools_missing(&self, tools: &[String]) {
        self.add_event(
            EventType::ToolsMissing {
                tools: tools.to_vec(),
            },
            format!("Missing required tools: {}", tools.join(", ")),
            0.0,
        );
    }

    pub fn stage_started(&self, index: usize, name: &str, progress: f32) {
        self.add_event(
            EventType::StageStarted {
                index,
                name: name.to_string(),
            },
            format!("Running {}", name),
            progress,
        );
    }

    pub fn stage_completed(&self, index: usize, name: &str, progress: f32) {
        self.add_event(
            EventType::StageCompleted {
                index,
                name: name.to_string(),
            },
            format!("{} completed", name),
            progress,
        );
    }

    pub fn artifact_warning(&self, index: usize, path: &Path, progress: f32) {
        self.add_event(
            EventType::ArtifactWarning {
                index,
                path: path.display().to_string(),
            },
            format!("{} is empty or not created", path.display()),
            progress,
        );
    }

    pub fn stage_failed(&self, index: usize, name: &str, error: &str, progress: f32) {
        self.add_event(
            EventType::StageFailed {
                index,
                name: name.to_string(),
                error: error.to_string(),
            },
            format!("{} failed: {}", name, error),
            progress,
        );
    }

    pub fn scan_completed(&self) {
        self.add_event(
            EventType::ScanCompleted,
            format!("Recon of {} complete", self.target),
            100.0,
        );
    }

    pub fn scan_failed(&self, error: &str) {
        let progress = self
            .events
            .lock()
            .ok()
            .and_then(|events| events.last().map(|e| e.progress_percentage))
            .unwrap_or(0.0);
        self.add_event(
            EventType::ScanFailed {
                error: error.to_string(),
            },
            format!("Scan failed: {}", error),
            progress,
        );
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn read_events_from_file(progress_file: &Path) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        if let Ok(content) = fs::read_to_string(progress_file) {
            for line in content.lines() {
                if let Ok(event) = serde_json::from_str::<ProgressEvent>(line) {
                    events.push(event);
                }
            }
        }

        events
    }
}
