use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::handlers::sse::SseEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One human-readable status line of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressLine {
    pub run_id: Uuid,
    pub level: ProgressLevel,
    pub card_id: Option<i64>,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Append-only log of a run. Each line is traced, kept for the final report
/// and, when attached to a channel, pushed to live subscribers.
pub struct ProgressReporter {
    run_id: Uuid,
    sse_tx: Option<broadcast::Sender<String>>,
    lines: Vec<ProgressLine>,
}

impl ProgressReporter {
    pub fn new(run_id: Uuid, sse_tx: broadcast::Sender<String>) -> Self {
        Self {
            run_id,
            sse_tx: Some(sse_tx),
            lines: Vec::new(),
        }
    }

    pub fn detached(run_id: Uuid) -> Self {
        Self {
            run_id,
            sse_tx: None,
            lines: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn lines(&self) -> &[ProgressLine] {
        &self.lines
    }

    pub fn run_started(&mut self, total: usize) {
        self.publish(&SseEvent::RunStarted {
            run_id: self.run_id,
            total,
        });
        self.info(None, format!("Migration started: {total} card(s) selected"));
    }

    pub fn run_finished(&mut self, migrated: usize, total: usize, fatal: Option<&str>) {
        let message = format!("Migration finished: {migrated} of {total} card(s) migrated");
        if fatal.is_some() || migrated < total {
            self.warning(None, message);
        } else {
            self.success(None, message);
        }
        self.publish(&SseEvent::RunFinished {
            run_id: self.run_id,
            migrated,
            total,
            fatal: fatal.map(str::to_string),
        });
    }

    pub fn info(&mut self, card_id: Option<i64>, message: impl Into<String>) {
        self.push(ProgressLevel::Info, card_id, message.into());
    }

    pub fn success(&mut self, card_id: Option<i64>, message: impl Into<String>) {
        self.push(ProgressLevel::Success, card_id, message.into());
    }

    pub fn warning(&mut self, card_id: Option<i64>, message: impl Into<String>) {
        self.push(ProgressLevel::Warning, card_id, message.into());
    }

    pub fn error(&mut self, card_id: Option<i64>, message: impl Into<String>) {
        self.push(ProgressLevel::Error, card_id, message.into());
    }

    fn push(&mut self, level: ProgressLevel, card_id: Option<i64>, message: String) {
        let run_id = self.run_id.to_string();
        match level {
            ProgressLevel::Info | ProgressLevel::Success => {
                tracing::info!(run_id = run_id.as_str(), card_id, "{}", message)
            }
            ProgressLevel::Warning => {
                tracing::warn!(run_id = run_id.as_str(), card_id, "{}", message)
            }
            ProgressLevel::Error => {
                tracing::error!(run_id = run_id.as_str(), card_id, "{}", message)
            }
        }

        let line = ProgressLine {
            run_id: self.run_id,
            level,
            card_id,
            message,
            at: Utc::now(),
        };
        self.publish(&SseEvent::Progress { line: line.clone() });
        self.lines.push(line);
    }

    fn publish(&self, event: &SseEvent) {
        let Some(sse_tx) = &self.sse_tx else {
            return;
        };
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = sse_tx.send(payload);
        }
    }
}
