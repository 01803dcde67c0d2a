//! Operator-facing notices.
//!
//! Problems the operator has to act on (an unusable color table, a montage that would not
//! load, an amplifier that failed to start) are recorded here exactly once and shown by the
//! UI: every notice goes to the history window, and the newest warning or error is
//! additionally raised as a modal alert until acknowledged. Info notices never displace a
//! pending alert.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};
use egui::Color32;
use tracing::{error, info, warn};

use crate::error::MapError;

const MAX_NOTICES: usize = 200;

/// How urgent a notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Status change, nothing to do.
    Info,
    /// Something fell back to a default.
    Warning,
    /// A feature is unavailable.
    Error,
}

impl Severity {
    /// Color for GUI display.
    pub fn color(self) -> Color32 {
        match self {
            Severity::Error => Color32::from_rgb(255, 100, 100),
            Severity::Warning => Color32::from_rgb(255, 255, 100),
            Severity::Info => Color32::from_rgb(100, 200, 255),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// One recorded notice.
#[derive(Debug, Clone)]
pub struct Notice {
    /// When the notice was recorded.
    pub timestamp: DateTime<Local>,
    /// How urgent it is.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Full message, including the underlying error.
    pub detail: String,
}

/// Fixed-capacity history of notices plus the pending alert.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: VecDeque<Notice>,
    alert_pending: bool,
}

impl NoticeBoard {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notice. Warnings and errors raise the alert.
    pub fn push(&mut self, severity: Severity, title: impl Into<String>, detail: impl Into<String>) {
        let notice = Notice {
            timestamp: Local::now(),
            severity,
            title: title.into(),
            detail: detail.into(),
        };
        match severity {
            Severity::Error => error!(title = %notice.title, detail = %notice.detail, "Notice raised"),
            Severity::Warning => warn!(title = %notice.title, detail = %notice.detail, "Notice raised"),
            Severity::Info => info!(title = %notice.title, "Notice raised"),
        }

        if self.notices.len() >= MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
        if severity >= Severity::Warning {
            self.alert_pending = true;
        }
    }

    /// Record an info notice.
    pub fn info(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Info, title, detail);
    }

    /// Record a warning and raise the alert.
    pub fn warning(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Warning, title, detail);
    }

    /// Record an error and raise the alert.
    pub fn error(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Error, title, detail);
    }

    /// Record a crate error.
    ///
    /// Resource problems with a fallback are warnings; amplifier and configuration
    /// failures are errors. Both raise the alert.
    pub fn report(&mut self, title: impl Into<String>, err: &MapError) {
        let severity = match err {
            MapError::Amplifier(_) => Severity::Error,
            err if err.is_recoverable() => Severity::Warning,
            _ => Severity::Error,
        };
        self.push(severity, title, err.to_string());
    }

    /// History, oldest first.
    pub fn notices(&self) -> impl DoubleEndedIterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Most recent notice of any severity.
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Newest warning or error, if the operator has not dismissed it yet.
    pub fn pending_alert(&self) -> Option<&Notice> {
        if !self.alert_pending {
            return None;
        }
        self.notices
            .iter()
            .rev()
            .find(|n| n.severity >= Severity::Warning)
    }

    /// Dismiss the pending alert. The notice stays in the history.
    pub fn acknowledge(&mut self) {
        self.alert_pending = false;
    }

    /// Number of notices kept.
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Drop the history and any pending alert.
    pub fn clear(&mut self) {
        self.notices.clear();
        self.alert_pending = false;
    }
}
