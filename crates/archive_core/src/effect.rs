use std::fmt;
use std::time::Duration;

use crate::admin::CatalogCycle;
use crate::model::SearchRequest;
use crate::monitor::{TimerCommand, TimerToken};
use crate::query::Generation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load the source list for the session.
    FetchSites,
    Search {
        generation: Generation,
        request: SearchRequest,
    },
    /// Mirror the query state to its shareable representation.
    PublishLocation(String),
    /// Load sources and archives together for one admin refresh cycle.
    FetchCatalog { cycle: CatalogCycle },
    Reindex { file_name: String },
    Download { url: String, file_name: String },
    /// Arm the poll timer, replacing any timer still pending.
    ArmPollTimer { token: TimerToken, after: Duration },
    CancelPollTimer { token: TimerToken },
    Notify(Notification),
}

impl From<TimerCommand> for Effect {
    fn from(command: TimerCommand) -> Self {
        match command {
            TimerCommand::Arm { token, after } => Effect::ArmPollTimer { token, after },
            TimerCommand::Cancel { token } => Effect::CancelPollTimer { token },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub(crate) fn request_failed(detail: impl fmt::Display) -> Self {
        Self::error(format!("Request failed: {detail}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Reindex,
    Download,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobAction::Reindex => f.write_str("reindex"),
            JobAction::Download => f.write_str("download"),
        }
    }
}
