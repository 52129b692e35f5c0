use std::fmt;
use std::io;

use archive_core::{
    Catalog, CatalogCycle, Generation, JobAction, SearchResult, Source, TimerToken,
};
use thiserror::Error;

/// Completions reported by the engine thread, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SitesFetched(Result<Vec<Source>, ApiError>),
    SearchCompleted {
        generation: Generation,
        result: Result<SearchResult, ApiError>,
    },
    CatalogFetched {
        cycle: CatalogCycle,
        result: Result<Catalog, ApiError>,
    },
    JobRequested {
        action: JobAction,
        file_name: String,
        result: Result<(), ApiError>,
    },
    TimerFired {
        token: TimerToken,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    /// The response body did not match the expected shape.
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// The engine could not be brought up.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine: {0}")]
    Startup(#[from] io::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
}
