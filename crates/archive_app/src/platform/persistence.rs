use std::fs;
use std::path::Path;

use archive_engine::AtomicFileWriter;
use archive_logging::{archive_error, archive_info, archive_warn};
use chrono::Utc;
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".archive_viewer_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSession {
    /// The shareable `key=value&...` form of the last query state.
    location: String,
    #[serde(default)]
    saved_at: Option<String>,
}

/// Reads the saved location; a missing or unreadable file means no saved session.
pub(crate) fn load_location(state_dir: &Path) -> Option<String> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            archive_warn!("Failed to read saved session from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedSession>(&content) {
        Ok(session) => {
            archive_info!(
                "Restoring session {:?} saved at {}",
                session.location,
                session.saved_at.as_deref().unwrap_or("unknown time")
            );
            Some(session.location)
        }
        Err(err) => {
            archive_warn!("Failed to parse saved session from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_location(state_dir: &Path, location: &str) {
    let session = PersistedSession {
        location: location.to_string(),
        saved_at: Some(Utc::now().to_rfc3339()),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&session, pretty) {
        Ok(text) => text,
        Err(err) => {
            archive_error!("Failed to serialize session: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(state_dir);
    if let Err(err) = writer.write(STATE_FILENAME, &content) {
        archive_error!("Failed to save session to {:?}: {}", state_dir, err);
    }
}
