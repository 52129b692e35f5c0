//! Wire-level data model shared by the core state machine and the engine.
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::query::SortMode;

/// Number of messages per result page.
pub const PAGE_SIZE: u64 = 10;

/// The backend caps `total` at this value; it means "at least this many".
pub const TOTAL_CAP: u64 = 10_000;

/// Query text sent when no free-text query is active.
pub const MATCH_ALL_QUERY: &str = "*";

/// Media path the indexer stores when the archive lacks the referenced file.
pub const BROKEN_MEDIA: &str = "broken";

/// Identifier of a message origin.
///
/// The backend keys sources by document id, so the wire carries either an
/// integer or a decimal string. Both decode to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl<'de> Deserialize<'de> for SiteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(SiteId(value)),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(SiteId)
                .map_err(|_| D::Error::custom(format!("invalid site id {text:?}"))),
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A configured message origin and the archive file it was indexed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SiteId,
    pub name: String,
    pub file_name: String,
}

impl Source {
    /// Last path segment of `file_name`, which is how archives are named in storage.
    pub fn archive_name(&self) -> &str {
        basename(&self.file_name)
    }
}

pub(crate) fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    #[serde(alias = "finished")]
    Done,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Progress of the background job that last touched an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub state: JobState,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A physical file known to the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveFile {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub info: Option<JobInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    pub site_id: SiteId,
    pub date: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub highlight: Option<Vec<String>>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub total: u64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub site_id: Option<SiteId>,
    pub sort: SortMode,
    pub query: String,
    pub skip: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_id_accepts_integer_and_string() {
        let from_int: SiteId = serde_json::from_str("42").unwrap();
        let from_text: SiteId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_int, SiteId(42));
        assert_eq!(from_text, SiteId(42));
        assert!(serde_json::from_str::<SiteId>("\"abc\"").is_err());
    }

    #[test]
    fn job_state_tolerates_finished_and_unknown_values() {
        let info: JobInfo =
            serde_json::from_str(r#"{"state":"finished","processed":5,"total":5}"#).unwrap();
        assert_eq!(info.state, JobState::Done);
        let info: JobInfo = serde_json::from_str(r#"{"state":"queued"}"#).unwrap();
        assert_eq!(info.state, JobState::Unknown);
        assert_eq!(info.processed, 0);
        assert_eq!(info.total, None);
    }

    #[test]
    fn archive_name_strips_directories() {
        let source = Source {
            id: SiteId(1),
            name: "news".to_string(),
            file_name: "/data/archives/news.zip".to_string(),
        };
        assert_eq!(source.archive_name(), "news.zip");
        assert_eq!(basename("plain.zip"), "plain.zip");
        assert_eq!(basename(r"C:\dumps\win.zip"), "win.zip");
    }

    #[test]
    fn search_request_omits_missing_site() {
        let request = SearchRequest {
            site_id: None,
            sort: SortMode::Date,
            query: MATCH_ALL_QUERY.to_string(),
            skip: 0,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"sort":"date","query":"*","skip":0}"#);
    }

    #[test]
    fn message_decodes_with_null_media_fields() {
        let raw = r#"{"site_id":"7","date":"2022-03-01T10:00:00","text":"hi",
            "duration_seconds":null,"width":null,"links":["https://t.me/x"]}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(message.site_id, SiteId(7));
        assert_eq!(message.links.as_deref(), Some(&["https://t.me/x".to_string()][..]));
        assert_eq!(message.duration_seconds, None);
    }
}
