use std::collections::HashSet;

use crate::model::{basename, ArchiveFile, JobInfo, JobState, SiteId, Source};

/// The source a reconciled row is backed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub id: SiteId,
    pub name: String,
}

/// One row of the admin table: a source, an orphan archive, or both joined by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRow {
    /// The source's `file_name` as configured, or the archive name for orphans.
    pub file_name: String,
    pub source: Option<SourceRef>,
    /// Size of the matching archive; `None` when no archive matches.
    pub size: Option<u64>,
    pub info: Option<JobInfo>,
}

impl ReconciledRow {
    /// The storage-level name used in job requests and matching.
    pub fn archive_name(&self) -> &str {
        basename(&self.file_name)
    }

    pub fn is_running(&self) -> bool {
        self.info
            .as_ref()
            .is_some_and(|info| info.state == JobState::Running)
    }
}

/// Joins sources and archives by file name, preserving input order.
///
/// Source-backed rows come first in source order, followed by one row per
/// archive that no source refers to, in archive order. Nothing is sorted.
pub fn reconcile(sources: &[Source], archives: &[ArchiveFile]) -> Vec<ReconciledRow> {
    let mut matched: HashSet<&str> = HashSet::new();
    let mut rows = Vec::with_capacity(sources.len() + archives.len());

    for source in sources {
        let wanted = source.archive_name();
        let archive = archives.iter().find(|archive| archive.name == wanted);
        if archive.is_some() {
            matched.insert(wanted);
        }
        rows.push(ReconciledRow {
            file_name: source.file_name.clone(),
            source: Some(SourceRef {
                id: source.id,
                name: source.name.clone(),
            }),
            size: archive.map(|archive| archive.size),
            info: archive.and_then(|archive| archive.info.clone()),
        });
    }

    rows.extend(
        archives
            .iter()
            .filter(|archive| !matched.contains(archive.name.as_str()))
            .map(|archive| ReconciledRow {
                file_name: archive.name.clone(),
                source: None,
                size: Some(archive.size),
                info: archive.info.clone(),
            }),
    );
    rows
}
