use crate::admin::AdminState;
use crate::highlight::{render_highlighted, HighlightedText};
use crate::model::{JobState, Message, SiteId, Source, BROKEN_MEDIA, TOTAL_CAP};
use crate::monitor::MonitorPhase;
use crate::pagination;
use crate::query::{QueryState, SortMode};
use crate::reconcile::ReconciledRow;
use crate::search::SearchController;
use crate::state::Screen;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub screen: Screen,
    pub browse: BrowseViewModel,
    pub admin: AdminViewModel,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BrowseViewModel {
    /// The source list has not arrived yet.
    pub loading: bool,
    pub sites: Vec<SiteOption>,
    pub selected_site: Option<String>,
    pub query: Option<String>,
    pub sort_options: Vec<SortOptionView>,
    pub result_count: ResultCount,
    pub searching: bool,
    pub page: u64,
    pub can_go_newer: bool,
    pub can_go_older: bool,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOption {
    pub id: SiteId,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptionView {
    pub mode: SortMode,
    pub label: &'static str,
    pub enabled: bool,
    pub selected: bool,
}

/// How many results the backend reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultCount {
    #[default]
    Nothing,
    Exact(u64),
    /// The backend hit its cap; the real count is at least this.
    MoreThan(u64),
}

impl ResultCount {
    pub fn from_total(total: u64) -> Self {
        match total {
            0 => ResultCount::Nothing,
            t if t >= TOTAL_CAP => ResultCount::MoreThan(TOTAL_CAP),
            t => ResultCount::Exact(t),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ResultCount::Nothing => "nothing found".to_string(),
            ResultCount::Exact(n) => format!("found: {n}"),
            ResultCount::MoreThan(n) => format!("more than {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub site_name: Option<String>,
    pub date: String,
    pub text: HighlightedText,
    pub media: Vec<MediaView>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Thumbnail,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaView {
    pub kind: MediaKind,
    /// Path inside the archive; `None` when the archive lacks the object.
    pub path: Option<String>,
    /// Full file a thumbnail links to.
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminViewModel {
    /// No catalog has been reconciled yet.
    pub loading: bool,
    pub refreshing: bool,
    pub polling: bool,
    pub rows: Vec<ArchiveRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRowView {
    pub file_name: String,
    pub source_name: Option<String>,
    pub size_label: String,
    pub status: RowStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    /// Source-backed row whose archive is not in storage.
    ArchiveMissing,
    /// Archive in storage that no source refers to and no job touched.
    NeverIndexed,
    /// Source-backed row with its archive present and no job reported.
    Indexed,
    Running { processed: u64, total: Option<u64> },
    Done,
    Failed { error: Option<String> },
    Unknown,
}

impl RowStatus {
    pub fn of(row: &ReconciledRow) -> Self {
        match (&row.info, &row.source, row.size) {
            (Some(info), _, _) => match info.state {
                JobState::Running => RowStatus::Running {
                    processed: info.processed,
                    total: info.total,
                },
                JobState::Done => RowStatus::Done,
                JobState::Failed => RowStatus::Failed {
                    error: info.error.clone(),
                },
                JobState::Unknown => RowStatus::Unknown,
            },
            (None, Some(_), None) => RowStatus::ArchiveMissing,
            (None, Some(_), Some(_)) => RowStatus::Indexed,
            (None, None, _) => RowStatus::NeverIndexed,
        }
    }

    pub fn label(&self) -> String {
        match self {
            RowStatus::ArchiveMissing => "archive missing".to_string(),
            RowStatus::NeverIndexed => "never indexed".to_string(),
            RowStatus::Indexed => "indexed".to_string(),
            RowStatus::Running { processed, total } => match total {
                Some(total) => format!("running {processed}/{total}"),
                None => format!("running {processed}/?"),
            },
            RowStatus::Done => "done".to_string(),
            RowStatus::Failed { error: Some(error) } => {
                let last_line = error.lines().last().unwrap_or(error).trim();
                format!("failed: {last_line}")
            }
            RowStatus::Failed { error: None } => "failed".to_string(),
            RowStatus::Unknown => "unknown".to_string(),
        }
    }
}

pub(crate) fn browse_view(
    sites: Option<&[Source]>,
    query: &QueryState,
    search: &SearchController,
) -> BrowseViewModel {
    let results = search.results();
    let total = search.known_total().unwrap_or(0);
    let bounds = pagination::bounds(query.skip, total);
    let all_sites = sites.unwrap_or_default();
    let selected = query
        .site_id
        .and_then(|id| all_sites.iter().find(|site| site.id == id));

    let sort_options = [
        (SortMode::Date, "chronological"),
        (SortMode::Relevance, "most relevant"),
    ]
    .into_iter()
    .map(|(mode, label)| SortOptionView {
        mode,
        label,
        enabled: sort_enabled(mode, query, total),
        selected: query.sort == mode,
    })
    .collect();

    BrowseViewModel {
        loading: sites.is_none(),
        sites: all_sites
            .iter()
            .map(|site| SiteOption {
                id: site.id,
                name: site.name.clone(),
                selected: Some(site.id) == query.site_id,
            })
            .collect(),
        selected_site: selected.map(|site| site.name.clone()),
        query: query.query.clone(),
        sort_options,
        result_count: ResultCount::from_total(total),
        searching: search.is_searching(),
        page: pagination::page_number(query.skip),
        can_go_newer: bounds.can_go_newer,
        can_go_older: bounds.can_go_older,
        messages: results
            .messages
            .iter()
            .map(|message| message_view(message, selected, all_sites))
            .collect(),
    }
}

/// Sorting only makes sense over a non-empty result; relevance also needs a query.
pub(crate) fn sort_enabled(mode: SortMode, query: &QueryState, total: u64) -> bool {
    match mode {
        SortMode::Date => total > 0,
        SortMode::Relevance => total > 0 && query.query.is_some(),
    }
}

fn message_view(message: &Message, selected: Option<&Source>, sites: &[Source]) -> MessageView {
    let site_name = selected
        .or_else(|| sites.iter().find(|site| site.id == message.site_id))
        .map(|site| site.name.clone());

    let mut media = Vec::new();
    if let Some(photo) = &message.photo {
        media.push(media_view(MediaKind::Photo, photo, None));
    }
    if let Some(thumbnail) = &message.thumbnail {
        media.push(media_view(MediaKind::Thumbnail, thumbnail, message.file.as_deref()));
    } else if let Some(file) = &message.file {
        media.push(media_view(MediaKind::File, file, None));
    }

    MessageView {
        site_name,
        date: message.date.clone(),
        text: render_highlighted(&message.text, message.highlight.as_deref()),
        media,
        links: message.links.clone().unwrap_or_default(),
    }
}

fn media_view(kind: MediaKind, path: &str, target: Option<&str>) -> MediaView {
    let available = |p: &str| (p != BROKEN_MEDIA).then(|| p.to_string());
    MediaView {
        kind,
        path: available(path),
        target: target.and_then(available),
    }
}

pub(crate) fn admin_view(admin: &AdminState) -> AdminViewModel {
    let rows = admin.rows();
    AdminViewModel {
        loading: rows.is_none(),
        refreshing: admin.is_refreshing(),
        polling: admin.monitor().phase() == MonitorPhase::Polling,
        rows: rows
            .unwrap_or_default()
            .iter()
            .map(|row| ArchiveRowView {
                file_name: row.file_name.clone(),
                source_name: row.source.as_ref().map(|source| source.name.clone()),
                size_label: row.size.map_or_else(|| "unknown".to_string(), format_size),
                status: RowStatus::of(row),
            })
            .collect(),
    }
}

/// Human-readable decimal size with three significant digits, e.g. `1.34 kB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1000 && exponent < UNITS.len() - 1 {
        scaled /= 1000;
        exponent += 1;
    }
    let mut value = bytes as f64 / 1000f64.powi(exponent as i32);
    let mut text = format_significant(value);
    // Values from 999.5 round up to "1000"; show them in the next unit.
    if text == "1000" && exponent < UNITS.len() - 1 {
        exponent += 1;
        value /= 1000.0;
        text = format_significant(value);
    }
    format!("{text} {}", UNITS[exponent])
}

fn format_significant(value: f64) -> String {
    let precision = match value {
        v if v < 10.0 => 2,
        v if v < 100.0 => 1,
        _ => 0,
    };
    let text = format!("{value:.precision$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobInfo;

    #[test]
    fn sizes_use_decimal_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1000), "1 kB");
        assert_eq!(format_size(1337), "1.34 kB");
        assert_eq!(format_size(52_428_800), "52.4 MB");
        assert_eq!(format_size(3_000_000_000), "3 GB");
        assert_eq!(format_size(999_499), "999 kB");
        assert_eq!(format_size(999_999), "1 MB");
        assert_eq!(format_size(999_500_000), "1 GB");
    }

    #[test]
    fn capped_total_is_reported_distinctly() {
        assert_eq!(ResultCount::from_total(0).label(), "nothing found");
        assert_eq!(ResultCount::from_total(42).label(), "found: 42");
        assert_eq!(
            ResultCount::from_total(TOTAL_CAP),
            ResultCount::MoreThan(TOTAL_CAP)
        );
        assert_eq!(ResultCount::from_total(TOTAL_CAP).label(), "more than 10000");
    }

    #[test]
    fn failed_status_shows_last_traceback_line() {
        let status = RowStatus::Failed {
            error: Some("Traceback:\n  File x\nKeyError: 'result.json'\n".to_string()),
        };
        assert_eq!(status.label(), "failed: KeyError: 'result.json'");
    }

    #[test]
    fn status_distinguishes_gaps() {
        let orphan = ReconciledRow {
            file_name: "x.zip".to_string(),
            source: None,
            size: Some(1),
            info: None,
        };
        assert_eq!(RowStatus::of(&orphan), RowStatus::NeverIndexed);

        let missing = ReconciledRow {
            source: Some(crate::reconcile::SourceRef {
                id: SiteId(1),
                name: "s".to_string(),
            }),
            size: None,
            ..orphan.clone()
        };
        assert_eq!(RowStatus::of(&missing), RowStatus::ArchiveMissing);

        let running = ReconciledRow {
            info: Some(JobInfo {
                state: JobState::Running,
                processed: 4,
                total: None,
                error: None,
            }),
            ..orphan
        };
        assert_eq!(RowStatus::of(&running).label(), "running 4/?");
    }

    #[test]
    fn broken_media_has_no_path() {
        let message = Message {
            thumbnail: Some(BROKEN_MEDIA.to_string()),
            file: Some("video_files/clip.mp4".to_string()),
            photo: Some("photos/p.jpg".to_string()),
            ..Message::default()
        };
        let view = message_view(&message, None, &[]);
        assert_eq!(view.media.len(), 2);
        assert_eq!(view.media[0].path.as_deref(), Some("photos/p.jpg"));
        assert_eq!(view.media[1].kind, MediaKind::Thumbnail);
        assert_eq!(view.media[1].path, None);
        assert_eq!(view.media[1].target.as_deref(), Some("video_files/clip.mp4"));
    }
}
