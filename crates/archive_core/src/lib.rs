//! Archive viewer core: pure state machine and view-model helpers.
mod admin;
mod effect;
pub mod highlight;
mod model;
mod monitor;
pub mod pagination;
mod query;
mod reconcile;
mod search;
mod msg;
mod state;
mod update;
mod view_model;

pub use admin::{AdminState, Catalog, CatalogCycle, CatalogOutcome};
pub use effect::{Effect, JobAction, Notification, NotificationLevel};
pub use highlight::{HighlightedText, TextSegment};
pub use model::{
    ArchiveFile, JobInfo, JobState, Message, SearchRequest, SearchResult, SiteId, Source,
    BROKEN_MEDIA, MATCH_ALL_QUERY, PAGE_SIZE, TOTAL_CAP,
};
pub use monitor::{JobMonitor, MonitorPhase, TimerCommand, TimerToken, DEFAULT_POLL_INTERVAL};
pub use msg::Msg;
pub use query::{Generation, QueryState, QueryStateStore, SortMode, StateChange};
pub use reconcile::{reconcile, ReconciledRow, SourceRef};
pub use search::{SearchController, SearchOutcome};
pub use state::{AppState, Screen};
pub use update::update;
pub use view_model::{
    format_size, AdminViewModel, AppViewModel, ArchiveRowView, BrowseViewModel, MediaKind,
    MediaView, MessageView, ResultCount, RowStatus, SiteOption, SortOptionView,
};
