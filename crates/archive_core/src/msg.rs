use crate::admin::{Catalog, CatalogCycle};
use crate::effect::JobAction;
use crate::model::{SearchResult, SiteId, Source};
use crate::monitor::TimerToken;
use crate::query::{Generation, SortMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Session start, optionally restoring a saved or bookmarked location.
    Started { location: Option<String> },
    /// User picked a source, or `None` for all sources.
    SiteSelected(Option<SiteId>),
    /// User submitted the search box.
    QuerySubmitted(String),
    /// User cleared the search box.
    QueryCleared,
    SortSelected(SortMode),
    /// User asked for the page of newer messages.
    NewerClicked,
    /// User asked for the page of older messages.
    OlderClicked,
    /// User navigated to a shareable location.
    LocationRestored(String),
    /// Engine returned the source list.
    SitesLoaded(Result<Vec<Source>, String>),
    /// Engine completed a search issued for `generation`.
    SearchCompleted {
        generation: Generation,
        result: Result<SearchResult, String>,
    },
    AdminOpened,
    BrowseOpened,
    /// Engine completed an admin catalog refresh.
    CatalogLoaded {
        cycle: CatalogCycle,
        result: Result<Catalog, String>,
    },
    ReindexClicked { file_name: String },
    DownloadRequested { url: String, file_name: String },
    /// Engine got an answer for a reindex or download request.
    JobRequestFinished {
        action: JobAction,
        file_name: String,
        result: Result<(), String>,
    },
    PollTimerFired { token: TimerToken },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
