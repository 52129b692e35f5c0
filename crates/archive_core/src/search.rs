use archive_logging::{archive_debug, archive_warn};

use crate::model::{SearchRequest, SearchResult};
use crate::query::{Generation, QueryState, StateChange};

/// What happened to a search response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response matched the current generation and replaced the results.
    Applied,
    /// A newer state version exists; the response was dropped.
    Stale,
    /// The current request failed; results are unchanged.
    Failed(String),
}

/// Issues one search per state version and accepts only the latest response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchController {
    current: Generation,
    awaiting: Option<Generation>,
    results: SearchResult,
    has_results: bool,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new state version and returns the request to issue for it.
    pub fn on_state_changed(&mut self, change: &StateChange, state: &QueryState) -> SearchRequest {
        self.current = change.generation;
        self.awaiting = Some(change.generation);
        if change.results_invalidated {
            self.results = SearchResult::default();
            self.has_results = false;
        }
        state.search_request()
    }

    pub fn on_response(
        &mut self,
        generation: Generation,
        result: Result<SearchResult, String>,
    ) -> SearchOutcome {
        if generation != self.current {
            archive_debug!(
                "Dropping stale search response {} (current {})",
                generation,
                self.current
            );
            return SearchOutcome::Stale;
        }
        self.awaiting = None;
        match result {
            Ok(results) => {
                self.results = results;
                self.has_results = true;
                SearchOutcome::Applied
            }
            Err(message) => {
                archive_warn!("Search {} failed: {}", generation, message);
                SearchOutcome::Failed(message)
            }
        }
    }

    pub fn results(&self) -> &SearchResult {
        &self.results
    }

    /// Total from the last applied response, if any response was applied yet.
    pub fn known_total(&self) -> Option<u64> {
        self.has_results.then_some(self.results.total)
    }

    pub fn is_searching(&self) -> bool {
        self.awaiting.is_some()
    }
}
