//! Search filter state and its shareable `key=value&...` representation.
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::model::{SearchRequest, SiteId, MATCH_ALL_QUERY, PAGE_SIZE};

const KEY_SITE_ID: &str = "site_id";
const KEY_QUERY: &str = "query";
const KEY_SORT: &str = "sort";
const KEY_SKIP: &str = "skip";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Date,
    Relevance,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::Relevance => "relevance",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "date" => Some(SortMode::Date),
            "relevance" => Some(SortMode::Relevance),
            _ => None,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version tag of the query state; bumped on every store update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    pub site_id: Option<SiteId>,
    pub query: Option<String>,
    pub sort: SortMode,
    pub skip: u64,
}

impl QueryState {
    /// Projects a location string onto a state, applying defaults.
    ///
    /// Unparsable values are treated as absent. The representation is read
    /// leniently so that any bookmarked location yields a usable state.
    pub fn from_location(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches('?');
        let mut site_id = None;
        let mut query = None;
        let mut sort = None;
        let mut skip = None;

        // First occurrence wins for repeated keys.
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match &*key {
                KEY_SITE_ID if site_id.is_none() => {
                    site_id = Some(value.trim().parse::<i64>().ok().map(SiteId));
                }
                KEY_QUERY if query.is_none() => query = Some(value.into_owned()),
                KEY_SORT if sort.is_none() => sort = Some(SortMode::parse(value.trim())),
                KEY_SKIP if skip.is_none() => skip = Some(value.trim().parse::<i64>().ok()),
                _ => {}
            }
        }

        let state = QueryState {
            site_id: site_id.flatten(),
            query: query.filter(|q| !q.trim().is_empty()),
            sort: sort.flatten().unwrap_or_default(),
            skip: skip
                .flatten()
                .and_then(|value| u64::try_from(value).ok())
                .unwrap_or(0),
        };
        state.normalized()
    }

    /// Canonical location string. Defaults are omitted.
    pub fn to_location(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(site_id) = self.site_id {
            serializer.append_pair(KEY_SITE_ID, &site_id.to_string());
        }
        if let Some(query) = &self.query {
            serializer.append_pair(KEY_QUERY, query);
        }
        if self.sort != SortMode::Date {
            serializer.append_pair(KEY_SORT, self.sort.as_str());
        }
        if self.skip != 0 {
            serializer.append_pair(KEY_SKIP, &self.skip.to_string());
        }
        serializer.finish()
    }

    pub fn search_request(&self) -> SearchRequest {
        SearchRequest {
            site_id: self.site_id,
            sort: self.sort,
            query: self
                .query
                .clone()
                .unwrap_or_else(|| MATCH_ALL_QUERY.to_string()),
            skip: self.skip,
        }
    }

    /// Applies the invariants that hold for any single state in isolation.
    fn normalized(mut self) -> Self {
        if self.query.as_deref().is_some_and(|q| q.trim().is_empty()) {
            self.query = None;
        }
        if self.query.is_none() {
            self.sort = SortMode::Date;
        }
        self.skip -= self.skip % PAGE_SIZE;
        self
    }

    /// Applies the invariants that depend on what changed relative to `previous`.
    fn reconciled_with(self, previous: &QueryState) -> Self {
        let mut next = self.normalized();
        match (&previous.query, &next.query) {
            (Some(_), None) => next.skip = 0,
            (old, Some(new)) if old.as_deref() != Some(new.as_str()) => {
                next.sort = SortMode::Relevance;
                next.skip = 0;
            }
            _ => {}
        }
        if next.site_id != previous.site_id {
            next.skip = 0;
        }
        next
    }
}

/// Result of publishing a new state version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub generation: Generation,
    /// The selected source changed, so results on display no longer apply.
    pub results_invalidated: bool,
    pub location: String,
}

/// Owns the search filter state.
///
/// The location string is the single source of truth: `read` projects it and
/// `update` writes a new one. Cross-field invariants are enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryStateStore {
    location: String,
    generation: Generation,
}

impl QueryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> QueryState {
        QueryState::from_location(&self.location)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Applies `patch` to the current state, enforces invariants and
    /// republishes the location in one step.
    pub fn update(&mut self, patch: impl FnOnce(&mut QueryState)) -> StateChange {
        let previous = self.read();
        let mut next = previous.clone();
        patch(&mut next);
        let next = next.reconciled_with(&previous);
        self.publish(&previous, &next)
    }

    /// Sets the search text. A non-blank submission always lands on the
    /// first page sorted by relevance, even when the text is unchanged.
    pub fn submit_query(&mut self, text: &str) -> StateChange {
        let previous = self.read();
        let mut next = previous.clone();
        next.query = Some(text.to_string());
        let mut next = next.reconciled_with(&previous);
        if next.query.is_some() {
            next.sort = SortMode::Relevance;
            next.skip = 0;
        }
        self.publish(&previous, &next)
    }

    /// Replaces the whole state with one read from an external location.
    pub fn restore(&mut self, raw: &str) -> StateChange {
        let previous = self.read();
        let next = QueryState::from_location(raw);
        self.publish(&previous, &next)
    }

    fn publish(&mut self, previous: &QueryState, next: &QueryState) -> StateChange {
        self.location = next.to_location();
        self.generation = self.generation.next();
        StateChange {
            generation: self.generation,
            results_invalidated: previous.site_id != next.site_id,
            location: self.location.clone(),
        }
    }
}
