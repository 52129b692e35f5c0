use std::time::Duration;

use crate::admin::AdminState;
use crate::model::{SiteId, Source};
use crate::query::{QueryState, QueryStateStore, SortMode, StateChange};
use crate::search::SearchController;
use crate::view_model::{self, AppViewModel};
use crate::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Browse,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    started: bool,
    screen: Screen,
    sites: Option<Vec<Source>>,
    store: QueryStateStore,
    search: SearchController,
    admin: AdminState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            admin: AdminState::new(poll_interval),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            screen: self.screen,
            browse: view_model::browse_view(self.sites.as_deref(), &self.store.read(), &self.search),
            admin: view_model::admin_view(&self.admin),
            dirty: self.dirty,
        }
    }

    /// Current shareable location of the query state.
    pub fn location(&self) -> &str {
        self.store.location()
    }

    pub fn query(&self) -> QueryState {
        self.store.read()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn sites(&self) -> Option<&[Source]> {
        self.sites.as_deref()
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn admin(&self) -> &AdminState {
        &self.admin
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    pub(crate) fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_sites(&mut self, sites: Vec<Source>) {
        if self.sites.as_ref() != Some(&sites) {
            self.sites = Some(sites);
            self.mark_dirty();
        }
    }

    /// Keeps a selection only if it names a known source. Before the source
    /// list has loaded every id is accepted.
    pub(crate) fn known_site(&self, site_id: Option<SiteId>) -> Option<SiteId> {
        site_id.filter(|id| {
            self.sites
                .as_ref()
                .is_none_or(|sites| sites.iter().any(|site| site.id == *id))
        })
    }

    pub(crate) fn sort_available(&self, mode: SortMode) -> bool {
        let total = self.search.known_total().unwrap_or(0);
        view_model::sort_enabled(mode, &self.store.read(), total)
    }

    pub(crate) fn store_mut(&mut self) -> &mut QueryStateStore {
        &mut self.store
    }

    pub(crate) fn search_mut(&mut self) -> &mut SearchController {
        &mut self.search
    }

    pub(crate) fn admin_mut(&mut self) -> &mut AdminState {
        &mut self.admin
    }

    /// Turns a published state version into the effects that follow from it.
    pub(crate) fn on_state_change(&mut self, change: StateChange) -> Vec<Effect> {
        let query = self.store.read();
        let request = self.search.on_state_changed(&change, &query);
        self.mark_dirty();
        vec![
            Effect::PublishLocation(change.location),
            Effect::Search {
                generation: change.generation,
                request,
            },
        ]
    }
}
