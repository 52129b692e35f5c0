use archive_logging::{archive_debug, archive_info};
use url::Url;

use crate::admin::CatalogOutcome;
use crate::effect::Notification;
use crate::monitor::TimerCommand;
use crate::pagination;
use crate::search::SearchOutcome;
use crate::{AppState, Effect, Msg, Screen};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started { location } => {
            if state.is_started() {
                return (state, Vec::new());
            }
            state.mark_started();
            let change = state
                .store_mut()
                .restore(location.as_deref().unwrap_or_default());
            let mut effects = vec![Effect::FetchSites];
            effects.extend(state.on_state_change(change));
            effects
        }
        Msg::LocationRestored(raw) => {
            let change = state.store_mut().restore(&raw);
            state.on_state_change(change)
        }
        Msg::SiteSelected(site_id) => {
            let site_id = state.known_site(site_id);
            let change = state.store_mut().update(|query| query.site_id = site_id);
            state.on_state_change(change)
        }
        Msg::QuerySubmitted(text) => {
            let change = state.store_mut().submit_query(&text);
            state.on_state_change(change)
        }
        Msg::QueryCleared => {
            let change = state.store_mut().update(|query| query.query = None);
            state.on_state_change(change)
        }
        Msg::SortSelected(mode) => {
            if state.query().sort == mode || !state.sort_available(mode) {
                return (state, Vec::new());
            }
            let change = state.store_mut().update(|query| query.sort = mode);
            state.on_state_change(change)
        }
        Msg::NewerClicked => match pagination::newer_skip(state.query().skip) {
            Some(skip) => {
                let change = state.store_mut().update(|query| query.skip = skip);
                state.on_state_change(change)
            }
            None => Vec::new(),
        },
        Msg::OlderClicked => {
            let total = state.search().known_total().unwrap_or(0);
            match pagination::older_skip(state.query().skip, total) {
                Some(skip) => {
                    let change = state.store_mut().update(|query| query.skip = skip);
                    state.on_state_change(change)
                }
                None => Vec::new(),
            }
        }
        Msg::SitesLoaded(Ok(sites)) => {
            archive_debug!("Loaded {} sites", sites.len());
            state.set_sites(sites);
            Vec::new()
        }
        Msg::SitesLoaded(Err(message)) => {
            vec![Effect::Notify(Notification::request_failed(message))]
        }
        Msg::SearchCompleted { generation, result } => {
            match state.search_mut().on_response(generation, result) {
                SearchOutcome::Applied => {
                    state.mark_dirty();
                    Vec::new()
                }
                SearchOutcome::Stale => Vec::new(),
                SearchOutcome::Failed(message) => {
                    state.mark_dirty();
                    vec![Effect::Notify(Notification::request_failed(message))]
                }
            }
        }
        Msg::AdminOpened => {
            state.set_screen(Screen::Admin);
            let cycle = state.admin_mut().begin_refresh();
            state.mark_dirty();
            vec![Effect::FetchCatalog { cycle }]
        }
        Msg::BrowseOpened => {
            state.set_screen(Screen::Browse);
            Vec::new()
        }
        Msg::CatalogLoaded { cycle, result } => {
            let outcome = state
                .admin_mut()
                .apply_catalog(cycle, result.as_ref().map_err(String::as_str));
            match outcome {
                CatalogOutcome::Stale => Vec::new(),
                CatalogOutcome::Applied(commands) => {
                    if let Ok(catalog) = result {
                        state.set_sites(catalog.sources);
                    }
                    state.mark_dirty();
                    timer_effects(commands)
                }
                CatalogOutcome::Failed(commands) => {
                    state.mark_dirty();
                    let mut effects = timer_effects(commands);
                    if let Err(message) = result {
                        effects.push(Effect::Notify(Notification::request_failed(message)));
                    }
                    effects
                }
            }
        }
        Msg::ReindexClicked { file_name } => {
            let file_name = file_name.trim().to_string();
            if file_name.is_empty() {
                return (
                    state,
                    vec![Effect::Notify(Notification::error("A file name is required"))],
                );
            }
            archive_info!("Reindex requested for {}", file_name);
            start_job(&mut state, Effect::Reindex { file_name })
        }
        Msg::DownloadRequested { url, file_name } => {
            let url = url.trim().to_string();
            let file_name = file_name.trim().to_string();
            if let Err(problem) = validate_download(&url, &file_name) {
                return (state, vec![Effect::Notify(Notification::error(problem))]);
            }
            archive_info!("Download requested: {} -> {}", url, file_name);
            start_job(&mut state, Effect::Download { url, file_name })
        }
        Msg::JobRequestFinished {
            action,
            file_name,
            result,
        } => match result {
            Ok(()) => {
                archive_info!("{} of {} accepted", action, file_name);
                vec![Effect::Notify(Notification::info(format!(
                    "Started to {action} {file_name}"
                )))]
            }
            Err(message) => vec![Effect::Notify(Notification::error(format!(
                "Could not {action} {file_name}: {message}"
            )))],
        },
        Msg::PollTimerFired { token } => match state.admin_mut().timer_fired(token) {
            Some(cycle) => vec![Effect::FetchCatalog { cycle }],
            None => Vec::new(),
        },
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Sends the job request and arms polling without waiting to see the job.
fn start_job(state: &mut AppState, request: Effect) -> Vec<Effect> {
    let commands = state.admin_mut().job_started();
    state.mark_dirty();
    let mut effects = Vec::with_capacity(1 + commands.len());
    effects.push(request);
    effects.extend(timer_effects(commands));
    effects
}

fn timer_effects(commands: Vec<TimerCommand>) -> Vec<Effect> {
    commands.into_iter().map(Effect::from).collect()
}

fn validate_download(url: &str, file_name: &str) -> Result<(), String> {
    if file_name.is_empty() {
        return Err("A file name is required".to_string());
    }
    if file_name.contains(['/', '\\']) {
        return Err(format!("File name {file_name:?} must not contain a path"));
    }
    let parsed = Url::parse(url).map_err(|err| format!("Invalid download URL {url:?}: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Unsupported download URL scheme {other:?}")),
    }
}
