use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use archive_core::{Effect, Msg};
use archive_engine::{EngineEvent, EngineHandle};
use archive_logging::{archive_debug, archive_info, archive_warn};

use super::app::AppEvent;
use super::config::ClientConfig;
use super::{console, persistence};

/// Executes core effects against the engine and feeds engine events back as messages.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(config: &ClientConfig, events: mpsc::Sender<AppEvent>) -> Result<Self> {
        let engine = EngineHandle::new(config.api_settings()).context("failed to start engine")?;
        archive_info!("Engine started against {}", config.api_root);
        let runner = Self {
            engine,
            state_dir: config.state_dir.clone(),
        };
        runner.spawn_event_loop(events);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchSites => self.engine.fetch_sites(),
                Effect::Search {
                    generation,
                    request,
                } => self.engine.search(generation, request),
                Effect::PublishLocation(location) => {
                    archive_debug!("Location now {:?}", location);
                    persistence::save_location(&self.state_dir, &location);
                }
                Effect::FetchCatalog { cycle } => self.engine.fetch_catalog(cycle),
                Effect::Reindex { file_name } => self.engine.reindex(file_name),
                Effect::Download { url, file_name } => self.engine.download(url, file_name),
                Effect::ArmPollTimer { token, after } => self.engine.arm_timer(token, after),
                Effect::CancelPollTimer { token } => self.engine.cancel_timer(token),
                Effect::Notify(notification) => {
                    println!("{}", console::render_notification(&notification));
                }
            }
        }
    }

    fn spawn_event_loop(&self, events: mpsc::Sender<AppEvent>) {
        let engine_events = self.engine.events();
        thread::spawn(move || {
            while let Some(event) = engine_events.recv() {
                if events.send(AppEvent::Msg(map_event(event))).is_err() {
                    archive_debug!("App loop gone; stopping engine event forwarding");
                    return;
                }
            }
            archive_debug!("Engine stopped; event forwarding done");
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SitesFetched(result) => Msg::SitesLoaded(result.map_err(|err| {
            archive_warn!("Loading sites failed: {}", err);
            err.to_string()
        })),
        EngineEvent::SearchCompleted { generation, result } => Msg::SearchCompleted {
            generation,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::CatalogFetched { cycle, result } => Msg::CatalogLoaded {
            cycle,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::JobRequested {
            action,
            file_name,
            result,
        } => Msg::JobRequestFinished {
            action,
            file_name,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::TimerFired { token } => Msg::PollTimerFired { token },
    }
}
