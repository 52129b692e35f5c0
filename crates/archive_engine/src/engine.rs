use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use archive_core::{CatalogCycle, Generation, JobAction, SearchRequest, TimerToken};
use archive_logging::{archive_debug, archive_info, archive_warn};

use crate::api::{ApiSettings, ArchiveApi, ReqwestApi};
use crate::timer::PollTimer;
use crate::{EngineError, EngineEvent};

enum EngineCommand {
    Request(Request),
    ArmTimer {
        token: TimerToken,
        after: Duration,
    },
    CancelTimer {
        token: TimerToken,
    },
}

enum Request {
    FetchSites,
    Search {
        generation: Generation,
        request: SearchRequest,
    },
    FetchCatalog {
        cycle: CatalogCycle,
    },
    Reindex {
        file_name: String,
    },
    Download {
        url: String,
        file_name: String,
    },
}

/// Owns the engine thread. Requests run concurrently on its runtime and report
/// back through [`EngineEvent`]s; the thread exits once every handle is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    events: EngineEvents,
}

/// Receiving side of the engine, usable without keeping the engine alive.
#[derive(Clone)]
pub struct EngineEvents {
    rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineEvents {
    /// Blocks for the next event. `None` once the engine thread has exited.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.rx.lock().ok()?.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, EngineError> {
        let api = ReqwestApi::new(settings)?;
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn ArchiveApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::Builder::new()
            .name("archive-engine".to_string())
            .spawn(move || {
                let mut timer = PollTimer::new(runtime.handle().clone(), event_tx.clone());
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::ArmTimer { token, after } => timer.arm(token, after),
                        EngineCommand::CancelTimer { token } => timer.cancel(token),
                        EngineCommand::Request(request) => {
                            let api = api.clone();
                            let event_tx = event_tx.clone();
                            runtime.spawn(async move {
                                let event = handle_request(api.as_ref(), request).await;
                                let _ = event_tx.send(event);
                            });
                        }
                    }
                }
                archive_debug!("Engine command channel closed");
            })?;

        Ok(Self {
            cmd_tx,
            events: EngineEvents {
                rx: Arc::new(Mutex::new(event_rx)),
            },
        })
    }

    pub fn fetch_sites(&self) {
        self.send(EngineCommand::Request(Request::FetchSites));
    }

    pub fn search(&self, generation: Generation, request: SearchRequest) {
        self.send(EngineCommand::Request(Request::Search {
            generation,
            request,
        }));
    }

    pub fn fetch_catalog(&self, cycle: CatalogCycle) {
        self.send(EngineCommand::Request(Request::FetchCatalog { cycle }));
    }

    pub fn reindex(&self, file_name: impl Into<String>) {
        self.send(EngineCommand::Request(Request::Reindex {
            file_name: file_name.into(),
        }));
    }

    pub fn download(&self, url: impl Into<String>, file_name: impl Into<String>) {
        self.send(EngineCommand::Request(Request::Download {
            url: url.into(),
            file_name: file_name.into(),
        }));
    }

    pub fn arm_timer(&self, token: TimerToken, after: Duration) {
        self.send(EngineCommand::ArmTimer { token, after });
    }

    pub fn cancel_timer(&self, token: TimerToken) {
        self.send(EngineCommand::CancelTimer { token });
    }

    pub fn events(&self) -> EngineEvents {
        self.events.clone()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.events.try_recv()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.events.recv_timeout(timeout)
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            archive_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_request(api: &dyn ArchiveApi, request: Request) -> EngineEvent {
    match request {
        Request::FetchSites => {
            archive_debug!("Fetching sites");
            EngineEvent::SitesFetched(api.sites().await)
        }
        Request::Search {
            generation,
            request,
        } => {
            archive_debug!(
                "Search {} site={:?} sort={} skip={}",
                generation,
                request.site_id,
                request.sort,
                request.skip
            );
            let result = api.search(&request).await;
            EngineEvent::SearchCompleted { generation, result }
        }
        Request::FetchCatalog { cycle } => {
            archive_debug!("Fetching catalog {}", cycle);
            let result = api.catalog().await;
            EngineEvent::CatalogFetched { cycle, result }
        }
        Request::Reindex { file_name } => {
            archive_info!("Requesting reindex of {}", file_name);
            let result = api.reindex(&file_name).await;
            EngineEvent::JobRequested {
                action: JobAction::Reindex,
                file_name,
                result,
            }
        }
        Request::Download { url, file_name } => {
            archive_info!("Requesting download of {} into {}", url, file_name);
            let result = api.download(&url, &file_name).await;
            EngineEvent::JobRequested {
                action: JobAction::Download,
                file_name,
                result,
            }
        }
    }
}
