use std::sync::mpsc;
use std::time::Duration;

use archive_core::TimerToken;
use archive_logging::archive_debug;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::EngineEvent;

/// The one poll timer. Arming aborts whatever was pending before.
pub(crate) struct PollTimer {
    runtime: Handle,
    events: mpsc::Sender<EngineEvent>,
    pending: Option<(TimerToken, JoinHandle<()>)>,
}

impl PollTimer {
    pub(crate) fn new(runtime: Handle, events: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            runtime,
            events,
            pending: None,
        }
    }

    pub(crate) fn arm(&mut self, token: TimerToken, after: Duration) {
        if let Some((previous, task)) = self.pending.take() {
            archive_debug!("Timer {} replaced by {}", previous, token);
            task.abort();
        }
        archive_debug!("Timer {} armed for {:?}", token, after);
        let events = self.events.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            archive_debug!("Timer {} fired", token);
            let _ = events.send(EngineEvent::TimerFired { token });
        });
        self.pending = Some((token, task));
    }

    /// Cancels the timer if `token` is still the pending one.
    pub(crate) fn cancel(&mut self, token: TimerToken) {
        match self.pending.take() {
            Some((pending, task)) if pending == token => {
                archive_debug!("Timer {} cancelled", token);
                task.abort();
            }
            other => self.pending = other,
        }
    }

    #[cfg(test)]
    fn pending(&self) -> Option<TimerToken> {
        self.pending.as_ref().map(|(token, _)| *token)
    }
}
