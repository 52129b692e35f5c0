use std::fmt;
use std::time::Duration;

use archive_logging::{archive_debug, archive_warn};

use crate::model::{ArchiveFile, Source};
use crate::monitor::{JobMonitor, TimerCommand, TimerToken};
use crate::reconcile::{reconcile, ReconciledRow};

/// Tag of one admin catalog refresh; only the latest issued cycle is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CatalogCycle(pub u64);

impl fmt::Display for CatalogCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Both collections fetched for one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    pub sources: Vec<Source>,
    pub archives: Vec<ArchiveFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOutcome {
    Applied(Vec<TimerCommand>),
    Stale,
    Failed(Vec<TimerCommand>),
}

/// Admin table state: the reconciled rows and the job monitor driving refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminState {
    latest: CatalogCycle,
    refreshing: bool,
    rows: Option<Vec<ReconciledRow>>,
    monitor: JobMonitor,
}

impl AdminState {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            monitor: JobMonitor::new(poll_interval),
            ..Self::default()
        }
    }

    /// Starts a new refresh cycle, superseding any in flight.
    pub fn begin_refresh(&mut self) -> CatalogCycle {
        self.latest = CatalogCycle(self.latest.0 + 1);
        self.refreshing = true;
        self.latest
    }

    /// Makes in-flight refreshes stale without starting a new one.
    ///
    /// Used after a job request: a catalog fetched before the request could
    /// report no running rows and stop the optimistic poll.
    pub fn supersede_in_flight(&mut self) {
        self.latest = CatalogCycle(self.latest.0 + 1);
        self.refreshing = false;
    }

    pub fn apply_catalog(
        &mut self,
        cycle: CatalogCycle,
        result: Result<&Catalog, &str>,
    ) -> CatalogOutcome {
        if cycle != self.latest {
            archive_debug!("Dropping stale catalog {} (latest {})", cycle, self.latest);
            return CatalogOutcome::Stale;
        }
        self.refreshing = false;
        match result {
            Ok(catalog) => {
                let rows = reconcile(&catalog.sources, &catalog.archives);
                let commands = self.monitor.observe(&rows);
                self.rows = Some(rows);
                CatalogOutcome::Applied(commands)
            }
            Err(message) => {
                archive_warn!("Catalog refresh {} failed: {}", cycle, message);
                CatalogOutcome::Failed(self.monitor.refresh_failed())
            }
        }
    }

    pub fn job_started(&mut self) -> Vec<TimerCommand> {
        self.supersede_in_flight();
        self.monitor.job_started()
    }

    /// Handles a poll timer fire; returns the cycle to fetch if it is current.
    pub fn timer_fired(&mut self, token: TimerToken) -> Option<CatalogCycle> {
        self.monitor
            .timer_fired(token)
            .then(|| self.begin_refresh())
    }

    pub fn rows(&self) -> Option<&[ReconciledRow]> {
        self.rows.as_deref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn monitor(&self) -> &JobMonitor {
        &self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobInfo, JobState, SiteId};
    use crate::monitor::MonitorPhase;

    fn running_catalog() -> Catalog {
        Catalog {
            sources: vec![Source {
                id: SiteId(1),
                name: "one".to_string(),
                file_name: "one.zip".to_string(),
            }],
            archives: vec![ArchiveFile {
                name: "one.zip".to_string(),
                size: 10,
                info: Some(JobInfo {
                    state: JobState::Running,
                    processed: 1,
                    total: Some(10),
                    error: None,
                }),
            }],
        }
    }

    #[test]
    fn only_latest_cycle_is_applied() {
        let mut admin = AdminState::default();
        let old = admin.begin_refresh();
        let new = admin.begin_refresh();
        let catalog = running_catalog();

        assert_eq!(admin.apply_catalog(old, Ok(&catalog)), CatalogOutcome::Stale);
        assert!(admin.rows().is_none());
        assert!(matches!(
            admin.apply_catalog(new, Ok(&catalog)),
            CatalogOutcome::Applied(_)
        ));
        assert_eq!(admin.rows().map(<[_]>::len), Some(1));
        assert_eq!(admin.monitor().phase(), MonitorPhase::Polling);
    }

    #[test]
    fn job_request_supersedes_in_flight_refresh() {
        let mut admin = AdminState::default();
        let cycle = admin.begin_refresh();
        admin.job_started();
        let outcome = admin.apply_catalog(cycle, Ok(&Catalog::default()));
        assert_eq!(outcome, CatalogOutcome::Stale);
        assert_eq!(admin.monitor().phase(), MonitorPhase::Polling);
    }

    #[test]
    fn failed_refresh_keeps_previous_rows() {
        let mut admin = AdminState::default();
        let cycle = admin.begin_refresh();
        admin.apply_catalog(cycle, Ok(&running_catalog()));
        let cycle = admin.begin_refresh();
        let outcome = admin.apply_catalog(cycle, Err("offline"));
        assert!(matches!(outcome, CatalogOutcome::Failed(_)));
        assert_eq!(admin.rows().map(<[_]>::len), Some(1));
        assert_eq!(admin.monitor().phase(), MonitorPhase::Idle);
    }
}
