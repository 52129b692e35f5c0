use std::fmt;
use std::time::Duration;

use archive_logging::archive_debug;

use crate::reconcile::ReconciledRow;

/// Default delay between job progress refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Identifies one armed poll timer. A fire carrying an old token is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    #[default]
    Idle,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Arm { token: TimerToken, after: Duration },
    Cancel { token: TimerToken },
}

/// Two-state poller over the reconciled rows.
///
/// At most one timer is outstanding: arming always cancels the previous
/// handle first, and returning to idle cancels whatever is still armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMonitor {
    phase: MonitorPhase,
    armed: Option<TimerToken>,
    next_token: u64,
    interval: Duration,
}

impl Default for JobMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl JobMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            phase: MonitorPhase::Idle,
            armed: None,
            next_token: 0,
            interval,
        }
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn armed(&self) -> Option<TimerToken> {
        self.armed
    }

    /// Re-evaluates the phase after a reconciliation cycle.
    pub fn observe(&mut self, rows: &[ReconciledRow]) -> Vec<TimerCommand> {
        let running = rows.iter().filter(|row| row.is_running()).count();
        if running > 0 {
            archive_debug!("{} job(s) running, polling", running);
            self.phase = MonitorPhase::Polling;
            self.rearm()
        } else {
            self.stop()
        }
    }

    /// Arms polling right after a job was requested, before any row shows it.
    pub fn job_started(&mut self) -> Vec<TimerCommand> {
        self.phase = MonitorPhase::Polling;
        self.rearm()
    }

    /// Consumes a timer fire. Returns `true` when the fire is current and a
    /// refresh should be started.
    pub fn timer_fired(&mut self, token: TimerToken) -> bool {
        if self.armed != Some(token) || self.phase != MonitorPhase::Polling {
            archive_debug!("Ignoring poll timer {} (armed {:?})", token, self.armed);
            return false;
        }
        self.armed = None;
        true
    }

    /// A refresh failed; polling stops until the next job request or reconciliation.
    pub fn refresh_failed(&mut self) -> Vec<TimerCommand> {
        self.stop()
    }

    fn rearm(&mut self) -> Vec<TimerCommand> {
        let mut commands = Vec::with_capacity(2);
        if let Some(token) = self.armed.take() {
            commands.push(TimerCommand::Cancel { token });
        }
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.armed = Some(token);
        commands.push(TimerCommand::Arm {
            token,
            after: self.interval,
        });
        commands
    }

    fn stop(&mut self) -> Vec<TimerCommand> {
        self.phase = MonitorPhase::Idle;
        self.armed
            .take()
            .map(|token| TimerCommand::Cancel { token })
            .into_iter()
            .collect()
    }
}
