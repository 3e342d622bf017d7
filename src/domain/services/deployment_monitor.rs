//! Deployment monitor
//!
//! Drives a rollout to a terminal [`DeploymentOutcome`] with an explicit
//! state machine:
//!
//! ```text
//! Started ──(no wait)──────────────────────────────▶ SkippedWait
//!    │
//!    ▼
//! Polling ──▶ Succeeded | Failed | TimedOut | Aborted
//! ```
//!
//! What "converged" and "failed" mean is decided by a poller: one for rolling
//! service updates, one for blue/green deployments. Time and sleeping go
//! through the [`Clock`] port; the [`StopSignal`] is checked between cycles
//! and between sleep slices.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::domain::entities::{
    BlueGreenState, DeploymentGroupInfo, DeploymentOutcome, ServiceEvent, ServiceSnapshot,
};
use crate::domain::ports::{
    Clock, DeployEvent, DeployEventSink, RegistryClient, RegistryResult, StopSignal,
};
use crate::domain::services::event_policy::EventPolicy;
use crate::domain::value_objects::{EventSeverity, WaitTimeout};

/// Longest single sleep; bounds how late a stop request is noticed.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    /// Consecutive transient poll failures tolerated before giving up
    pub max_transient_retries: u32,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    pub policy: EventPolicy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_transient_retries: 5,
            backoff_initial: Duration::from_millis(500),
            backoff_max: Duration::from_secs(10),
            policy: EventPolicy::default(),
        }
    }
}

impl MonitorSettings {
    /// Delay before retry number `attempt` (1-based), doubling up to the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_initial
            .saturating_mul(factor)
            .min(self.backoff_max)
    }
}

/// What one poll observed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollStatus {
    Converged { final_task_count: u32 },
    Pending { running: u32, desired: u32 },
    Failed { reason: String, events: Vec<String> },
}

trait Poller {
    fn poll(
        &mut self,
        monitor: &DeploymentMonitor<'_>,
        started_at: DateTime<Utc>,
    ) -> RegistryResult<PollStatus>;
}

#[derive(Debug)]
struct Cycle {
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    running: u32,
    desired: u32,
}

#[derive(Debug)]
enum MonitorState {
    Started,
    Polling(Cycle),
    Finished(DeploymentOutcome),
}

enum PollResult {
    Status(PollStatus),
    GaveUp(String),
    /// Stop requested or deadline reached while backing off
    Interrupted,
}

pub struct DeploymentMonitor<'a> {
    client: &'a dyn RegistryClient,
    clock: &'a dyn Clock,
    events: &'a dyn DeployEventSink,
    stop: &'a StopSignal,
    settings: &'a MonitorSettings,
}

impl<'a> DeploymentMonitor<'a> {
    pub fn new(
        client: &'a dyn RegistryClient,
        clock: &'a dyn Clock,
        events: &'a dyn DeployEventSink,
        stop: &'a StopSignal,
        settings: &'a MonitorSettings,
    ) -> Self {
        Self {
            client,
            clock,
            events,
            stop,
            settings,
        }
    }

    /// Watch a rolling service update until every running task is on
    /// `target_arn`.
    ///
    /// `prior_events` are the service events observed before the mutating
    /// call. They are history and never fail the rollout, whatever their
    /// timestamps say.
    pub fn watch_service(
        &self,
        cluster: &str,
        service: &str,
        target_arn: &str,
        prior_events: &[ServiceEvent],
        timeout: WaitTimeout,
        ignore_warnings: bool,
    ) -> RegistryResult<DeploymentOutcome> {
        let mut poller = ServicePoller {
            cluster,
            service,
            target_arn,
            ignore_warnings,
            seen: prior_events.iter().map(|e| e.id.clone()).collect(),
        };
        debug!(known_events = poller.seen.len(), "event cursor seeded");
        self.run(&mut poller, timeout)
    }

    /// Watch a blue/green deployment until it reaches a terminal state.
    pub fn watch_blue_green(
        &self,
        deployment_id: &str,
        group: &DeploymentGroupInfo,
        timeout: WaitTimeout,
    ) -> RegistryResult<DeploymentOutcome> {
        let mut poller = BlueGreenPoller {
            deployment_id,
            group,
        };
        self.run(&mut poller, timeout)
    }

    fn run(
        &self,
        poller: &mut dyn Poller,
        timeout: WaitTimeout,
    ) -> RegistryResult<DeploymentOutcome> {
        let _watching = self.stop.watch();
        let mut state = MonitorState::Started;
        loop {
            state = match state {
                MonitorState::Started => self.start(timeout),
                MonitorState::Polling(cycle) => self.cycle(poller, cycle)?,
                MonitorState::Finished(outcome) => {
                    debug!(outcome = outcome.label(), "monitor finished");
                    self.events.on_event(DeployEvent::Finished {
                        outcome: outcome.clone(),
                    });
                    return Ok(outcome);
                }
            };
        }
    }

    fn start(&self, timeout: WaitTimeout) -> MonitorState {
        self.events.on_event(DeployEvent::WaitStarted { timeout });
        match timeout {
            WaitTimeout::NoWait => MonitorState::Finished(DeploymentOutcome::SkippedWait),
            WaitTimeout::Bounded(limit) => {
                let started_at = self.clock.now();
                let delta = chrono::Duration::from_std(limit).unwrap_or(chrono::Duration::MAX);
                let deadline = started_at
                    .checked_add_signed(delta)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                debug!(timeout_secs = limit.as_secs(), "monitor polling");
                MonitorState::Polling(Cycle {
                    started_at,
                    deadline,
                    running: 0,
                    desired: 0,
                })
            }
        }
    }

    fn cycle(&self, poller: &mut dyn Poller, mut cycle: Cycle) -> RegistryResult<MonitorState> {
        if self.stop.is_stopped() {
            return Ok(self.aborted(&cycle));
        }

        let next = match self.poll_with_retry(poller, &cycle)? {
            PollResult::Status(PollStatus::Converged { final_task_count }) => {
                MonitorState::Finished(DeploymentOutcome::Succeeded { final_task_count })
            }
            PollResult::Status(PollStatus::Failed { reason, events }) => {
                MonitorState::Finished(DeploymentOutcome::Failed { reason, events })
            }
            PollResult::Status(PollStatus::Pending { running, desired }) => {
                cycle.running = running;
                cycle.desired = desired;
                if self.clock.now() >= cycle.deadline {
                    self.timed_out(&cycle)
                } else {
                    self.pause(self.settings.poll_interval, cycle.deadline);
                    if self.stop.is_stopped() {
                        self.aborted(&cycle)
                    } else {
                        MonitorState::Polling(cycle)
                    }
                }
            }
            PollResult::GaveUp(reason) => MonitorState::Finished(DeploymentOutcome::Failed {
                reason,
                events: Vec::new(),
            }),
            PollResult::Interrupted if self.stop.is_stopped() => self.aborted(&cycle),
            PollResult::Interrupted => self.timed_out(&cycle),
        };
        Ok(next)
    }

    fn poll_with_retry(&self, poller: &mut dyn Poller, cycle: &Cycle) -> RegistryResult<PollResult> {
        let mut attempt = 0;
        loop {
            match poller.poll(self, cycle.started_at) {
                Ok(status) => return Ok(PollResult::Status(status)),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt > self.settings.max_transient_retries {
                        warn!(attempts = attempt, error = %err, "giving up on transient errors");
                        return Ok(PollResult::GaveUp(format!(
                            "gave up after {attempt} consecutive poll failures: {err}"
                        )));
                    }
                    let delay = self.settings.backoff(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "poll failed, retrying"
                    );
                    self.events.on_event(DeployEvent::TransientError {
                        attempt,
                        message: err.to_string(),
                    });
                    self.pause(delay, cycle.deadline);
                    if self.stop.is_stopped() || self.clock.now() >= cycle.deadline {
                        return Ok(PollResult::Interrupted);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Sleep for `delay`, never past `deadline`, waking early on stop.
    fn pause(&self, delay: Duration, deadline: DateTime<Utc>) {
        let remaining = (deadline - self.clock.now()).to_std().unwrap_or_default();
        let mut left = delay.min(remaining);
        while !left.is_zero() && !self.stop.is_stopped() {
            let slice = left.min(SLEEP_SLICE);
            self.clock.sleep(slice);
            left -= slice;
        }
    }

    fn timed_out(&self, cycle: &Cycle) -> MonitorState {
        MonitorState::Finished(DeploymentOutcome::TimedOut {
            elapsed: self.clock.elapsed_since(cycle.started_at),
            running_count: cycle.running,
            desired_count: cycle.desired,
        })
    }

    fn aborted(&self, cycle: &Cycle) -> MonitorState {
        debug!("stop requested, leaving the rollout in place");
        MonitorState::Finished(DeploymentOutcome::Aborted {
            elapsed: self.clock.elapsed_since(cycle.started_at),
        })
    }
}

struct ServicePoller<'p> {
    cluster: &'p str,
    service: &'p str,
    target_arn: &'p str,
    ignore_warnings: bool,
    /// Event-id cursor, seeded with the events that predate the watch
    seen: HashSet<String>,
}

impl ServicePoller<'_> {
    /// Classify events not seen before that are newer than `since`.
    fn new_failures(
        &mut self,
        monitor: &DeploymentMonitor<'_>,
        snapshot: &ServiceSnapshot,
        since: DateTime<Utc>,
    ) -> Option<PollStatus> {
        let mut fresh: Vec<&ServiceEvent> = snapshot
            .events
            .iter()
            .filter(|e| e.created_at >= since && !self.seen.contains(&e.id))
            .collect();
        fresh.sort_by_key(|e| e.created_at);

        let mut category = None;
        let mut messages = Vec::new();
        for event in fresh {
            self.seen.insert(event.id.clone());
            let Some(hit) = monitor.settings.policy.classify(&event.message) else {
                continue;
            };
            let ignored = self.ignore_warnings || hit.severity == EventSeverity::Warning;
            monitor.events.on_event(DeployEvent::EventMatched {
                category: hit.category,
                severity: hit.severity,
                message: event.message.clone(),
                ignored,
            });
            if ignored {
                warn!(category = %hit.category, message = %event.message, "service event ignored");
                continue;
            }
            category.get_or_insert(hit.category);
            messages.push(event.message.clone());
        }

        category.map(|category| PollStatus::Failed {
            reason: format!("service reported a {category} failure"),
            events: messages,
        })
    }
}

impl Poller for ServicePoller<'_> {
    fn poll(
        &mut self,
        monitor: &DeploymentMonitor<'_>,
        started_at: DateTime<Utc>,
    ) -> RegistryResult<PollStatus> {
        let snapshot = monitor.client.describe_service(self.cluster, self.service)?;
        let on_target = snapshot.running_on(self.target_arn);
        trace!(
            cluster = self.cluster,
            service = self.service,
            running = snapshot.running_count,
            desired = snapshot.desired_count,
            on_target,
            deployments = snapshot.deployments.len(),
            "polled service"
        );
        if monitor.events.wants_detailed_events() {
            monitor.events.on_event(DeployEvent::Progress {
                running: snapshot.running_count,
                desired: snapshot.desired_count,
                pending: snapshot.pending_count,
                on_target,
                elapsed: monitor.clock.elapsed_since(started_at),
            });
        }

        let since = snapshot
            .primary_deployment()
            .and_then(|d| d.created_at)
            .unwrap_or(started_at);
        if let Some(failed) = self.new_failures(monitor, &snapshot, since) {
            return Ok(failed);
        }

        if snapshot.is_converged_on(self.target_arn) {
            Ok(PollStatus::Converged {
                final_task_count: snapshot.running_count,
            })
        } else {
            Ok(PollStatus::Pending {
                running: snapshot.running_count,
                desired: snapshot.desired_count,
            })
        }
    }
}

struct BlueGreenPoller<'p> {
    deployment_id: &'p str,
    group: &'p DeploymentGroupInfo,
}

impl Poller for BlueGreenPoller<'_> {
    fn poll(
        &mut self,
        monitor: &DeploymentMonitor<'_>,
        _started_at: DateTime<Utc>,
    ) -> RegistryResult<PollStatus> {
        let status = monitor.client.describe_deployment(self.deployment_id)?;
        trace!(deployment_id = self.deployment_id, state = %status.state, "polled deployment");
        if monitor.events.wants_detailed_events() {
            monitor.events.on_event(DeployEvent::BlueGreenProgress {
                deployment_id: self.deployment_id.to_string(),
                state: status.state,
            });
        }

        match status.state {
            BlueGreenState::Failed | BlueGreenState::Stopped => {
                let detail = status
                    .error_message
                    .unwrap_or_else(|| "no error message".to_string());
                Ok(PollStatus::Failed {
                    reason: format!(
                        "deployment {} {}: {detail}",
                        self.deployment_id, status.state
                    ),
                    events: Vec::new(),
                })
            }
            state => {
                let snapshot = monitor
                    .client
                    .describe_service(&self.group.cluster, &self.group.service)?;
                if state == BlueGreenState::Succeeded {
                    Ok(PollStatus::Converged {
                        final_task_count: snapshot.running_count,
                    })
                } else {
                    Ok(PollStatus::Pending {
                        running: snapshot.running_count,
                        desired: snapshot.desired_count,
                    })
                }
            }
        }
    }
}
