//! In-process simulated action servers
//!
//! Exercise the coordinator state machine without a transport: each
//! `send_goal` spawns a task that drives the handle's status watch channel
//! the way a remote server would. Used by the demo binary (`aeroswarm run`)
//! and the integration tests. No vehicle dynamics are modeled.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::geometry::Vec3;

use super::client::{
    FollowPathClient, FollowPathGoal, FollowReferenceClient, FollowReferenceGoal, PathFeedback,
};
use super::handle::{ActionHandle, GoalStatus, PathActionHandle};

const ACCEPT_DELAY: Duration = Duration::from_millis(5);
const PATH_FEEDBACK_INTERVAL: Duration = Duration::from_millis(20);

/// Scripted behavior for a simulated follow-reference server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimAgentBehavior {
    /// Accept and keep executing until canceled (nominal slot tracking)
    Track,
    /// Accept, execute, then abort after the given delay
    AbortAfter(Duration),
    /// Reject the goal at acceptance time
    Reject,
}

/// Simulated per-agent follow-reference action server
#[derive(Debug, Clone)]
pub struct SimFollowReference {
    available: bool,
    behavior: SimAgentBehavior,
}

impl SimFollowReference {
    pub fn tracking() -> Self {
        Self {
            available: true,
            behavior: SimAgentBehavior::Track,
        }
    }

    pub fn with_behavior(behavior: SimAgentBehavior) -> Self {
        Self {
            available: true,
            behavior,
        }
    }

    /// Server that never comes up; `wait_for_server` burns the full timeout
    pub fn unavailable() -> Self {
        Self {
            available: false,
            behavior: SimAgentBehavior::Track,
        }
    }
}

#[async_trait]
impl FollowReferenceClient for SimFollowReference {
    async fn wait_for_server(&self, timeout: Duration) -> bool {
        if !self.available {
            tokio::time::sleep(timeout).await;
            return false;
        }
        true
    }

    async fn send_goal(&self, goal: FollowReferenceGoal) -> Result<ActionHandle> {
        let (handle, mut link) = ActionHandle::pair();
        let behavior = self.behavior;
        tokio::spawn(async move {
            tokio::time::sleep(ACCEPT_DELAY).await;
            match behavior {
                SimAgentBehavior::Reject => {
                    let _ = link.status_tx.send(GoalStatus::Rejected);
                }
                SimAgentBehavior::Track => {
                    let _ = link.status_tx.send(GoalStatus::Accepted);
                    let _ = link.status_tx.send(GoalStatus::Executing);
                    debug!(frame = %goal.target_frame, "sim reference tracking");
                    if link.cancel_rx.recv().await.is_some() {
                        let _ = link.status_tx.send(GoalStatus::Canceled);
                    }
                }
                SimAgentBehavior::AbortAfter(delay) => {
                    let _ = link.status_tx.send(GoalStatus::Accepted);
                    let _ = link.status_tx.send(GoalStatus::Executing);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {
                            let _ = link.status_tx.send(GoalStatus::Aborted);
                        }
                        Some(()) = link.cancel_rx.recv() => {
                            let _ = link.status_tx.send(GoalStatus::Canceled);
                        }
                    }
                }
            }
        });
        Ok(handle)
    }
}

/// Scripted outcome for a simulated follow-path server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimPathOutcome {
    /// Walk the path at the goal's max speed, then succeed
    Succeed,
    /// Abort after the given delay
    AbortAfter(Duration),
}

/// Simulated top-level follow-path action server.
///
/// Emits feedback frames with a linearly decreasing distance to the next
/// waypoint while executing.
#[derive(Debug, Clone)]
pub struct SimFollowPath {
    available: bool,
    outcome: SimPathOutcome,
}

impl SimFollowPath {
    pub fn succeeding() -> Self {
        Self {
            available: true,
            outcome: SimPathOutcome::Succeed,
        }
    }

    pub fn with_outcome(outcome: SimPathOutcome) -> Self {
        Self {
            available: true,
            outcome,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            outcome: SimPathOutcome::Succeed,
        }
    }

    fn path_length(goal: &FollowPathGoal) -> f64 {
        let mut prev: Option<Vec3> = None;
        let mut total = 0.0;
        for wp in &goal.path {
            if let Some(p) = prev {
                total += p.distance(&wp.pose.position);
            }
            prev = Some(wp.pose.position);
        }
        total
    }
}

#[async_trait]
impl FollowPathClient for SimFollowPath {
    async fn wait_for_server(&self, timeout: Duration) -> bool {
        if !self.available {
            tokio::time::sleep(timeout).await;
            return false;
        }
        true
    }

    async fn send_goal(&self, goal: FollowPathGoal) -> Result<PathActionHandle> {
        let (handle, mut server) = PathActionHandle::pair();
        let outcome = self.outcome;
        tokio::spawn(async move {
            tokio::time::sleep(ACCEPT_DELAY).await;
            let _ = server.link.status_tx.send(GoalStatus::Accepted);
            let _ = server.link.status_tx.send(GoalStatus::Executing);

            let speed = goal.max_speed.max(0.1);
            // Nominal traversal; the engine only consumes status + feedback
            let length = Self::path_length(&goal).max(0.5);
            let duration = Duration::from_secs_f64(length / speed);

            let deadline = tokio::time::Instant::now() + duration;
            let abort_at = match outcome {
                SimPathOutcome::AbortAfter(delay) => {
                    Some(tokio::time::Instant::now() + delay)
                }
                SimPathOutcome::Succeed => None,
            };

            let mut ticker = tokio::time::interval(PATH_FEEDBACK_INTERVAL);
            loop {
                tokio::select! {
                    now = ticker.tick() => {
                        if let Some(at) = abort_at {
                            if now >= at {
                                let _ = server.link.status_tx.send(GoalStatus::Aborted);
                                return;
                            }
                        }
                        if now >= deadline {
                            let _ = server.feedback_tx.send(Some(PathFeedback {
                                actual_distance_to_next_waypoint: 0.0,
                            }));
                            let _ = server.link.status_tx.send(GoalStatus::Succeeded);
                            return;
                        }
                        let remaining = deadline.saturating_duration_since(now).as_secs_f64() * speed;
                        let _ = server.feedback_tx.send(Some(PathFeedback {
                            actual_distance_to_next_waypoint: remaining,
                        }));
                    }
                    Some(()) = server.link.cancel_rx.recv() => {
                        debug!("sim follow-path canceled");
                        let _ = server.link.status_tx.send(GoalStatus::Canceled);
                        return;
                    }
                }
            }
        });
        Ok(handle)
    }
}
