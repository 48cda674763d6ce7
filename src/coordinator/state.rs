//! Coordinator state: mission phases, status snapshots, composite verdict
//!
//! `composite_status` is the only place the aggregated verdict is computed;
//! it consumes a `StatusSnapshot` taken atomically before any aggregation so
//! agent state is never read mid-update.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::actions::GoalStatus;
use crate::agent::AgentStatus;

/// Mission state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionPhase {
    Idle,
    Validating,
    Initializing,
    Tracking,
    Succeeded,
    Failed,
}

impl std::fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MissionPhase::Idle => "Idle",
            MissionPhase::Validating => "Validating",
            MissionPhase::Initializing => "Initializing",
            MissionPhase::Tracking => "Tracking",
            MissionPhase::Succeeded => "Succeeded",
            MissionPhase::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// Aggregated lifecycle verdict for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeStatus {
    Running,
    Succeeded,
    Failed,
}

/// Consistent snapshot of every agent status plus the top-level path action,
/// taken once per tick before aggregation
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub agents: HashMap<String, AgentStatus>,
    pub path_status: GoalStatus,
    pub taken_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// First agent in failure state, for the human-readable reason
    pub fn failed_agent(&self) -> Option<(&str, AgentStatus)> {
        self.agents
            .iter()
            .find(|(_, status)| status.is_failure())
            .map(|(id, status)| (id.as_str(), *status))
    }
}

/// Composite precedence, evaluated against one snapshot:
/// 1. any agent Aborted/Rejected => Failed (dominant);
/// 2. else top-level Aborted/Canceled/unknown => Failed;
/// 3. else top-level Succeeded and no agent Unstarted/Pending => Succeeded;
/// 4. else Running.
///
/// Stickiness (`failure_latched`) lives with the caller: once a goal has
/// latched Failed, later Running observations never revert it.
pub fn composite_status(snapshot: &StatusSnapshot, failure_latched: bool) -> CompositeStatus {
    if failure_latched {
        return CompositeStatus::Failed;
    }
    if snapshot.agents.values().any(|s| s.is_failure()) {
        return CompositeStatus::Failed;
    }
    match snapshot.path_status {
        GoalStatus::Aborted | GoalStatus::Canceled | GoalStatus::Rejected | GoalStatus::Unknown => {
            CompositeStatus::Failed
        }
        GoalStatus::Succeeded => {
            if snapshot.agents.values().any(|s| s.is_unsettled()) {
                CompositeStatus::Running
            } else {
                CompositeStatus::Succeeded
            }
        }
        GoalStatus::Pending | GoalStatus::Accepted | GoalStatus::Executing => {
            CompositeStatus::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(agents: &[(&str, AgentStatus)], path: GoalStatus) -> StatusSnapshot {
        StatusSnapshot {
            agents: agents
                .iter()
                .map(|(id, s)| (id.to_string(), *s))
                .collect(),
            path_status: path,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn test_agent_abort_dominates_path_success() {
        let snap = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Aborted),
            ],
            GoalStatus::Succeeded,
        );
        assert_eq!(composite_status(&snap, false), CompositeStatus::Failed);
    }

    #[test]
    fn test_agent_rejection_dominates() {
        let snap = snapshot(&[("drone0", AgentStatus::Rejected)], GoalStatus::Executing);
        assert_eq!(composite_status(&snap, false), CompositeStatus::Failed);
    }

    #[test]
    fn test_path_abort_fails_running_fleet() {
        let snap = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Running),
            ],
            GoalStatus::Aborted,
        );
        assert_eq!(composite_status(&snap, false), CompositeStatus::Failed);
    }

    #[test]
    fn test_unknown_path_result_fails() {
        let snap = snapshot(&[("drone0", AgentStatus::Running)], GoalStatus::Unknown);
        assert_eq!(composite_status(&snap, false), CompositeStatus::Failed);
    }

    #[test]
    fn test_success_requires_settled_fleet() {
        let pending = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Pending),
            ],
            GoalStatus::Succeeded,
        );
        assert_eq!(composite_status(&pending, false), CompositeStatus::Running);

        let unstarted = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Unstarted),
            ],
            GoalStatus::Succeeded,
        );
        assert_eq!(
            composite_status(&unstarted, false),
            CompositeStatus::Running
        );

        let settled = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Succeeded),
            ],
            GoalStatus::Succeeded,
        );
        assert_eq!(
            composite_status(&settled, false),
            CompositeStatus::Succeeded
        );
    }

    #[test]
    fn test_running_while_path_executes() {
        let snap = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Running),
            ],
            GoalStatus::Executing,
        );
        assert_eq!(composite_status(&snap, false), CompositeStatus::Running);
    }

    #[test]
    fn test_latched_failure_is_sticky() {
        let healthy = snapshot(
            &[
                ("drone0", AgentStatus::Running),
                ("drone1", AgentStatus::Running),
            ],
            GoalStatus::Executing,
        );
        assert_eq!(composite_status(&healthy, true), CompositeStatus::Failed);
    }
}
