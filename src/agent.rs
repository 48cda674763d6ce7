//! AgentController: one controller per drone in the formation
//!
//! Each controller owns exactly one in-flight follow-reference goal, a
//! cached world-frame pose fed by the external localization stream, and the
//! agent's fixed slot offset. Controllers share no mutable state, so fleet
//! initialization works sequentially or concurrently.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::actions::{
    ActionHandle, FollowReferenceClient, FollowReferenceGoal, GoalStatus, YawMode,
};
use crate::error::{Result, SwarmError};
use crate::geometry::{Pose, Vec3};

/// Agent lifecycle status as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// No reference goal has been sent yet
    Unstarted,
    /// Goal sent, remote decision outstanding
    Pending,
    /// Remote Accepted/Executing/Succeeded: slot tracking is an ongoing
    /// condition, not a milestone
    Running,
    Succeeded,
    Aborted,
    Rejected,
}

impl AgentStatus {
    /// Aborted and Rejected dominate the composite verdict
    pub fn is_failure(&self) -> bool {
        matches!(self, AgentStatus::Aborted | AgentStatus::Rejected)
    }

    /// Unstarted/Pending block mission success
    pub fn is_unsettled(&self) -> bool {
        matches!(self, AgentStatus::Unstarted | AgentStatus::Pending)
    }
}

/// Shared pose cache; the localization feed writes, snapshots read
pub type PoseCache = Arc<RwLock<Option<Pose>>>;

/// Controller for one agent's slot-tracking action
pub struct AgentController {
    id: String,
    /// Fixed slot offset relative to the formation frame, set once
    offset: Pose,
    /// Static slot frame id published for this agent
    ref_frame: String,
    client: Arc<dyn FollowReferenceClient>,
    handle: Option<ActionHandle>,
    pose: PoseCache,
    max_speed: f64,
    init_timeout: Duration,
}

impl AgentController {
    pub fn new(
        id: &str,
        offset: Pose,
        ref_frame: String,
        client: Arc<dyn FollowReferenceClient>,
        max_speed: f64,
        init_timeout: Duration,
    ) -> Self {
        Self {
            id: id.to_string(),
            offset,
            ref_frame,
            client,
            handle: None,
            pose: Arc::new(RwLock::new(None)),
            max_speed,
            init_timeout,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn offset(&self) -> &Pose {
        &self.offset
    }

    pub fn ref_frame(&self) -> &str {
        &self.ref_frame
    }

    /// Clone of the pose cache for the external localization feed
    pub fn pose_cache(&self) -> PoseCache {
        self.pose.clone()
    }

    /// Start the reference-following action targeting this agent's slot
    /// frame. Blocks the calling context for at most `init_timeout` while
    /// waiting for the remote endpoint.
    pub async fn initialize(&mut self) -> Result<()> {
        info!(agent_id = %self.id, frame = %self.ref_frame, "initializing follow-reference");
        if !self.client.wait_for_server(self.init_timeout).await {
            return Err(SwarmError::EndpointUnavailable {
                endpoint: format!("{}/follow_reference", self.id),
                timeout_secs: self.init_timeout.as_secs(),
            });
        }

        let goal = FollowReferenceGoal {
            target_frame: self.ref_frame.clone(),
            // Slot origin: the static frame already encodes the offset
            target: Vec3::ZERO,
            yaw_mode: YawMode::KeepYaw,
            max_speed: Vec3::new(self.max_speed, self.max_speed, self.max_speed),
        };
        let handle = self.client.send_goal(goal).await?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Non-blocking read of the cached remote status
    pub fn observe_status(&self) -> AgentStatus {
        let Some(handle) = &self.handle else {
            return AgentStatus::Unstarted;
        };
        match handle.status() {
            GoalStatus::Pending => AgentStatus::Pending,
            GoalStatus::Accepted | GoalStatus::Executing | GoalStatus::Succeeded => {
                AgentStatus::Running
            }
            GoalStatus::Rejected => AgentStatus::Rejected,
            GoalStatus::Aborted | GoalStatus::Canceled | GoalStatus::Unknown => {
                AgentStatus::Aborted
            }
        }
    }

    /// Update the cached pose (called by the localization feed at sensor rate)
    pub fn record_pose(&self, pose: Pose) {
        if let Ok(mut cache) = self.pose.write() {
            *cache = Some(pose);
        }
    }

    /// Latest cached world-frame pose, if any has arrived
    pub fn latest_pose(&self) -> Option<Pose> {
        self.pose.read().ok().and_then(|cache| *cache)
    }

    /// Best-effort cancel of the in-flight reference action
    pub fn stop(&self) {
        if let Some(handle) = &self.handle {
            warn!(agent_id = %self.id, "stopping follow-reference");
            handle.cancel();
        }
    }

    /// Drop per-goal state at mission completion or abort
    pub fn reset(&mut self) {
        self.handle = None;
    }
}

/// Build the fixed agent roster: compute slot offsets once, publish each
/// static offset frame, and construct one controller per agent.
pub fn build_fleet(
    names: &[String],
    spacing: f64,
    broadcaster: &crate::frames::FrameBroadcaster,
    client_for: impl Fn(&str) -> Arc<dyn FollowReferenceClient>,
    max_speed: f64,
    init_timeout: Duration,
) -> std::collections::HashMap<String, AgentController> {
    let offsets = crate::planner::relative_offsets(names.len(), spacing);
    names
        .iter()
        .zip(offsets)
        .map(|(name, offset)| {
            let ref_frame = broadcaster.publish_static(name, &offset);
            info!(
                agent_id = %name,
                x = offset.position.x,
                y = offset.position.y,
                z = offset.position.z,
                "agent slot assigned"
            );
            let controller = AgentController::new(
                name,
                offset,
                ref_frame,
                client_for(name),
                max_speed,
                init_timeout,
            );
            (name.clone(), controller)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{SimAgentBehavior, SimFollowReference};

    fn controller(client: SimFollowReference) -> AgentController {
        AgentController::new(
            "drone0",
            Pose::from_xyz(0.0, -0.5, 0.0),
            "swarm/drone0_ref".into(),
            Arc::new(client),
            0.5,
            Duration::from_millis(50),
        )
    }

    #[test]
    fn test_unstarted_before_initialize() {
        let ctl = controller(SimFollowReference::tracking());
        assert_eq!(ctl.observe_status(), AgentStatus::Unstarted);
    }

    #[tokio::test]
    async fn test_initialize_reaches_running() {
        let mut ctl = controller(SimFollowReference::tracking());
        ctl.initialize().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ctl.observe_status(), AgentStatus::Running);
    }

    #[tokio::test]
    async fn test_unavailable_endpoint_fails_bounded() {
        let mut ctl = controller(SimFollowReference::unavailable());
        let err = ctl.initialize().await.unwrap_err();
        assert!(matches!(err, SwarmError::EndpointUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_rejected_goal_maps_to_rejected() {
        let mut ctl = controller(SimFollowReference::with_behavior(SimAgentBehavior::Reject));
        ctl.initialize().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ctl.observe_status(), AgentStatus::Rejected);
    }

    #[tokio::test]
    async fn test_concurrent_fleet_init() {
        let mut a = controller(SimFollowReference::tracking());
        let mut b = AgentController::new(
            "drone1",
            Pose::from_xyz(0.0, 0.5, 0.0),
            "swarm/drone1_ref".into(),
            Arc::new(SimFollowReference::tracking()),
            0.5,
            Duration::from_millis(50),
        );
        let (ra, rb) = tokio::join!(a.initialize(), b.initialize());
        ra.unwrap();
        rb.unwrap();
    }

    #[test]
    fn test_build_fleet_publishes_static_frames() {
        let tree = std::sync::Arc::new(crate::frames::FrameTree::new());
        let broadcaster = crate::frames::FrameBroadcaster::new(tree.clone(), "earth", "swarm");
        let names = vec!["drone0".to_string(), "drone1".to_string()];
        let fleet = build_fleet(
            &names,
            1.0,
            &broadcaster,
            |_| Arc::new(SimFollowReference::tracking()),
            0.5,
            Duration::from_secs(5),
        );
        assert_eq!(fleet.len(), 2);
        assert!(tree.has_frame("swarm/drone0_ref"));
        assert!(tree.has_frame("swarm/drone1_ref"));
        // Slots symmetric about the formation origin
        let a = fleet["drone0"].offset().position.y;
        let b = fleet["drone1"].offset().position.y;
        assert!((a + b).abs() < 1e-9);
    }

    #[test]
    fn test_pose_cache_roundtrip() {
        let ctl = controller(SimFollowReference::tracking());
        assert!(ctl.latest_pose().is_none());
        ctl.record_pose(Pose::from_xyz(1.0, 2.0, 3.0));
        assert_eq!(ctl.latest_pose().unwrap().position.x, 1.0);
    }
}
