//! FormationCoordinator: top-level mission sequencer
//!
//! Owns the agent roster, the frame broadcaster, and the trajectory sampler.
//! Missions arrive via `CoordinatorHandle` (clone-friendly). The main `run()`
//! loop uses `tokio::select!` to:
//!   - Process control commands (pause/resume/cancel/shutdown)
//!   - Accept mission submissions (validate, init fleet, launch path action)
//!   - Drive one unified scheduler tick: refresh the formation frame from
//!     the latest centroid, snapshot all statuses, aggregate, emit feedback
//!
//! State machine: Idle -> Validating -> Initializing -> Tracking ->
//! {Succeeded, Failed}. Failure is sticky for the lifetime of a goal.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::actions::{FollowPathClient, FollowPathGoal, GoalStatus, PathActionHandle};
use crate::agent::AgentController;
use crate::error::{Result, SwarmError};
use crate::frames::{FrameBroadcaster, FrameTree};
use crate::geometry::{Pose, Quaternion};
use crate::mission::{MissionFeedback, MissionGoal, MissionResult};
use crate::trajectory::TrajectorySampler;

use super::command::{CoordinatorControlCommand, MissionRequest};
use super::config::CoordinatorConfig;
use super::state::{composite_status, CompositeStatus, MissionPhase, StatusSnapshot};

/// Clonable handle for submitting missions and control commands
#[derive(Clone)]
pub struct CoordinatorHandle {
    mission_tx: mpsc::Sender<MissionRequest>,
    control_tx: mpsc::Sender<CoordinatorControlCommand>,
    feedback_buffer: usize,
}

impl CoordinatorHandle {
    /// Submit a mission goal. Returns the feedback stream and the oneshot
    /// result channel; rejection reasons arrive through the result.
    pub async fn submit_mission(
        &self,
        goal: MissionGoal,
    ) -> Result<(
        mpsc::Receiver<MissionFeedback>,
        oneshot::Receiver<MissionResult>,
    )> {
        let (feedback_tx, feedback_rx) = mpsc::channel(self.feedback_buffer);
        let (result_tx, result_rx) = oneshot::channel();
        self.mission_tx
            .send(MissionRequest {
                goal,
                feedback_tx,
                result_tx,
            })
            .await
            .map_err(|_| SwarmError::Internal("coordinator mission channel closed".into()))?;
        Ok((feedback_rx, result_rx))
    }

    /// Pause the coordinator's polling; in-flight remote actions keep running
    pub async fn pause(&self) -> Result<()> {
        self.send_control(CoordinatorControlCommand::Pause).await
    }

    /// Resume polling after a pause
    pub async fn resume(&self) -> Result<()> {
        self.send_control(CoordinatorControlCommand::Resume).await
    }

    /// Cancel the active mission (async cancel to the top-level action,
    /// best-effort cancels to every agent action)
    pub async fn cancel(&self) -> Result<()> {
        self.send_control(CoordinatorControlCommand::Cancel).await
    }

    /// Stop the coordinator after cleaning up any active mission
    pub async fn shutdown(&self) -> Result<()> {
        self.send_control(CoordinatorControlCommand::Shutdown).await
    }

    async fn send_control(&self, cmd: CoordinatorControlCommand) -> Result<()> {
        self.control_tx
            .send(cmd)
            .await
            .map_err(|_| SwarmError::Internal("coordinator control channel closed".into()))
    }
}

/// Per-goal state, created on acceptance and dropped on completion or abort
struct ActiveMission {
    id: Uuid,
    goal: MissionGoal,
    path_handle: PathActionHandle,
    feedback_tx: mpsc::Sender<MissionFeedback>,
    result_tx: oneshot::Sender<MissionResult>,
    /// Mission clock driving trajectory sampling; frozen while paused
    elapsed: f64,
    /// Sticky: set on the first Failed verdict, never cleared within a goal
    failure_latched: bool,
}

/// The FormationCoordinator: owns the fleet and runs the mission loop
pub struct Coordinator {
    config: CoordinatorConfig,
    agents: HashMap<String, AgentController>,
    frame_tree: Arc<FrameTree>,
    broadcaster: FrameBroadcaster,
    sampler: TrajectorySampler,
    path_client: Arc<dyn FollowPathClient>,
    /// Formation centroid; written only from the scheduler tick
    centroid: Pose,
    phase: MissionPhase,
    paused: bool,
    active: Option<ActiveMission>,

    mission_rx: mpsc::Receiver<MissionRequest>,
    control_rx: mpsc::Receiver<CoordinatorControlCommand>,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: CoordinatorConfig,
        agents: HashMap<String, AgentController>,
        frame_tree: Arc<FrameTree>,
        broadcaster: FrameBroadcaster,
        sampler: TrajectorySampler,
        path_client: Arc<dyn FollowPathClient>,
        initial_centroid: Pose,
    ) -> (Self, CoordinatorHandle) {
        let (mission_tx, mission_rx) = mpsc::channel(4);
        let (control_tx, control_rx) = mpsc::channel(8);

        // Seed the dynamic frame so conversions work before the first goal
        broadcaster.publish_dynamic(&initial_centroid);

        let handle = CoordinatorHandle {
            mission_tx,
            control_tx,
            feedback_buffer: config.feedback_buffer,
        };
        let coordinator = Self {
            config,
            agents,
            frame_tree,
            broadcaster,
            sampler,
            path_client,
            centroid: initial_centroid,
            phase: MissionPhase::Idle,
            paused: false,
            active: None,
            mission_rx,
            control_rx,
        };
        (coordinator, handle)
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    /// Main coordinator loop; returns after a Shutdown command or once all
    /// handles are dropped
    pub async fn run(mut self) {
        info!(
            agents = self.agents.len(),
            tick_ms = self.config.tick_ms,
            "formation coordinator starting"
        );

        let mut tick = tokio::time::interval(Duration::from_millis(self.config.tick_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.control_rx.recv() => {
                    match cmd {
                        Some(CoordinatorControlCommand::Pause) => {
                            info!("coordinator polling paused");
                            self.paused = true;
                        }
                        Some(CoordinatorControlCommand::Resume) => {
                            info!("coordinator polling resumed");
                            self.paused = false;
                        }
                        Some(CoordinatorControlCommand::Cancel) => {
                            self.cancel_active("mission cancelled");
                        }
                        Some(CoordinatorControlCommand::Shutdown) | None => {
                            self.cancel_active("coordinator shutdown");
                            break;
                        }
                    }
                }

                req = self.mission_rx.recv() => {
                    match req {
                        Some(req) => self.handle_mission_request(req).await,
                        None => break,
                    }
                }

                _ = tick.tick() => {
                    if !self.paused {
                        self.on_tick();
                    }
                }
            }
        }

        info!("formation coordinator stopped");
    }

    // --- Goal intake -----------------------------------------------------

    async fn handle_mission_request(&mut self, req: MissionRequest) {
        if self.active.is_some() {
            warn!("mission rejected: another mission is active");
            let _ = req
                .result_tx
                .send(MissionResult::failure("another mission is active"));
            return;
        }

        self.phase = MissionPhase::Validating;
        let goal = match self.validate_goal(&req.goal) {
            Ok(goal) => goal,
            Err(e) => {
                warn!(error = %e, "mission goal rejected");
                let _ = req.result_tx.send(MissionResult::failure(e.to_string()));
                self.phase = MissionPhase::Idle;
                return;
            }
        };

        let mission_id = Uuid::new_v4();
        info!(
            %mission_id,
            waypoints = goal.path.len(),
            max_speed = goal.max_speed,
            "mission accepted, initializing fleet"
        );
        self.phase = MissionPhase::Initializing;

        let path_handle = match self.initialize_mission(&goal).await {
            Ok(handle) => handle,
            Err(e) => {
                error!(%mission_id, error = %e, "mission initialization failed");
                // No partial fleet is left running
                self.stop_fleet();
                self.reset_fleet();
                let _ = req.result_tx.send(MissionResult::failure(e.to_string()));
                self.phase = MissionPhase::Idle;
                return;
            }
        };

        self.active = Some(ActiveMission {
            id: mission_id,
            goal,
            path_handle,
            feedback_tx: req.feedback_tx,
            result_tx: req.result_tx,
            elapsed: 0.0,
            failure_latched: false,
        });
        self.phase = MissionPhase::Tracking;
        info!(%mission_id, "mission tracking");
    }

    /// Validate and normalize a goal into the reference frame.
    ///
    /// Rejections happen before any side effect; a frame-conversion failure
    /// is a rejection, not a runtime fault.
    fn validate_goal(&self, goal: &MissionGoal) -> Result<MissionGoal> {
        if goal.path.is_empty() {
            return Err(SwarmError::Validation("path is empty".into()));
        }
        if goal.frame_id.trim().is_empty() {
            return Err(SwarmError::Validation("frame id is empty".into()));
        }
        if goal.max_speed < 0.0 {
            return Err(SwarmError::Validation(format!(
                "max_speed must be >= 0, got {}",
                goal.max_speed
            )));
        }
        let mut seen = HashSet::new();
        for wp in &goal.path {
            if wp.id.trim().is_empty() {
                return Err(SwarmError::Validation("waypoint id is empty".into()));
            }
            if !seen.insert(wp.id.as_str()) {
                return Err(SwarmError::Validation(format!(
                    "duplicate waypoint id '{}'",
                    wp.id
                )));
            }
        }

        let reference = self.broadcaster.world_frame();
        if goal.frame_id == reference {
            return Ok(goal.clone());
        }

        // Express every waypoint pose and the swarm yaw in the reference frame
        let mut normalized = goal.clone();
        for wp in &mut normalized.path {
            wp.pose = self
                .frame_tree
                .convert_pose(&wp.pose, &goal.frame_id, reference)?;
        }
        normalized.yaw_swarm.angle =
            self.frame_tree
                .convert_yaw(goal.yaw_swarm.angle, &goal.frame_id, reference)?;
        normalized.frame_id = reference.to_string();
        Ok(normalized)
    }

    // --- Initializing -----------------------------------------------------

    async fn initialize_mission(&mut self, goal: &MissionGoal) -> Result<PathActionHandle> {
        // Fleet init is order-independent; run all agents concurrently
        let mut ids = Vec::with_capacity(self.agents.len());
        let mut inits = Vec::with_capacity(self.agents.len());
        for (id, agent) in self.agents.iter_mut() {
            ids.push(id.clone());
            inits.push(agent.initialize());
        }
        let results = futures::future::join_all(inits).await;
        for (id, result) in ids.iter().zip(results) {
            if let Err(e) = result {
                return Err(SwarmError::Internal(format!(
                    "agent '{id}' failed to initialize: {e}"
                )));
            }
        }

        // Replace the trajectory command wholesale; a generation failure
        // rejects the goal
        self.sampler
            .set_waypoints(&self.centroid, &goal.path, goal.max_speed)?;

        let timeout = Duration::from_secs(self.config.init_timeout_secs);
        if !self.path_client.wait_for_server(timeout).await {
            return Err(SwarmError::EndpointUnavailable {
                endpoint: "follow_path".into(),
                timeout_secs: self.config.init_timeout_secs,
            });
        }

        self.path_client
            .send_goal(FollowPathGoal {
                frame_id: goal.frame_id.clone(),
                path: goal.path.clone(),
                yaw: goal.yaw_swarm,
                max_speed: goal.max_speed,
            })
            .await
    }

    // --- Tracking ----------------------------------------------------------

    /// One unified scheduler tick: advance the centroid from the trajectory,
    /// republish the dynamic frame, snapshot every status, aggregate, act.
    fn on_tick(&mut self) {
        let dt = self.config.tick_ms as f64 / 1000.0;

        if let Some(active) = &mut self.active {
            active.elapsed += dt;
            let window = self.sampler.evaluate(active.elapsed);
            if let Some(next) = window.first() {
                self.centroid.position = next.position;
                self.centroid.orientation = Quaternion::from_yaw(active.goal.yaw_swarm.angle);
            }
        }
        // The dynamic frame is refreshed every tick, mission or not
        self.broadcaster.publish_dynamic(&self.centroid);

        let Some(active) = &mut self.active else {
            return;
        };

        // Atomic snapshot of the whole fleet plus the top-level action,
        // taken before any aggregation
        let snapshot = StatusSnapshot {
            agents: self
                .agents
                .iter()
                .map(|(id, agent)| (id.clone(), agent.observe_status()))
                .collect(),
            path_status: active.path_handle.status(),
            taken_at: Utc::now(),
        };
        let verdict = composite_status(&snapshot, active.failure_latched);

        match verdict {
            CompositeStatus::Failed => {
                active.failure_latched = true;
                let reason = describe_failure(&snapshot);
                self.fail_active(reason);
            }
            CompositeStatus::Succeeded => {
                self.complete_active();
            }
            CompositeStatus::Running => match active.path_handle.last_feedback() {
                Some(fb) => {
                    // Never block the tick on a slow feedback consumer
                    let _ = active.feedback_tx.try_send(MissionFeedback {
                        actual_distance_to_next_waypoint: fb.actual_distance_to_next_waypoint,
                    });
                }
                None => debug!("waiting for follow-path feedback"),
            },
        }
    }

    // --- Completion and cleanup --------------------------------------------

    fn fail_active(&mut self, reason: String) {
        let Some(active) = self.active.take() else {
            return;
        };
        error!(mission_id = %active.id, reason = %reason, "mission failed");
        // No orphaned in-flight actions: cancel the top-level path, then
        // best-effort cancel every agent
        active.path_handle.cancel();
        self.stop_fleet();
        self.reset_fleet();
        let _ = active.result_tx.send(MissionResult::failure(reason));
        self.phase = MissionPhase::Failed;
    }

    fn complete_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        info!(mission_id = %active.id, "mission succeeded");
        // Agents keep tracking their slots; only per-goal state is dropped
        self.reset_fleet();
        let _ = active.result_tx.send(MissionResult::success());
        self.phase = MissionPhase::Succeeded;
    }

    fn cancel_active(&mut self, reason: &str) {
        if let Some(active) = self.active.take() {
            info!(mission_id = %active.id, reason, "cancelling active mission");
            active.path_handle.cancel();
            self.stop_fleet();
            self.reset_fleet();
            let _ = active.result_tx.send(MissionResult::failure(reason));
            self.phase = MissionPhase::Idle;
        }
    }

    fn stop_fleet(&self) {
        for agent in self.agents.values() {
            agent.stop();
        }
    }

    fn reset_fleet(&mut self) {
        for agent in self.agents.values_mut() {
            agent.reset();
        }
    }
}

fn describe_failure(snapshot: &StatusSnapshot) -> String {
    if let Some((id, status)) = snapshot.failed_agent() {
        return format!("agent '{id}' reported {status:?}; formation aborted");
    }
    match snapshot.path_status {
        GoalStatus::Aborted => "follow-path was aborted; aborting the swarm's movement".into(),
        GoalStatus::Canceled => "follow-path was canceled; cancelling the swarm's movement".into(),
        GoalStatus::Rejected => "follow-path was rejected by the behavior server".into(),
        _ => "unknown result from follow-path; aborting the swarm's movement".into(),
    }
}
