//! Action-client trait seams and goal types
//!
//! Transport/RPC encoding is out of scope; the engine talks to both
//! downstream actions through these traits. `wait_for_server` carries an
//! explicit timeout so Initializing can fail instead of hanging.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::geometry::Vec3;
use crate::mission::{Waypoint, YawAngle};

use super::handle::{ActionHandle, PathActionHandle};

/// Yaw handling for the reference-following action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum YawMode {
    /// Hold whatever yaw the vehicle currently has
    KeepYaw,
    /// Track a fixed yaw angle (radians)
    Fixed(f64),
}

/// Goal for the per-agent follow-reference action: converge onto a fixed
/// target point in the agent's own offset frame and keep tracking it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowReferenceGoal {
    /// Frame the target is expressed in (the agent's static slot frame)
    pub target_frame: String,
    /// Target point inside `target_frame`; the slot origin for formation flight
    pub target: Vec3,
    pub yaw_mode: YawMode,
    /// Per-axis speed cap (m/s)
    pub max_speed: Vec3,
}

/// Goal for the top-level follow-path action moving the formation centroid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowPathGoal {
    pub frame_id: String,
    pub path: Vec<Waypoint>,
    pub yaw: YawAngle,
    pub max_speed: f64,
}

/// Feedback frame published by the follow-path action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathFeedback {
    pub actual_distance_to_next_waypoint: f64,
}

/// Client for one agent's follow-reference action server
#[async_trait]
pub trait FollowReferenceClient: Send + Sync {
    /// Wait for the remote endpoint, up to `timeout`. Returns false when the
    /// server did not respond in time.
    async fn wait_for_server(&self, timeout: Duration) -> bool;

    /// Send the reference goal; the returned handle caches remote status
    /// updates asynchronously.
    async fn send_goal(&self, goal: FollowReferenceGoal) -> Result<ActionHandle>;
}

/// Client for the top-level follow-path action server
#[async_trait]
pub trait FollowPathClient: Send + Sync {
    async fn wait_for_server(&self, timeout: Duration) -> bool;

    async fn send_goal(&self, goal: FollowPathGoal) -> Result<PathActionHandle>;
}
