//! Mission goal, feedback, and result types
//!
//! The inbound mission surface: one goal per formation path request,
//! per-tick feedback while tracking, one result on completion.

use serde::{Deserialize, Serialize};

use crate::geometry::Pose;

/// One waypoint of the formation path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Non-empty, unique within the path
    pub id: String,
    pub pose: Pose,
}

impl Waypoint {
    pub fn new(id: &str, pose: Pose) -> Self {
        Self {
            id: id.to_string(),
            pose,
        }
    }
}

/// Swarm-wide yaw setting carried by the goal
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YawAngle {
    pub angle: f64,
}

/// High-level path request for the whole formation.
///
/// Invariants (enforced in validation, not construction): non-empty path,
/// non-empty frame id, unique non-empty waypoint ids, max_speed >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionGoal {
    /// Frame the path and yaw are expressed in
    pub frame_id: String,
    /// Ordered waypoint sequence
    pub path: Vec<Waypoint>,
    /// Formation yaw along the path
    pub yaw_swarm: YawAngle,
    /// Centroid speed cap (m/s)
    pub max_speed: f64,
}

/// Per-tick feedback while the mission is tracking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionFeedback {
    pub actual_distance_to_next_waypoint: f64,
}

/// Final mission verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionResult {
    pub swarm_success: bool,
    /// Human-readable reason when the mission did not succeed
    pub reason: Option<String>,
}

impl MissionResult {
    pub fn success() -> Self {
        Self {
            swarm_success: true,
            reason: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            swarm_success: false,
            reason: Some(reason.into()),
        }
    }
}
