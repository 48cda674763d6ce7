//! Coordinate-frame hierarchy: registry + broadcaster
//!
//! `FrameTree` is an in-process registry of parent->child transforms
//! (world->formation dynamic, formation->agent-offset static). The
//! `FrameBroadcaster` owns the publishing side: static agent-offset frames
//! once at construction, the world->formation transform every scheduler tick.
//! Conversion is only exercised during goal validation, where a failure
//! rejects the goal rather than surfacing as a runtime fault.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Result, SwarmError};
use crate::geometry::{Pose, Transform};

/// Maximum parent hops when resolving a frame to its root (cycle guard)
const MAX_FRAME_DEPTH: usize = 64;

#[derive(Debug, Clone)]
struct FrameEntry {
    parent: String,
    transform: Transform,
}

/// Registry of frames keyed by child frame id, each holding its parent link
#[derive(Debug, Default)]
pub struct FrameTree {
    frames: DashMap<String, FrameEntry>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the `parent -> child` transform
    pub fn set_transform(&self, parent: &str, child: &str, transform: Transform) {
        self.frames.insert(
            child.to_string(),
            FrameEntry {
                parent: parent.to_string(),
                transform,
            },
        );
    }

    /// Whether `frame` is known, either as a registered child or as a root
    pub fn has_frame(&self, frame: &str) -> bool {
        self.frames.contains_key(frame)
            || self
                .frames
                .iter()
                .any(|entry| entry.value().parent == frame)
    }

    /// Resolve the transform mapping `frame` coordinates into its root frame
    fn to_root(&self, frame: &str) -> Result<(String, Transform)> {
        let mut current = frame.to_string();
        let mut acc = Transform::IDENTITY;
        for _ in 0..MAX_FRAME_DEPTH {
            match self.frames.get(&current) {
                Some(entry) => {
                    acc = entry.transform.compose(&acc);
                    current = entry.parent.clone();
                }
                None => return Ok((current, acc)),
            }
        }
        Err(SwarmError::Internal(format!(
            "frame hierarchy too deep or cyclic at '{frame}'"
        )))
    }

    /// Express a pose given in `from` coordinates in the `to` frame.
    ///
    /// Both frames must resolve to the same root; anything else is a
    /// conversion failure.
    pub fn convert_pose(&self, pose: &Pose, from: &str, to: &str) -> Result<Pose> {
        if from == to {
            return Ok(*pose);
        }
        let conversion_err = || SwarmError::FrameConversion {
            frame: from.to_string(),
            target: to.to_string(),
        };
        if !self.has_frame(from) || !self.has_frame(to) {
            return Err(conversion_err());
        }
        let (root_from, from_to_root) = self.to_root(from)?;
        let (root_to, to_to_root) = self.to_root(to)?;
        if root_from != root_to {
            return Err(conversion_err());
        }
        Ok(to_to_root.inverse().compose(&from_to_root).apply_pose(pose))
    }

    /// Convert a yaw angle expressed in `from` into the `to` frame
    pub fn convert_yaw(&self, yaw: f64, from: &str, to: &str) -> Result<f64> {
        let pose = Pose::from_xyz_yaw(0.0, 0.0, 0.0, yaw);
        Ok(self.convert_pose(&pose, from, to)?.orientation.yaw())
    }
}

/// Publishes the formation frame hierarchy into the shared tree.
///
/// world->formation is dynamic (refreshed each tick from the latest
/// centroid); formation->agent-offset frames are static, published once per
/// agent. Publishing is fire-and-forget with no failure path.
pub struct FrameBroadcaster {
    tree: Arc<FrameTree>,
    world_frame: String,
    formation_frame: String,
}

impl FrameBroadcaster {
    pub fn new(tree: Arc<FrameTree>, world_frame: &str, formation_frame: &str) -> Self {
        Self {
            tree,
            world_frame: world_frame.to_string(),
            formation_frame: formation_frame.to_string(),
        }
    }

    pub fn world_frame(&self) -> &str {
        &self.world_frame
    }

    pub fn formation_frame(&self) -> &str {
        &self.formation_frame
    }

    /// Frame id of one agent's static slot frame
    pub fn agent_ref_frame(&self, agent_id: &str) -> String {
        format!("{}/{}_ref", self.formation_frame, agent_id)
    }

    /// Publish the static formation->agent-offset frame (once per agent)
    pub fn publish_static(&self, agent_id: &str, offset: &Pose) -> String {
        let child = self.agent_ref_frame(agent_id);
        self.tree
            .set_transform(&self.formation_frame, &child, Transform::from_pose(offset));
        debug!(agent_id, frame = %child, "published static agent offset frame");
        child
    }

    /// Refresh the dynamic world->formation transform from the latest centroid
    pub fn publish_dynamic(&self, centroid: &Pose) {
        self.tree.set_transform(
            &self.world_frame,
            &self.formation_frame,
            Transform::from_pose(centroid),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    fn broadcaster() -> (Arc<FrameTree>, FrameBroadcaster) {
        let tree = Arc::new(FrameTree::new());
        let bc = FrameBroadcaster::new(tree.clone(), "earth", "swarm");
        (tree, bc)
    }

    #[test]
    fn test_identity_conversion() {
        let (tree, _bc) = broadcaster();
        let pose = Pose::from_xyz(1.0, 2.0, 3.0);
        let out = tree.convert_pose(&pose, "earth", "earth").unwrap();
        assert_eq!(out, pose);
    }

    #[test]
    fn test_unknown_frame_is_conversion_failure() {
        let (tree, bc) = broadcaster();
        bc.publish_dynamic(&Pose::from_xyz(0.0, 0.0, 0.0));
        let pose = Pose::from_xyz(1.0, 0.0, 0.0);
        let err = tree.convert_pose(&pose, "odom", "earth").unwrap_err();
        assert!(matches!(err, SwarmError::FrameConversion { .. }));
    }

    #[test]
    fn test_formation_pose_resolves_to_world() {
        let (tree, bc) = broadcaster();
        bc.publish_dynamic(&Pose::from_xyz(6.0, 0.0, 1.5));
        let slot = Pose::from_xyz(0.0, 1.0, 0.0);
        let world = tree.convert_pose(&slot, "swarm", "earth").unwrap();
        assert!((world.position.x - 6.0).abs() < 1e-9);
        assert!((world.position.y - 1.0).abs() < 1e-9);
        assert!((world.position.z - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_static_agent_frame_chains_through_formation() {
        let (tree, bc) = broadcaster();
        bc.publish_dynamic(&Pose::from_xyz(6.0, 0.0, 1.5));
        let frame = bc.publish_static("drone0", &Pose::from_xyz(0.0, -0.5, 0.0));
        let origin = Pose::default();
        let world = tree.convert_pose(&origin, &frame, "earth").unwrap();
        assert!((world.position.y + 0.5).abs() < 1e-9);
        assert!((world.position.z - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_dynamic_republish_overwrites() {
        let (tree, bc) = broadcaster();
        bc.publish_dynamic(&Pose::from_xyz(0.0, 0.0, 0.0));
        bc.publish_dynamic(&Pose::from_xyz(2.0, 0.0, 1.0));
        let origin = Pose::default();
        let world = tree.convert_pose(&origin, "swarm", "earth").unwrap();
        assert!((world.position.x - 2.0).abs() < 1e-9);
    }
}
