pub mod actions;
pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod mission;
pub mod planner;
pub mod trajectory;

pub use actions::{
    ActionHandle, FollowPathClient, FollowPathGoal, FollowReferenceClient, FollowReferenceGoal,
    GoalStatus, PathActionHandle, PathFeedback, SimAgentBehavior, SimFollowPath,
    SimFollowReference, SimPathOutcome, YawMode,
};
pub use agent::{build_fleet, AgentController, AgentStatus};
pub use config::AppConfig;
pub use coordinator::{
    composite_status, CompositeStatus, Coordinator, CoordinatorConfig, CoordinatorHandle,
    MissionPhase, StatusSnapshot,
};
pub use error::{Result, SwarmError};
pub use frames::{FrameBroadcaster, FrameTree};
pub use geometry::{Pose, Quaternion, Transform, Vec3};
pub use mission::{MissionFeedback, MissionGoal, MissionResult, Waypoint, YawAngle};
pub use trajectory::{
    LinearTrajectoryGenerator, Setpoint, TrajectoryCommand, TrajectoryGenerator, TrajectorySampler,
};
