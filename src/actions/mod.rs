//! Asynchronous remote-action plumbing
//!
//! The engine consumes two downstream actions it does not reimplement: the
//! per-agent follow-reference action and the top-level follow-path action.
//! `client` holds the trait seams and goal types, `handle` the in-flight
//! goal handles, `sim` the in-process servers used by the demo binary and
//! the integration tests.

pub mod client;
pub mod handle;
pub mod sim;

pub use client::{
    FollowPathClient, FollowPathGoal, FollowReferenceClient, FollowReferenceGoal, PathFeedback,
    YawMode,
};
pub use handle::{ActionHandle, GoalStatus, PathActionHandle, PathServerLink, ServerLink};
pub use sim::{SimAgentBehavior, SimFollowPath, SimFollowReference, SimPathOutcome};
