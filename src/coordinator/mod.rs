//! Formation Coordinator
//!
//! Central sequencer for swarm missions: validates goals, initializes the
//! fleet, launches the top-level path action, and aggregates per-agent and
//! path statuses into one composite verdict per scheduler tick.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod state;

pub use command::{CoordinatorControlCommand, MissionRequest};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use state::{composite_status, CompositeStatus, MissionPhase, StatusSnapshot};
