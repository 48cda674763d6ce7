//! Coordinator control messages and mission submission payloads

use tokio::sync::{mpsc, oneshot};

use crate::mission::{MissionFeedback, MissionGoal, MissionResult};

/// One mission submission: the goal plus its reply channels.
///
/// The result arrives exactly once over the oneshot; feedback frames stream
/// over the mpsc sender while the mission is tracking.
#[derive(Debug)]
pub struct MissionRequest {
    pub goal: MissionGoal,
    pub feedback_tx: mpsc::Sender<MissionFeedback>,
    pub result_tx: oneshot::Sender<MissionResult>,
}

/// Control commands sent to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorControlCommand {
    /// Gate the coordinator's own polling; in-flight remote actions are
    /// untouched
    Pause,
    /// Resume polling after a pause
    Resume,
    /// Cancel the active mission: async-cancel the top-level action,
    /// best-effort cancel every agent action
    Cancel,
    /// Stop the run loop after cleaning up any active mission
    Shutdown,
}
