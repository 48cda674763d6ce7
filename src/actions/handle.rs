//! In-flight action goal handles
//!
//! A handle is the client-side view of one remote goal: a watch channel
//! caches the latest remote status (updated asynchronously by the transport
//! or sim server), and a small mpsc channel carries best-effort cancel
//! requests the other way. Status reads never block.

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::client::PathFeedback;

/// Remote goal lifecycle as reported by the action server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    /// Goal sent, no server decision yet
    Pending,
    /// Server accepted the goal
    Accepted,
    /// Server is executing the goal
    Executing,
    Succeeded,
    Aborted,
    Canceled,
    /// Server rejected the goal outright
    Rejected,
    /// Result code the client cannot interpret
    Unknown,
}

/// Server-side ends of a handle pair; kept by the transport or sim server
pub struct ServerLink {
    pub status_tx: watch::Sender<GoalStatus>,
    pub cancel_rx: mpsc::Receiver<()>,
}

/// Client-side handle for one in-flight follow-reference goal
#[derive(Debug, Clone)]
pub struct ActionHandle {
    status_rx: watch::Receiver<GoalStatus>,
    cancel_tx: mpsc::Sender<()>,
}

impl ActionHandle {
    /// Create a connected handle/server pair
    pub fn pair() -> (ActionHandle, ServerLink) {
        let (status_tx, status_rx) = watch::channel(GoalStatus::Pending);
        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        (
            ActionHandle {
                status_rx,
                cancel_tx,
            },
            ServerLink {
                status_tx,
                cancel_rx,
            },
        )
    }

    /// Non-blocking read of the cached remote status
    pub fn status(&self) -> GoalStatus {
        *self.status_rx.borrow()
    }

    /// Best-effort cancel request; a full cancel queue means one is already
    /// pending, which is equivalent.
    pub fn cancel(&self) {
        if self.cancel_tx.try_send(()).is_err() {
            debug!("cancel request already pending or server gone");
        }
    }
}

/// Client-side handle for the top-level follow-path goal; adds the feedback
/// stream to the base status/cancel pair
#[derive(Debug, Clone)]
pub struct PathActionHandle {
    inner: ActionHandle,
    feedback_rx: watch::Receiver<Option<PathFeedback>>,
}

/// Server-side ends for a path goal
pub struct PathServerLink {
    pub link: ServerLink,
    pub feedback_tx: watch::Sender<Option<PathFeedback>>,
}

impl PathActionHandle {
    pub fn pair() -> (PathActionHandle, PathServerLink) {
        let (inner, link) = ActionHandle::pair();
        let (feedback_tx, feedback_rx) = watch::channel(None);
        (
            PathActionHandle { inner, feedback_rx },
            PathServerLink { link, feedback_tx },
        )
    }

    pub fn status(&self) -> GoalStatus {
        self.inner.status()
    }

    /// Latest feedback frame, None until the server has emitted one
    pub fn last_feedback(&self) -> Option<PathFeedback> {
        *self.feedback_rx.borrow()
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_starts_pending() {
        let (handle, _link) = ActionHandle::pair();
        assert_eq!(handle.status(), GoalStatus::Pending);
    }

    #[test]
    fn test_status_updates_are_visible_without_blocking() {
        let (handle, link) = ActionHandle::pair();
        link.status_tx.send(GoalStatus::Executing).unwrap();
        assert_eq!(handle.status(), GoalStatus::Executing);
        link.status_tx.send(GoalStatus::Aborted).unwrap();
        assert_eq!(handle.status(), GoalStatus::Aborted);
    }

    #[test]
    fn test_cancel_reaches_server_side() {
        let (handle, mut link) = ActionHandle::pair();
        handle.cancel();
        assert!(link.cancel_rx.try_recv().is_ok());
    }

    #[test]
    fn test_repeated_cancel_is_best_effort() {
        let (handle, _link) = ActionHandle::pair();
        handle.cancel();
        // Queue full; second request is a no-op, not a panic
        handle.cancel();
    }

    #[test]
    fn test_path_handle_feedback_cache() {
        let (handle, link) = PathActionHandle::pair();
        assert!(handle.last_feedback().is_none());
        link.feedback_tx
            .send(Some(PathFeedback {
                actual_distance_to_next_waypoint: 1.25,
            }))
            .unwrap();
        assert_eq!(
            handle.last_feedback().unwrap().actual_distance_to_next_waypoint,
            1.25
        );
    }
}
