use thiserror::Error;

/// Main error type for the swarm coordination engine
#[derive(Error, Debug)]
pub enum SwarmError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Goal validation errors, rejected before any side effect
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Frame conversion failed: cannot express '{frame}' in '{target}'")]
    FrameConversion { frame: String, target: String },

    // Action endpoint errors
    #[error("Action endpoint '{endpoint}' unavailable after {timeout_secs}s")]
    EndpointUnavailable { endpoint: String, timeout_secs: u64 },

    #[error("Action goal rejected by '{endpoint}': {reason}")]
    GoalRejected { endpoint: String, reason: String },

    // Remote execution errors
    #[error("Remote action aborted: {0}")]
    RemoteAbort(String),

    // Trajectory generation errors, treated as goal rejection
    #[error("Trajectory generation failed: {0}")]
    Generation(String),

    // State machine errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Mission cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SwarmError
pub type Result<T> = std::result::Result<T, SwarmError>;
