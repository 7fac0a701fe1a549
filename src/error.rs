use crate::session::LifecycleState;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, DemoError>;

/// The Error type for broker demo operations.
#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Queueing system error: {0}")]
    QueueError(String),

    #[error("Failed to declare {entity} '{name}': {reason}")]
    DeclareError {
        entity: &'static str,
        name: String,
        reason: String,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("Message handler failed: {0}")]
    HandlerError(String),
}

// lapin errors carry connection state we don't need past this point, so they
// are flattened into a message.
impl From<lapin::Error> for DemoError {
    fn from(err: lapin::Error) -> Self {
        DemoError::QueueError(err.to_string())
    }
}
