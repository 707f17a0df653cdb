use thiserror::Error;

/// Message delivered when the target service does not expose an action.
pub const UNSUPPORTED_ACTION: &str = "service not support this action.";

/// Errors raised while decoding action outputs and event payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Displays as [`UNSUPPORTED_ACTION`]; carries the action name.
    #[error("service not support this action.")]
    UnsupportedAction(String),
    #[error("Missing {0} element in action output")]
    MissingOutputArgument(String),
    #[error("Invalid {0} value: {1}")]
    InvalidOutputArgument(String, String),
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
    #[error("Cannot parse event payload: {0}")]
    EventPayload(String),
}

impl ControlError {
    pub fn unsupported_action(action: &str) -> Self {
        ControlError::UnsupportedAction(action.to_string())
    }

    pub fn missing_output_argument(name: &str) -> Self {
        ControlError::MissingOutputArgument(name.to_string())
    }

    pub fn invalid_output_argument(name: &str, value: &str) -> Self {
        ControlError::InvalidOutputArgument(name.to_string(), value.to_string())
    }

    pub fn event_payload(message: impl Into<String>) -> Self {
        ControlError::EventPayload(message.into())
    }
}
