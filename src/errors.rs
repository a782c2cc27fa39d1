use thiserror::Error;

use crate::domain::errors::{GatewayError, ValidationError};
use crate::domain::order::OrderId;

const DUPLICATE_MESSAGE: &str = "An order already exists for this area today";
const RETRY_MESSAGE: &str = "Could not reach the order service, please try again";

/// Everything a composition session can report back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// The availability probe could not complete; the area stays blocked.
    #[error("Could not verify area availability: {0}")]
    CheckFailed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An order already exists for the area and day, found either by the
    /// pre-submit re-check or by the server's 409.
    #[error("{message}")]
    DuplicateRejected {
        existing_order_id: Option<OrderId>,
        message: String,
    },

    /// Any other 4xx; the message comes from the server when it sent one.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(String),

    #[error("The selected area is not available for a new order")]
    NotAvailable,

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("The order form was closed")]
    Closed,
}

impl ComposeError {
    pub fn duplicate(existing_order_id: Option<OrderId>) -> Self {
        ComposeError::DuplicateRejected {
            existing_order_id,
            message: DUPLICATE_MESSAGE.to_string(),
        }
    }

    /// Whether repeating the same action may succeed without user edits.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ComposeError::CheckFailed(_) | ComposeError::Transport(_)
        )
    }
}

impl From<GatewayError> for ComposeError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Conflict(message) => ComposeError::DuplicateRejected {
                existing_order_id: None,
                message: if message.trim().is_empty() {
                    DUPLICATE_MESSAGE.to_string()
                } else {
                    message
                },
            },
            GatewayError::Rejected { message, .. } => ComposeError::Rejected(message),
            GatewayError::NotFound => ComposeError::Rejected("Order not found".to_string()),
            GatewayError::Server { .. }
            | GatewayError::Timeout
            | GatewayError::Transport(_)
            | GatewayError::Decode(_) => ComposeError::Transport(RETRY_MESSAGE.to_string()),
        }
    }
}
