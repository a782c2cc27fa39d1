use thiserror::Error;

/// Local, pre-submission failures. None of these involve the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select an area before submitting")]
    MissingArea,
    #[error("Select the user placing the order")]
    MissingUser,
    #[error("The area of an existing order cannot be changed")]
    AreaLocked,
    #[error("Area id must be a positive integer, got {0}")]
    InvalidArea(i64),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Add at least one product to the order")]
    NoItems,
    #[error("Line {line}: select a product")]
    MissingProduct { line: usize },
    #[error("Line {line}: select a unit of measure")]
    MissingUnit { line: usize },
    #[error("Line {line}: quantity must be greater than zero")]
    NonPositiveQuantity { line: usize },
    #[error("Line {line}: quantity allows at most 2 decimal places")]
    TooManyDecimals { line: usize },
    #[error("Line {line}: price cannot be negative")]
    NegativePrice { line: usize },
    #[error("Invalid quantity '{0}'")]
    UnparsableQuantity(String),
    #[error("Line {0} does not exist")]
    UnknownLine(usize),
}

/// Failures reported by the order service port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found")]
    NotFound,
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Request timed out")]
    Timeout,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    Decode(String),
}
