//! Error types for cmdwire.
//!
//! Two layers: [`WireError`] for transport and framing faults that abort a
//! connection or call, and [`CommandError`] for request-level failures that
//! are always converted into an error [`Response`](crate::message::Response)
//! rather than propagated.

use thiserror::Error;

/// Transport-level error for socket, framing and codec operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MsgPack serialization error.
    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Protocol violation (invalid frame header, oversized payload, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connection closed while a call was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// The dispatch queue was closed (server shutting down).
    #[error("dispatch queue closed")]
    QueueClosed,

    /// A client call exceeded its deadline.
    #[error("call timed out")]
    Timeout,
}

/// Result type alias using [`WireError`].
pub type Result<T> = std::result::Result<T, WireError>;

/// Request-level failure, recovered at the worker or transport boundary.
///
/// Every variant maps to an error response; none of these crash the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `command_type` is not a registered tag.
    #[error("Invalid command type")]
    InvalidCommandType,

    /// OS command could not be spawned or exited non-zero.
    #[error("OS command failed: {0}")]
    OsExecution(String),

    /// Arithmetic expression is syntactically malformed.
    #[error("Malformed expression: {0}")]
    ExprSyntax(String),

    /// Arithmetic expression references a name; only numeric literals are
    /// allowed. Message text is part of the service's observable contract.
    #[error("Invalid variable name in expression: {0}")]
    ExprName(String),

    /// Expression parsed but could not be evaluated (division by zero).
    #[error("Evaluation error: {0}")]
    ExprEval(String),

    /// Request could not be decoded at the transport boundary.
    #[error("Malformed request: {0}")]
    MalformedMessage(String),
}
