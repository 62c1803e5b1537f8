//! Request and response data model.
//!
//! Messages mirror the wire shape exactly: a request is a flat map with a
//! `command_type` tag plus the payload fields that tag implies, and a
//! response is tagged by `status` with exactly one of `result`/`message`
//! populated.

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Command tag for an OS command request.
pub const COMMAND_TYPE_OS: &str = "os";

/// Command tag for an arithmetic expression request.
pub const COMMAND_TYPE_COMPUTE: &str = "compute";

/// A client request.
///
/// The payload fields are all optional at the decode layer; the handler
/// registered for `command_type` validates the shape it needs. Unknown tags
/// survive decoding and are rejected by the registry, so a typo in
/// `command_type` yields an `Invalid command type` response rather than a
/// malformed-message error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    /// Which handler should serve this request (`"os"` or `"compute"`).
    pub command_type: String,
    /// Executable name for OS commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_name: Option<String>,
    /// Argument vector for OS commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    /// Arithmetic expression for compute commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Request {
    /// Build an OS command request.
    pub fn os<S: Into<String>>(command_name: S, parameters: Vec<String>) -> Self {
        Self {
            command_type: COMMAND_TYPE_OS.to_string(),
            command_name: Some(command_name.into()),
            parameters,
            expression: None,
        }
    }

    /// Build a compute request.
    pub fn compute<S: Into<String>>(expression: S) -> Self {
        Self {
            command_type: COMMAND_TYPE_COMPUTE.to_string(),
            command_name: None,
            parameters: Vec::new(),
            expression: Some(expression.into()),
        }
    }
}

/// Result payload of a successful command.
///
/// Untagged so a compute result serializes as a bare number and OS output
/// as a bare string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommandOutput {
    /// Numeric result (compute commands).
    Number(f64),
    /// Captured text output (OS commands).
    Text(String),
}

impl CommandOutput {
    /// Numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// A server response: success with a result, or error with a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    /// The command completed; `result` holds its output.
    Success {
        /// Captured output or computed value.
        result: CommandOutput,
    },
    /// The command failed; `message` describes why.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl Response {
    /// Build a success response.
    pub fn success(result: CommandOutput) -> Self {
        Self::Success { result }
    }

    /// Build an error response from a command error.
    pub fn error(err: &CommandError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }

    /// Whether this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The error message, if this is an error response.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            Self::Success { .. } => None,
        }
    }
}

impl From<Result<CommandOutput, CommandError>> for Response {
    fn from(outcome: Result<CommandOutput, CommandError>) -> Self {
        match outcome {
            Ok(result) => Self::success(result),
            Err(err) => Self::error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;

    #[test]
    fn request_roundtrip_os() {
        let req = Request::os("echo", vec!["Hello, World!".to_string()]);
        let bytes = MsgPackCodec::encode(&req).unwrap();
        let back: Request = MsgPackCodec::decode(&bytes).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.command_type, COMMAND_TYPE_OS);
    }

    #[test]
    fn request_with_unknown_tag_still_decodes() {
        let req = Request {
            command_type: "teleport".to_string(),
            command_name: None,
            parameters: Vec::new(),
            expression: None,
        };
        let bytes = MsgPackCodec::encode(&req).unwrap();
        let back: Request = MsgPackCodec::decode(&bytes).unwrap();
        assert_eq!(back.command_type, "teleport");
    }

    #[test]
    fn response_tagged_by_status() {
        let ok = Response::success(CommandOutput::Number(80.0));
        let bytes = MsgPackCodec::encode(&ok).unwrap();
        let back: Response = MsgPackCodec::decode(&bytes).unwrap();
        assert!(back.is_success());

        let err = Response::error(&CommandError::InvalidCommandType);
        assert_eq!(err.error_message(), Some("Invalid command type"));
    }

    #[test]
    fn command_output_accessors() {
        assert_eq!(CommandOutput::Number(3.5).as_number(), Some(3.5));
        assert_eq!(CommandOutput::Number(3.5).as_text(), None);
        assert_eq!(
            CommandOutput::Text("hi".to_string()).as_text(),
            Some("hi")
        );
    }

    #[test]
    fn outcome_conversion() {
        let ok: Response = Ok(CommandOutput::Number(1.0)).into();
        assert!(ok.is_success());

        let err: Response = Err(CommandError::ExprEval("division by zero".to_string())).into();
        assert!(!err.is_success());
    }
}
