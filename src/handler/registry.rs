//! Command registry mapping `command_type` tags to handlers.
//!
//! The registry is built once at startup and shared read-only across the
//! worker pool. Looking up an unregistered tag is not a transport fault: it
//! produces the `Invalid command type` error response without invoking any
//! handler.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::CommandError;
use crate::message::{CommandOutput, Request, Response, COMMAND_TYPE_COMPUTE, COMMAND_TYPE_OS};

use super::{ComputeHandler, OsHandler};

/// Boxed future returned by handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of one handler invocation.
pub type HandlerOutcome = Result<CommandOutput, CommandError>;

/// Trait for command handlers.
///
/// Implementations must be stateless or internally synchronized: one
/// registry instance serves every worker concurrently.
pub trait CommandHandler: Send + Sync + 'static {
    /// Execute the request and produce its output or failure.
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerOutcome>;
}

/// Registry mapping command tags to handlers.
pub struct CommandRegistry {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a registry with the built-in `os` and `compute` handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(COMMAND_TYPE_OS, OsHandler);
        registry.register(COMMAND_TYPE_COMPUTE, ComputeHandler);
        registry
    }

    /// Register a handler for a command tag, replacing any previous one.
    pub fn register<H: CommandHandler>(&mut self, tag: &str, handler: H) {
        self.handlers.insert(tag.to_string(), Box::new(handler));
    }

    /// Get the handler for a tag, if registered.
    pub fn get(&self, tag: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(tag).map(|h| h.as_ref())
    }

    /// Registered tags, for logging at startup.
    pub fn tags(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Execute a request through its registered handler.
    ///
    /// Always returns a response: unknown tags and handler failures are
    /// converted into error responses here, never propagated.
    pub async fn execute(&self, request: Request) -> Response {
        let handler = match self.get(&request.command_type) {
            Some(h) => h,
            None => return Response::error(&CommandError::InvalidCommandType),
        };

        handler.call(request).await.into()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
