//! Command handling and dispatch.
//!
//! Provides:
//! - [`CommandRegistry`] - maps a `command_type` tag to its handler
//! - [`CommandHandler`] - trait implemented by the OS and compute handlers
//!
//! Handlers are stateless and `Send + Sync`; the registry can be shared
//! across the whole worker pool behind an `Arc` without synchronization.

mod compute;
mod os;
mod registry;

pub use compute::{evaluate_expression, ComputeHandler};
pub use os::OsHandler;
pub use registry::{BoxFuture, CommandHandler, CommandRegistry, HandlerOutcome};
