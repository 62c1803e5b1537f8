//! # cmdwire
//!
//! A minimal remote command-execution service over TCP. Clients send a typed
//! request — run an OS command, or evaluate an arithmetic expression — and a
//! fixed pool of workers executes them behind a bounded dispatch queue.
//!
//! ## Architecture
//!
//! ```text
//! Client ──frame──► read loop ──Job──► bounded queue ──► Worker ──► registry
//!    ▲                                                      │
//!    └───────────── writer task ◄──────── response ─────────┘
//! ```
//!
//! - One read task and one writer task per connection
//! - One task per worker; any idle worker takes the next job
//! - Replies are routed by the job's writer handle plus the frame's
//!   correlation token, so responses never cross between clients
//!
//! ## Example
//!
//! ```ignore
//! use cmdwire::{Client, Request, Server};
//!
//! #[tokio::main]
//! async fn main() -> cmdwire::Result<()> {
//!     let server = Server::builder().workers(4).start("127.0.0.1:5555").await?;
//!
//!     let mut client = Client::connect(server.local_addr()).await?;
//!     let response = client.call(&Request::compute("(6 + 4) * 8")).await?;
//!     println!("{response:?}"); // Success { result: 80 }
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod log;
pub mod message;
pub mod protocol;
pub mod worker;
pub mod writer;

mod client;
mod server;

pub use client::Client;
pub use error::{CommandError, Result, WireError};
pub use message::{CommandOutput, Request, Response};
pub use server::{Server, ServerBuilder};
