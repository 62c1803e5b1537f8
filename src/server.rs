//! TCP server: accept loop, per-connection read loops, worker pool wiring.
//!
//! Lifecycle:
//! 1. Bind the client-facing TCP endpoint
//! 2. Create the bounded dispatch queue and spawn the worker pool
//! 3. Accept connections; each gets a read task and a writer task
//! 4. Read loop decodes frames into jobs and enqueues them
//!
//! Malformed messages are answered straight from the read loop without
//! consuming a worker slot. Everything else flows through the dispatcher so
//! exactly one worker serves each request.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;

use crate::codec::MsgPackCodec;
use crate::dispatch::{Dispatcher, Job, JobSender, DEFAULT_QUEUE_DEPTH};
use crate::error::{CommandError, Result, WireError};
use crate::handler::CommandRegistry;
use crate::log::{RequestLog, TracingLog};
use crate::message::{Request, Response};
use crate::protocol::{flags, Frame, FrameBuffer, Header};
use crate::worker::spawn_workers;
use crate::writer::{spawn_writer_task, OutboundFrame, WriterHandle};

/// Default size of the worker pool.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Builder for configuring and starting a [`Server`].
pub struct ServerBuilder {
    workers: usize,
    queue_depth: usize,
    registry: CommandRegistry,
    log: Arc<dyn RequestLog>,
}

impl ServerBuilder {
    /// Create a builder with defaults: 4 workers, queue depth 64, the
    /// built-in handlers and the tracing log sink.
    pub fn new() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            registry: CommandRegistry::with_defaults(),
            log: Arc::new(TracingLog),
        }
    }

    /// Set the worker pool size.
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.max(1);
        self
    }

    /// Set the dispatch queue depth.
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Replace the command registry.
    pub fn registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the request log sink.
    pub fn log(mut self, log: Arc<dyn RequestLog>) -> Self {
        self.log = log;
        self
    }

    /// Bind the address and start accepting connections.
    pub async fn start<A: ToSocketAddrs>(self, addr: A) -> Result<Server> {
        Server::start(addr, self).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running command-execution server.
pub struct Server {
    local_addr: std::net::SocketAddr,
    accept_task: JoinHandle<()>,
    _workers: Vec<JoinHandle<()>>,
    // Holding the dispatcher keeps the queue open for new connections.
    _dispatcher: Dispatcher,
}

impl Server {
    /// Create a server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    async fn start<A: ToSocketAddrs>(addr: A, config: ServerBuilder) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let dispatcher = Dispatcher::new(config.queue_depth);
        let registry = Arc::new(config.registry);
        let log = config.log;

        let workers = spawn_workers(config.workers, &dispatcher.queue(), &registry, &log);

        tracing::info!(
            %local_addr,
            workers = config.workers,
            queue_depth = config.queue_depth,
            "server listening"
        );

        let sender = dispatcher.sender();
        let accept_log = Arc::clone(&log);
        let accept_task = tokio::spawn(accept_loop(listener, sender, accept_log));

        Ok(Self {
            local_addr,
            accept_task,
            _workers: workers,
            _dispatcher: dispatcher,
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Block until the accept loop exits. Under normal operation it never
    /// does; shutdown is process termination.
    pub async fn wait_for_shutdown(self) -> Result<()> {
        self.accept_task
            .await
            .map_err(|e| WireError::Protocol(format!("accept loop failed: {e}")))
    }
}

async fn accept_loop(listener: TcpListener, sender: JobSender, log: Arc<dyn RequestLog>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::debug!(%peer, "client connected");
                let sender = sender.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, sender, log).await {
                        tracing::debug!(%peer, error = %e, "connection closed");
                    }
                });
            }
            Err(e) => {
                // Transient accept errors (EMFILE etc); keep listening.
                tracing::warn!(error = %e, "accept failed");
            }
        }
    }
}

/// Read loop for one client connection.
async fn serve_connection(
    stream: TcpStream,
    sender: JobSender,
    log: Arc<dyn RequestLog>,
) -> Result<()> {
    let (mut reader, write_half) = stream.into_split();
    let (writer, _writer_task) = spawn_writer_task(write_half);

    let mut frame_buffer = FrameBuffer::new();
    let mut buf = vec![0u8; 16 * 1024];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) => return Err(WireError::Io(e)),
        };

        let frames = frame_buffer.push(&buf[..n])?;

        for frame in frames {
            handle_frame(frame, &sender, &writer, &log).await?;
        }
    }
}

async fn handle_frame(
    frame: Frame,
    sender: &JobSender,
    writer: &WriterHandle,
    log: &Arc<dyn RequestLog>,
) -> Result<()> {
    let request_id = frame.request_id();

    if frame.is_response() {
        tracing::warn!(request_id, "client sent a response frame; ignoring");
        return Ok(());
    }

    let request: Request = match MsgPackCodec::decode(frame.payload()) {
        Ok(request) => request,
        Err(e) => {
            // Answered here, before any worker is engaged.
            let err = CommandError::MalformedMessage(e.to_string());
            log.error(request_id, &err.to_string());
            return send_error(writer, request_id, &err).await;
        }
    };

    log.request_received(request_id, &request.command_type);

    sender
        .enqueue(Job {
            request_id,
            request,
            reply: writer.clone(),
        })
        .await
}

async fn send_error(writer: &WriterHandle, request_id: u32, err: &CommandError) -> Result<()> {
    let response = Response::error(err);
    let payload = MsgPackCodec::encode(&response)?;
    let header = Header::new(flags::ERROR_RESPONSE, request_id, payload.len() as u32);
    writer
        .send(OutboundFrame::new(&header, Bytes::from(payload)))
        .await
}
