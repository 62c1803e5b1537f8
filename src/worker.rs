//! Worker pool.
//!
//! A worker loops forever: pull one job, execute it through the registry,
//! send exactly one response, go back to waiting. Workers are stateless and
//! interchangeable; the worker index exists only for logging.
//!
//! A handler that panics must not take the process down. Execution runs in
//! a spawned task so the panic surfaces as a `JoinError` at the worker
//! boundary, where it is logged and converted into an error response — the
//! client still gets its reply.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;

use crate::codec::MsgPackCodec;
use crate::dispatch::{Job, JobQueue};
use crate::handler::CommandRegistry;
use crate::log::RequestLog;
use crate::message::{Request, Response};
use crate::protocol::{flags, Header};
use crate::writer::OutboundFrame;

/// Spawn `count` workers reading from the shared queue.
pub fn spawn_workers(
    count: usize,
    queue: &JobQueue,
    registry: &Arc<CommandRegistry>,
    log: &Arc<dyn RequestLog>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|id| {
            let queue = queue.clone();
            let registry = Arc::clone(registry);
            let log = Arc::clone(log);
            tokio::spawn(worker_loop(id, queue, registry, log))
        })
        .collect()
}

/// One worker's lifetime: runs until the dispatch queue closes.
pub async fn worker_loop(
    id: usize,
    queue: JobQueue,
    registry: Arc<CommandRegistry>,
    log: Arc<dyn RequestLog>,
) {
    tracing::debug!(worker = id, "worker started");

    while let Some(job) = queue.next().await {
        serve_job(id, job, &registry, &log).await;
    }

    tracing::debug!(worker = id, "worker stopped");
}

async fn serve_job(id: usize, job: Job, registry: &Arc<CommandRegistry>, log: &Arc<dyn RequestLog>) {
    let Job {
        request_id,
        request,
        reply,
    } = job;

    let response = execute_guarded(registry, request).await;
    let success = response.is_success();

    if let Some(message) = response.error_message() {
        log.error(request_id, message);
    }

    let payload = encode_response(&response);
    let frame_flags = if success {
        flags::RESPONSE
    } else {
        flags::ERROR_RESPONSE
    };
    let header = Header::new(frame_flags, request_id, payload.len() as u32);

    // The client may have disconnected while its job was queued; nothing
    // left to route the reply to in that case.
    if reply
        .send(OutboundFrame::new(&header, Bytes::from(payload)))
        .await
        .is_err()
    {
        tracing::debug!(worker = id, request_id, "client gone before reply");
        return;
    }

    log.response_sent(request_id, id, success);
}

/// Execute in a subtask so a panicking handler is contained.
async fn execute_guarded(registry: &Arc<CommandRegistry>, request: Request) -> Response {
    let registry = Arc::clone(registry);
    match tokio::spawn(async move { registry.execute(request).await }).await {
        Ok(response) => response,
        Err(join_err) => {
            tracing::error!(error = %join_err, "handler task failed");
            Response::Error {
                message: "internal handler fault".to_string(),
            }
        }
    }
}

fn encode_response(response: &Response) -> Vec<u8> {
    match MsgPackCodec::encode(response) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response");
            let fallback = Response::Error {
                message: "internal encoding error".to_string(),
            };
            MsgPackCodec::encode(&fallback).unwrap_or_default()
        }
    }
}
