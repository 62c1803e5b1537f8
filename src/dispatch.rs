//! Dispatcher: bounded work-queue between connections and workers.
//!
//! Connection read loops enqueue one [`Job`] per decoded request; workers
//! dequeue from the shared receiver. The queue is the rendezvous point that
//! replaces per-worker routing: any idle worker takes the next job, and the
//! job itself carries everything needed to route the reply back (the
//! originating connection's writer handle plus the wire correlation token).
//!
//! Backpressure: the queue is bounded, so when all workers are busy and the
//! queue is full, `enqueue` suspends the producing read loop. Requests are
//! never dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{Result, WireError};
use crate::message::Request;
use crate::writer::WriterHandle;

/// Default depth of the dispatch queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// A pending request envelope.
///
/// Created when a request is received, destroyed when its reply has been
/// handed to the connection writer. Never persisted.
pub struct Job {
    /// Correlation token from the request frame; echoed in the response
    /// frame so the client pairs the reply with its request.
    pub request_id: u32,
    /// The decoded request.
    pub request: Request,
    /// Routing identity: writer handle of the originating connection.
    pub reply: WriterHandle,
}

/// Producer side of the dispatch queue, cloned into every connection task.
#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job, suspending while the queue is full.
    pub async fn enqueue(&self, job: Job) -> Result<()> {
        self.tx.send(job).await.map_err(|_| WireError::QueueClosed)
    }
}

/// Consumer side of the dispatch queue, shared by the worker pool.
///
/// `mpsc` has a single receiver; the pool shares it behind an async mutex.
/// The lock is held only while awaiting the next job, so it never covers
/// command execution.
#[derive(Clone)]
pub struct JobQueue {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl JobQueue {
    /// Wait for the next job. Returns `None` when the queue has closed.
    pub async fn next(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}

/// The dispatch queue endpoints.
pub struct Dispatcher {
    tx: JobSender,
    rx: JobQueue,
}

impl Dispatcher {
    /// Create a dispatcher with the given queue depth.
    pub fn new(queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth);
        Self {
            tx: JobSender { tx },
            rx: JobQueue {
                rx: Arc::new(Mutex::new(rx)),
            },
        }
    }

    /// Clone the producer endpoint.
    pub fn sender(&self) -> JobSender {
        self.tx.clone()
    }

    /// Clone the consumer endpoint.
    pub fn queue(&self) -> JobQueue {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::spawn_writer_task;
    use std::time::Duration;
    use tokio::io::duplex;

    fn test_writer() -> WriterHandle {
        let (client, _server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client);
        handle
    }

    #[tokio::test]
    async fn jobs_flow_in_fifo_order() {
        let dispatcher = Dispatcher::new(8);
        let sender = dispatcher.sender();
        let queue = dispatcher.queue();

        for id in 1u32..=3 {
            sender
                .enqueue(Job {
                    request_id: id,
                    request: Request::compute("1 + 1"),
                    reply: test_writer(),
                })
                .await
                .unwrap();
        }

        assert_eq!(queue.next().await.unwrap().request_id, 1);
        assert_eq!(queue.next().await.unwrap().request_id, 2);
        assert_eq!(queue.next().await.unwrap().request_id, 3);
    }

    #[tokio::test]
    async fn full_queue_suspends_producer_without_dropping() {
        let dispatcher = Dispatcher::new(1);
        let sender = dispatcher.sender();
        let queue = dispatcher.queue();

        sender
            .enqueue(Job {
                request_id: 1,
                request: Request::compute("1"),
                reply: test_writer(),
            })
            .await
            .unwrap();

        // Queue is full: the next enqueue must park, not fail.
        let blocked = sender.enqueue(Job {
            request_id: 2,
            request: Request::compute("2"),
            reply: test_writer(),
        });
        tokio::pin!(blocked);

        let raced = tokio::time::timeout(Duration::from_millis(50), &mut blocked).await;
        assert!(raced.is_err(), "enqueue should suspend while queue is full");

        // Draining one job releases the parked producer.
        assert_eq!(queue.next().await.unwrap().request_id, 1);
        blocked.await.unwrap();
        assert_eq!(queue.next().await.unwrap().request_id, 2);
    }

    #[tokio::test]
    async fn queue_closes_when_dispatcher_dropped() {
        let dispatcher = Dispatcher::new(4);
        let sender = dispatcher.sender();
        let queue = dispatcher.queue();
        drop(dispatcher);
        drop(sender);

        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn enqueue_after_close_is_error() {
        let dispatcher = Dispatcher::new(4);
        let sender = dispatcher.sender();
        let queue = dispatcher.queue();
        drop(dispatcher);
        drop(queue);

        // Receiver gone: the channel closes once the Arc is released.
        let result = sender
            .enqueue(Job {
                request_id: 1,
                request: Request::compute("1"),
                reply: test_writer(),
            })
            .await;
        assert!(matches!(result, Err(WireError::QueueClosed)));
    }
}
