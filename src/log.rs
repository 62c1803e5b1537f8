//! Injectable request log sink.
//!
//! The dispatcher and workers log through a [`RequestLog`] passed in at
//! construction rather than a process-global, so the core can be exercised
//! in tests with a capturing sink. Logging is best-effort: implementations
//! must never block the request path or return errors.

use std::sync::Mutex;

/// Append-only sink for request lifecycle events.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// connection task and worker.
pub trait RequestLog: Send + Sync {
    /// A request was received and enqueued for dispatch.
    fn request_received(&self, request_id: u32, command_type: &str);

    /// A response was sent back to its client.
    fn response_sent(&self, request_id: u32, worker: usize, success: bool);

    /// A request-path error (malformed message, handler fault).
    fn error(&self, request_id: u32, message: &str);
}

/// Default sink that forwards to `tracing` events.
///
/// Timestamps come from the installed subscriber.
pub struct TracingLog;

impl RequestLog for TracingLog {
    fn request_received(&self, request_id: u32, command_type: &str) {
        tracing::info!(request_id, command_type, "request received");
    }

    fn response_sent(&self, request_id: u32, worker: usize, success: bool) {
        tracing::info!(request_id, worker, success, "response sent");
    }

    fn error(&self, request_id: u32, message: &str) {
        tracing::warn!(request_id, message, "request error");
    }
}

/// Sink that discards everything.
pub struct NoOpLog;

impl RequestLog for NoOpLog {
    fn request_received(&self, _request_id: u32, _command_type: &str) {}
    fn response_sent(&self, _request_id: u32, _worker: usize, _success: bool) {}
    fn error(&self, _request_id: u32, _message: &str) {}
}

/// Capturing sink for tests: records one line per event, in order.
#[derive(Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryLog {
    /// Create an empty capturing log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, line: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(line);
        }
    }
}

impl RequestLog for MemoryLog {
    fn request_received(&self, request_id: u32, command_type: &str) {
        self.record(format!("recv {request_id} {command_type}"));
    }

    fn response_sent(&self, request_id: u32, worker: usize, success: bool) {
        self.record(format!("sent {request_id} worker={worker} success={success}"));
    }

    fn error(&self, request_id: u32, message: &str) {
        self.record(format!("error {request_id} {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_records_in_order() {
        let log = MemoryLog::new();
        log.request_received(1, "compute");
        log.response_sent(1, 0, true);
        log.error(2, "Malformed request: bad frame");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], "recv 1 compute");
        assert!(entries[1].starts_with("sent 1"));
        assert!(entries[2].starts_with("error 2"));
    }

    #[test]
    fn noop_log_is_silent() {
        let log = NoOpLog;
        log.request_received(1, "os");
        log.response_sent(1, 0, false);
        log.error(1, "x");
    }
}
