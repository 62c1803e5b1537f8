//! Dedicated writer task per connection.
//!
//! Workers serving requests from the same connection would otherwise race on
//! its write half. Instead each connection gets one writer task fed by an
//! mpsc channel; the channel sender doubles as the routing identity a reply
//! needs to find its way back to the originating client.
//!
//! ```text
//! Worker 1 ─┐
//! Worker 2 ─┼─► mpsc::Sender<OutboundFrame> ─► writer task ─► TcpStream
//! Worker N ─┘
//! ```
//!
//! The channel is bounded, so a slow client backpressures its own responses
//! without affecting other connections.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, WireError};
use crate::protocol::{Header, HEADER_SIZE};

/// Default capacity of the per-connection outbound channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A frame ready to be written to the socket.
#[derive(Debug)]
pub struct OutboundFrame {
    /// Pre-encoded header.
    pub header: [u8; HEADER_SIZE],
    /// Payload bytes.
    pub payload: Bytes,
}

impl OutboundFrame {
    /// Create a new outbound frame.
    #[inline]
    pub fn new(header: &Header, payload: Bytes) -> Self {
        Self {
            header: header.encode(),
            payload,
        }
    }

    /// Total size of this frame (header + payload).
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Handle for sending frames to a connection's writer task.
///
/// Cheaply cloneable; a clone travels with every job envelope so whichever
/// worker serves the request can route the reply back.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Send a frame to the writer task.
    ///
    /// Waits if the outbound channel is full. Fails only when the
    /// connection has closed.
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| WireError::ConnectionClosed)
    }
}

/// Spawn the writer task for one connection.
///
/// Returns a handle for queueing frames and the task's join handle. The
/// task exits when every handle has been dropped or the socket errors.
pub fn spawn_writer_task<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

/// Receive frames and write them out, draining ready frames before each
/// flush so bursts of responses cost one flush instead of many.
async fn writer_loop<W>(mut rx: mpsc::Receiver<OutboundFrame>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(first) = rx.recv().await {
        write_frame(&mut writer, &first).await?;

        while let Ok(frame) = rx.try_recv() {
            write_frame(&mut writer, &frame).await?;
        }

        writer.flush().await?;
    }
    Ok(())
}

async fn write_frame<W>(writer: &mut W, frame: &OutboundFrame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.header).await?;
    if !frame.payload.is_empty() {
        writer.write_all(&frame.payload).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::flags;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn outbound_frame_size() {
        let header = Header::new(flags::RESPONSE, 42, 5);
        let frame = OutboundFrame::new(&header, Bytes::from_static(b"hello"));
        assert_eq!(frame.size(), HEADER_SIZE + 5);
    }

    #[tokio::test]
    async fn writer_sends_header_and_payload() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client);

        let header = Header::new(flags::RESPONSE, 42, 5);
        handle
            .send(OutboundFrame::new(&header, Bytes::from_static(b"hello")))
            .await
            .unwrap();

        let mut buf = vec![0u8; HEADER_SIZE + 5];
        server.read_exact(&mut buf).await.unwrap();

        let parsed = Header::decode(&buf[..HEADER_SIZE]).unwrap();
        assert_eq!(parsed.request_id, 42);
        assert_eq!(&buf[HEADER_SIZE..], b"hello");
    }

    #[tokio::test]
    async fn writer_batches_burst_of_frames() {
        let (client, mut server) = duplex(16 * 1024);
        let (handle, _task) = spawn_writer_task(client);

        for id in 0..10u32 {
            let header = Header::new(flags::RESPONSE, id, 4);
            let payload = Bytes::copy_from_slice(&id.to_be_bytes());
            handle.send(OutboundFrame::new(&header, payload)).await.unwrap();
        }

        let expected = 10 * (HEADER_SIZE + 4);
        let mut buf = vec![0u8; expected];
        tokio::time::timeout(Duration::from_secs(1), server.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn writer_exits_when_handles_dropped() {
        let (client, _server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client);

        drop(handle);

        let result = task.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn send_after_close_is_connection_closed() {
        let (client, server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client);

        drop(server);
        // First write after peer drop may still buffer; push until the task
        // observes the broken pipe and the channel closes.
        let header = Header::new(flags::RESPONSE, 1, 0);
        let mut saw_closed = false;
        for _ in 0..200 {
            if handle
                .send(OutboundFrame::new(&header, Bytes::new()))
                .await
                .is_err()
            {
                saw_closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(saw_closed || task.is_finished());
    }
}
