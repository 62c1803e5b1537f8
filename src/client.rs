//! Client for the command-execution service.
//!
//! [`Client::call`] gives the synchronous request/response illusion: encode
//! and send one framed request, then block until the response carrying the
//! same correlation token arrives. Which worker served the request is
//! invisible here.
//!
//! `call` has no built-in deadline, so a hung server blocks the caller; use
//! [`Client::call_timeout`] to bound a call.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::codec::MsgPackCodec;
use crate::error::{Result, WireError};
use crate::message::{Request, Response};
use crate::protocol::{build_frame, flags, FrameBuffer, Header};

/// A connected client.
///
/// Calls take `&mut self`, so one client has at most one outstanding
/// request; open several clients for concurrent calls.
pub struct Client {
    stream: TcpStream,
    frame_buffer: FrameBuffer,
    next_request_id: u32,
}

impl Client {
    /// Connect to a server.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            frame_buffer: FrameBuffer::new(),
            next_request_id: 1,
        })
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// Fails on transport errors; a command failure is a normal
    /// [`Response::Error`] return, not an `Err`.
    pub async fn call(&mut self, request: &Request) -> Result<Response> {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        let payload = MsgPackCodec::encode(request)?;
        let header = Header::new(flags::REQUEST, request_id, payload.len() as u32);
        let frame_bytes = build_frame(&header, &payload);

        self.stream.write_all(&frame_bytes).await?;
        self.stream.flush().await?;

        self.read_response(request_id).await
    }

    /// Send a request with a deadline.
    pub async fn call_timeout(
        &mut self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response> {
        tokio::time::timeout(timeout, self.call(request))
            .await
            .map_err(|_| WireError::Timeout)?
    }

    async fn read_response(&mut self, request_id: u32) -> Result<Response> {
        let mut buf = vec![0u8; 16 * 1024];

        loop {
            // A frame may already be buffered from a previous read.
            let frames = self.frame_buffer.push(&[])?;
            if let Some(response) = Self::find_response(frames, request_id)? {
                return Ok(response);
            }

            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(WireError::ConnectionClosed);
            }

            let frames = self.frame_buffer.push(&buf[..n])?;
            if let Some(response) = Self::find_response(frames, request_id)? {
                return Ok(response);
            }
        }
    }

    fn find_response(
        frames: Vec<crate::protocol::Frame>,
        request_id: u32,
    ) -> Result<Option<Response>> {
        for frame in frames {
            if !frame.is_response() {
                tracing::warn!("server sent a non-response frame; ignoring");
                continue;
            }
            if frame.request_id() != request_id {
                // Stale reply for an abandoned (timed out) call.
                tracing::debug!(
                    got = frame.request_id(),
                    want = request_id,
                    "skipping stale response"
                );
                continue;
            }
            return Ok(Some(MsgPackCodec::decode(frame.payload())?));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_to_unbound_port_fails() {
        // Port 1 on localhost is essentially never listening.
        let result = Client::connect("127.0.0.1:1").await;
        assert!(result.is_err());
    }
}
