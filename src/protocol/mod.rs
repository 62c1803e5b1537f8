//! Length-framed wire protocol.
//!
//! Each message is a fixed 9-byte header followed by a MsgPack body:
//! - [`wire_format`] - header encoding/decoding and flag constants
//! - [`Frame`] - a complete header + payload pair
//! - [`FrameBuffer`] - accumulator that reassembles frames from partial reads

mod frame;
mod frame_buffer;
pub mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{flags, Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
