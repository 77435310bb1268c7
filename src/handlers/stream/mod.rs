//! Call audio stream WebSocket endpoint
//!
//! - `handler` - connection lifecycle and the socket read/write tasks
//! - `controller` - per-frame pipeline, turn handling and the inactivity sweep
//! - `messages` - wire types for inbound frames and outbound errors

pub mod controller;
pub mod handler;
pub mod messages;

pub use controller::StreamSessionController;
pub use handler::stream_handler;
pub use messages::{AudioFrame, FrameMetadata, OutgoingMessage};
