//! Single-instance voice message playback.
//!
//! One [`PlaybackController`] is built at startup around one [`PlaybackDevice`]
//! and shared by every message row of a conversation view. Rows call
//! [`PlaybackController::play_or_toggle`] / [`PlaybackController::stop`] and read
//! the controller status to decide whether they are the one currently playing.

pub mod adapter;
pub mod channel;
pub mod config;
pub mod controller;
pub mod device;
mod queue;
mod status;

pub use adapter::DeviceEventAdapter;
pub use channel::{ChannelDevice, DeviceCommand, DeviceWorkerEnds, channel_device};
pub use config::PlayerConfig;
pub use controller::{PlaybackController, Transition};
pub use device::{DeviceEvent, LoadTicket, NullDevice, PlayRequest, PlaybackDevice, PlaybackError};
pub use voice_bridge_types::{
    PlaybackEndReason, PlaybackState, PlaybackStatus, QueueEntry, ResourceLocator, SessionId,
};
