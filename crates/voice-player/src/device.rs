//! Playback device abstraction.
//!
//! The controller never touches a platform media API directly. It drives a
//! [`PlaybackDevice`] and learns what the device did through [`DeviceEvent`]s
//! delivered back to [`PlaybackController::handle_event`].
//!
//! Every load is stamped with a [`LoadTicket`]; devices echo the ticket on each
//! event so that notifications from a superseded load can be told apart from
//! the current one.
//!
//! [`PlaybackController::handle_event`]: crate::controller::PlaybackController::handle_event

use std::fmt;

use voice_bridge_types::ResourceLocator;

/// Token identifying one load of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failures reported by the device or detected while validating a request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// Device refused to start (autoplay policy, decode failure, missing permission).
    #[error("playback rejected: {0}")]
    Rejected(String),
    /// Blank locator or session id.
    #[error("invalid play request: {0}")]
    InvalidRequest(&'static str),
    /// Platform has no usable audio output.
    #[error("no playback device available")]
    DeviceUnavailable,
    /// Device failed after playback started.
    #[error("device error: {0}")]
    Device(String),
}

/// Immediate answer of [`PlaybackDevice::play`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayRequest {
    /// Device is producing sound already.
    Started,
    /// Outcome arrives later as [`DeviceEvent::PlayResolved`] or [`DeviceEvent::PlayRejected`].
    Pending,
}

/// Notifications emitted by a device, tagged with the load they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A pending play request succeeded.
    PlayResolved { ticket: LoadTicket },
    /// A pending play request failed.
    PlayRejected {
        ticket: LoadTicket,
        error: PlaybackError,
    },
    /// Device started or resumed producing sound.
    Play { ticket: LoadTicket },
    /// Device paused.
    Pause { ticket: LoadTicket },
    /// Loaded resource played to the end. Emitted at most once per load.
    Ended { ticket: LoadTicket },
    /// Device failed while a resource was loaded.
    Error {
        ticket: LoadTicket,
        error: PlaybackError,
    },
}

impl DeviceEvent {
    pub fn ticket(&self) -> LoadTicket {
        match self {
            DeviceEvent::PlayResolved { ticket }
            | DeviceEvent::PlayRejected { ticket, .. }
            | DeviceEvent::Play { ticket }
            | DeviceEvent::Pause { ticket }
            | DeviceEvent::Ended { ticket }
            | DeviceEvent::Error { ticket, .. } => *ticket,
        }
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceEvent::PlayResolved { .. } => "play_resolved",
            DeviceEvent::PlayRejected { .. } => "play_rejected",
            DeviceEvent::Play { .. } => "play",
            DeviceEvent::Pause { .. } => "pause",
            DeviceEvent::Ended { .. } => "ended",
            DeviceEvent::Error { .. } => "error",
        }
    }
}

/// The single playback primitive the controller multiplexes.
///
/// Implementations must not emit events for a ticket they were never given, and
/// must emit [`DeviceEvent::Ended`] at most once per [`set_source`](Self::set_source).
pub trait PlaybackDevice {
    /// `false` when the platform has no audio capability.
    fn is_available(&self) -> bool {
        true
    }

    /// Load `locator`, replacing (and silencing) whatever was loaded before.
    fn set_source(
        &mut self,
        ticket: LoadTicket,
        locator: &ResourceLocator,
    ) -> Result<(), PlaybackError>;

    /// Start playing the loaded resource.
    fn play(&mut self, ticket: LoadTicket) -> Result<PlayRequest, PlaybackError>;

    fn pause(&mut self);

    /// Rewind the loaded resource to its start.
    fn reset_position(&mut self);
}

/// Device used when the platform offers no audio output.
///
/// The controller stays permanently idle on top of it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDevice;

impl PlaybackDevice for NullDevice {
    fn is_available(&self) -> bool {
        false
    }

    fn set_source(
        &mut self,
        _ticket: LoadTicket,
        _locator: &ResourceLocator,
    ) -> Result<(), PlaybackError> {
        Err(PlaybackError::DeviceUnavailable)
    }

    fn play(&mut self, _ticket: LoadTicket) -> Result<PlayRequest, PlaybackError> {
        Err(PlaybackError::DeviceUnavailable)
    }

    fn pause(&mut self) {}

    fn reset_position(&mut self) {}
}
