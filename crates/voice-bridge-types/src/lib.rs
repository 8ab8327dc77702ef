use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identity of a playback session as supplied by the caller (usually a message id).
///
/// The controller only compares these for equality; the contents are never interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Arc<str>);

impl SessionId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for ids that are empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to the audio bytes of a session (URL, object URL, blob reference).
///
/// Cloning shares the handle. Whoever created the locator owns its lifecycle;
/// holders must not revoke or release it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLocator(Arc<str>);

impl ResourceLocator {
    pub fn new(locator: impl Into<Arc<str>>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for locators that are empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for ResourceLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceLocator {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One item of a continuation list: play `url` as session `message_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Audio resource to load.
    pub url: ResourceLocator,
    /// Session identity reported while this entry plays.
    #[serde(rename = "messageId")]
    pub message_id: SessionId,
}

impl QueueEntry {
    pub fn new(url: impl Into<ResourceLocator>, message_id: impl Into<SessionId>) -> Self {
        Self {
            url: url.into(),
            message_id: message_id.into(),
        }
    }

    /// Entries with a blank locator or id cannot be played.
    pub fn is_well_formed(&self) -> bool {
        !self.url.is_blank() && !self.message_id.is_blank()
    }
}

/// Controller state as observed by consumers.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// A play request was issued and the device has not confirmed it yet.
    Loading,
    /// Device is producing sound.
    Playing,
    /// Device paused from outside the controller (media key, OS).
    Paused,
}

/// Why the last session went away.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEndReason {
    /// Natural end of the last item, nothing queued after it.
    Eof,
    /// Explicit `stop`.
    Stopped,
    /// The active session was clicked again.
    ToggledOff,
    /// A different session took over the device.
    Preempted,
    /// Device refused to start playback.
    Rejected,
    /// Device reported an error mid-playback.
    Error,
}

/// Read-only playback status exposed to UI rows.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// Current controller state.
    pub state: PlaybackState,
    /// Active session id, `None` when idle.
    pub session_id: Option<SessionId>,
    /// Locator currently loaded into the device.
    pub now_playing: Option<ResourceLocator>,
    /// `true` only while the device is producing sound.
    pub playing: bool,
    /// Number of continuation entries waiting behind the active session.
    pub queued: usize,
    /// How the most recently ended session ended. While a session is active
    /// this describes the one before it, never the active one.
    pub end_reason: Option<PlaybackEndReason>,
}

impl PlaybackStatus {
    /// Whether `id` is the session currently producing sound.
    pub fn is_playing_session(&self, id: &SessionId) -> bool {
        self.playing && self.session_id.as_ref() == Some(id)
    }
}
