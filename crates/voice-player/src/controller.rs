//! Single-instance playback controller.
//!
//! Multiplexes one [`PlaybackDevice`] across every "play this message" request
//! coming from conversation rows:
//! - at most one session is attached to the device at any time
//! - clicking the active session again stops it (full stop, queue cleared)
//! - when a session ends, the next continuation entry starts without passing
//!   through `Idle`
//!
//! All mutation goes through `&mut self`; the owner applies device events on
//! the same thread via [`PlaybackController::handle_event`].

use tokio::sync::broadcast;
use voice_bridge_types::{
    PlaybackEndReason, PlaybackState, PlaybackStatus, QueueEntry, ResourceLocator, SessionId,
};

use crate::config::PlayerConfig;
use crate::device::{DeviceEvent, LoadTicket, PlayRequest, PlaybackDevice, PlaybackError};
use crate::queue::ContinuationQueue;
use crate::status::StatusBus;

/// Observable result of a request or device event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Waiting for the device to confirm playback of this session.
    Loading(SessionId),
    /// Session is producing sound.
    Playing(SessionId),
    /// Session was paused by the device.
    Paused(SessionId),
    /// Nothing is attached to the device anymore.
    Idle(PlaybackEndReason),
    /// Device refused the session; controller is idle.
    Rejected(PlaybackError),
    /// Request or event had no effect.
    Ignored,
}

#[derive(Debug)]
struct ActiveSession {
    id: SessionId,
    locator: ResourceLocator,
    ticket: LoadTicket,
}

pub struct PlaybackController<D: PlaybackDevice> {
    device: D,
    config: PlayerConfig,
    state: PlaybackState,
    session: Option<ActiveSession>,
    queue: ContinuationQueue,
    last_ticket: u64,
    end_reason: Option<PlaybackEndReason>,
    bus: StatusBus,
}

impl<D: PlaybackDevice> PlaybackController<D> {
    /// Take ownership of `device`. Never fails, even if the device is unavailable.
    pub fn new(device: D, config: PlayerConfig) -> Self {
        if !device.is_available() {
            tracing::warn!("no playback device; voice messages will not play");
        }
        let bus = StatusBus::new(config.status_capacity);
        Self {
            device,
            config,
            state: PlaybackState::Idle,
            session: None,
            queue: ContinuationQueue::new(),
            last_ticket: 0,
            end_reason: None,
            bus,
        }
    }

    /// Stop playback and hand the device back.
    pub fn dispose(mut self) -> D {
        self.stop();
        self.device
    }

    /// Play `locator` as session `id`, or stop it if `id` is already active.
    ///
    /// `continuation` replaces any pending queue and is played in order after
    /// this session ends. Failures are logged and reported through the returned
    /// [`Transition`]; they never panic.
    pub fn play_or_toggle(
        &mut self,
        locator: impl Into<ResourceLocator>,
        id: impl Into<SessionId>,
        continuation: Vec<QueueEntry>,
    ) -> Transition {
        let locator = locator.into();
        let id = id.into();

        if locator.is_blank() || id.is_blank() {
            let err = PlaybackError::InvalidRequest("locator and session id must be non-empty");
            tracing::warn!(session = %id, error = %err, "play request ignored");
            return Transition::Ignored;
        }

        if self.session.as_ref().is_some_and(|s| s.id == id) {
            tracing::info!(session = %id, state = ?self.state, "active session clicked again; stopping");
            self.halt(PlaybackEndReason::ToggledOff);
            return Transition::Idle(PlaybackEndReason::ToggledOff);
        }

        if !self.device.is_available() {
            tracing::warn!(session = %id, error = %PlaybackError::DeviceUnavailable, "play request ignored");
            return Transition::Ignored;
        }

        if let Some(prev) = self.session.take() {
            tracing::info!(previous = %prev.id, session = %id, "pre-empting active session");
            self.end_reason = Some(PlaybackEndReason::Preempted);
        }

        self.queue =
            ContinuationQueue::from_entries(continuation, &id, self.config.continuation_limit);
        self.start(locator, id)
    }

    /// Halt the device, rewind, drop the queue and go idle.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.as_ref() {
            tracing::info!(session = %session.id, queued = self.queue.len(), "playback stopped");
        }
        self.halt(PlaybackEndReason::Stopped);
    }

    /// Apply one device notification. Events for superseded loads are ignored.
    pub fn handle_event(&mut self, event: DeviceEvent) -> Transition {
        let Some(session) = self.session.as_ref() else {
            tracing::debug!(event = event.kind(), ticket = %event.ticket(), "device event while idle ignored");
            return Transition::Ignored;
        };
        if event.ticket() != session.ticket {
            tracing::debug!(
                event = event.kind(),
                ticket = %event.ticket(),
                current = %session.ticket,
                "stale device event ignored"
            );
            return Transition::Ignored;
        }
        let id = session.id.clone();

        match event {
            DeviceEvent::PlayResolved { .. } | DeviceEvent::Play { .. } => match self.state {
                PlaybackState::Loading | PlaybackState::Paused => {
                    self.state = PlaybackState::Playing;
                    tracing::debug!(session = %id, "device playing");
                    self.publish();
                    Transition::Playing(id)
                }
                _ => Transition::Ignored,
            },
            DeviceEvent::Pause { .. } => match self.state {
                PlaybackState::Playing => {
                    self.state = PlaybackState::Paused;
                    tracing::debug!(session = %id, "device paused");
                    self.publish();
                    Transition::Paused(id)
                }
                _ => Transition::Ignored,
            },
            DeviceEvent::PlayRejected { error, .. } => self.reject(error),
            DeviceEvent::Error { error, .. } => {
                tracing::warn!(session = %id, error = %error, "device error; playback abandoned");
                self.halt(PlaybackEndReason::Error);
                Transition::Idle(PlaybackEndReason::Error)
            }
            DeviceEvent::Ended { .. } => self.advance(),
        }
    }

    pub fn current_session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    /// `true` only while the device is producing sound.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Number of continuation entries behind the active session.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            now_playing: self.session.as_ref().map(|s| s.locator.clone()),
            playing: self.is_playing(),
            queued: self.queue.len(),
            end_reason: self.end_reason,
        }
    }

    /// Receive a snapshot after every observable transition.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackStatus> {
        self.bus.subscribe()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn start(&mut self, locator: ResourceLocator, id: SessionId) -> Transition {
        self.last_ticket += 1;
        let ticket = LoadTicket::new(self.last_ticket);
        self.state = PlaybackState::Loading;
        self.session = Some(ActiveSession {
            id: id.clone(),
            locator: locator.clone(),
            ticket,
        });

        let request = match self.device.set_source(ticket, &locator) {
            Ok(()) => self.device.play(ticket),
            Err(err) => Err(err),
        };

        match request {
            Ok(PlayRequest::Started) => {
                self.state = PlaybackState::Playing;
                tracing::info!(session = %id, locator = %locator, %ticket, queued = self.queue.len(), "playback started");
                self.publish();
                Transition::Playing(id)
            }
            Ok(PlayRequest::Pending) => {
                tracing::info!(session = %id, locator = %locator, %ticket, queued = self.queue.len(), "playback requested");
                self.publish();
                Transition::Loading(id)
            }
            Err(err) => self.reject(err),
        }
    }

    fn advance(&mut self) -> Transition {
        let finished = self.session.take();
        match self.queue.pop() {
            Some(next) => {
                if let Some(done) = finished.as_ref() {
                    tracing::info!(finished = %done.id, next = %next.message_id, "auto-advancing");
                }
                self.end_reason = Some(PlaybackEndReason::Eof);
                self.start(next.url, next.message_id)
            }
            None => {
                if let Some(done) = finished.as_ref() {
                    tracing::info!(session = %done.id, "playback finished");
                }
                self.state = PlaybackState::Idle;
                self.end_reason = Some(PlaybackEndReason::Eof);
                self.publish();
                Transition::Idle(PlaybackEndReason::Eof)
            }
        }
    }

    fn reject(&mut self, err: PlaybackError) -> Transition {
        let session = self.session.as_ref().map(|s| s.id.clone());
        tracing::warn!(session = ?session.as_ref().map(SessionId::as_str), error = %err, "playback failed");
        self.session = None;
        self.queue.clear();
        self.state = PlaybackState::Idle;
        self.end_reason = Some(PlaybackEndReason::Rejected);
        self.publish();
        Transition::Rejected(err)
    }

    fn halt(&mut self, reason: PlaybackEndReason) {
        let was_active = self.session.is_some();
        self.device.pause();
        self.device.reset_position();
        self.queue.clear();
        self.session = None;
        self.state = PlaybackState::Idle;
        if was_active {
            self.end_reason = Some(reason);
            self.publish();
        }
    }

    fn publish(&self) {
        self.bus.publish(self.status());
    }
}
