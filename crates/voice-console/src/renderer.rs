//! Simulated renderer thread.
//!
//! Stands in for a platform media element: it accepts [`DeviceCommand`]s,
//! "plays" each clip for its configured length and emits the same
//! notifications a real element would (`play` resolution, `pause`, `play`,
//! `ended`). Media keys arrive on a separate channel because they originate
//! outside the controller.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use voice_player::{DeviceCommand, DeviceEvent, DeviceWorkerEnds, LoadTicket, PlaybackError};

use crate::config::RendererConfig;

/// Device-side controls (OS media keys, end of clip).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    Pause,
    Resume,
    /// Jump to the end of the current clip.
    End,
}

/// Handle for sending media keys to the renderer.
#[derive(Clone)]
pub struct RendererHandle {
    pub keys: Sender<MediaKey>,
}

const IDLE_WAIT: Duration = Duration::from_millis(500);

struct Loaded {
    ticket: LoadTicket,
    locator: String,
    clip: Duration,
    /// Playback position when last paused or rewound.
    position: Duration,
    /// Set while producing sound.
    resumed_at: Option<Instant>,
    /// Set while a play request awaits resolution.
    resolve_at: Option<Instant>,
}

impl Loaded {
    fn played(&self, now: Instant) -> Duration {
        self.position
            + self
                .resumed_at
                .map(|at| now.saturating_duration_since(at))
                .unwrap_or_default()
    }

    fn deadline(&self) -> Option<Instant> {
        if let Some(at) = self.resolve_at {
            return Some(at);
        }
        self.resumed_at
            .map(|at| at + self.clip.saturating_sub(self.position))
    }
}

/// Spawn the renderer thread.
pub fn spawn_renderer(config: RendererConfig, ends: DeviceWorkerEnds) -> RendererHandle {
    let (keys_tx, keys_rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || renderer_main(config, ends.commands, keys_rx, ends.events));
    RendererHandle { keys: keys_tx }
}

/// Main loop for the renderer.
fn renderer_main(
    config: RendererConfig,
    commands: Receiver<DeviceCommand>,
    keys: Receiver<MediaKey>,
    events: Sender<DeviceEvent>,
) {
    let mut loaded: Option<Loaded> = None;
    let no_keys = crossbeam_channel::never();
    let mut keys_open = true;

    loop {
        let keys_rx = if keys_open { &keys } else { &no_keys };
        let now = Instant::now();
        let wait = loaded
            .as_ref()
            .and_then(Loaded::deadline)
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(IDLE_WAIT);

        crossbeam_channel::select! {
            recv(commands) -> cmd => match cmd {
                Ok(DeviceCommand::Quit) | Err(_) => break,
                Ok(cmd) => on_command(&config, &mut loaded, cmd, &events),
            },
            recv(keys_rx) -> key => match key {
                Ok(key) => on_key(&mut loaded, key, &events),
                Err(_) => keys_open = false,
            },
            default(wait) => on_deadline(&mut loaded, &events),
        }
    }
    tracing::debug!("renderer stopped");
}

fn on_command(
    config: &RendererConfig,
    loaded: &mut Option<Loaded>,
    cmd: DeviceCommand,
    events: &Sender<DeviceEvent>,
) {
    match cmd {
        DeviceCommand::Load { ticket, locator } => {
            tracing::debug!(%ticket, locator = %locator, "renderer load");
            *loaded = Some(Loaded {
                ticket,
                clip: config.clip_for(locator.as_str()),
                locator: locator.as_str().to_string(),
                position: Duration::ZERO,
                resumed_at: None,
                resolve_at: None,
            });
        }
        DeviceCommand::Play { ticket } => {
            let Some(track) = loaded.as_mut().filter(|t| t.ticket == ticket) else {
                let error = PlaybackError::Rejected("nothing loaded".to_string());
                let _ = events.send(DeviceEvent::PlayRejected { ticket, error });
                return;
            };
            if config.rejects(&track.locator) {
                let error = PlaybackError::Rejected(format!("NotAllowedError: {}", track.locator));
                let _ = events.send(DeviceEvent::PlayRejected { ticket, error });
                *loaded = None;
                return;
            }
            track.resolve_at = Some(Instant::now() + config.start_delay);
        }
        DeviceCommand::Pause => pause(loaded, events),
        DeviceCommand::ResetPosition => {
            if let Some(track) = loaded.as_mut() {
                track.position = Duration::ZERO;
                if track.resumed_at.is_some() {
                    track.resumed_at = Some(Instant::now());
                }
            }
        }
        DeviceCommand::Quit => {}
    }
}

fn on_key(loaded: &mut Option<Loaded>, key: MediaKey, events: &Sender<DeviceEvent>) {
    match key {
        MediaKey::Pause => pause(loaded, events),
        MediaKey::Resume => {
            let Some(track) = loaded.as_mut() else {
                return;
            };
            if track.resumed_at.is_none() && track.resolve_at.is_none() {
                track.resumed_at = Some(Instant::now());
                let _ = events.send(DeviceEvent::Play {
                    ticket: track.ticket,
                });
            }
        }
        MediaKey::End => {
            if let Some(track) = loaded.take() {
                let _ = events.send(DeviceEvent::Ended {
                    ticket: track.ticket,
                });
            }
        }
    }
}

fn pause(loaded: &mut Option<Loaded>, events: &Sender<DeviceEvent>) {
    let Some(track) = loaded.as_mut() else {
        return;
    };
    if track.resolve_at.is_some() && track.resumed_at.is_none() {
        // Pausing aborts a pending play request.
        let ticket = track.ticket;
        *loaded = None;
        let error = PlaybackError::Rejected("AbortError".to_string());
        let _ = events.send(DeviceEvent::PlayRejected { ticket, error });
        return;
    }
    track.resolve_at = None;
    if track.resumed_at.is_some() {
        track.position = track.played(Instant::now());
        track.resumed_at = None;
        let _ = events.send(DeviceEvent::Pause {
            ticket: track.ticket,
        });
    }
}

fn on_deadline(loaded: &mut Option<Loaded>, events: &Sender<DeviceEvent>) {
    let now = Instant::now();
    let Some(track) = loaded.as_mut() else {
        return;
    };
    if track.resolve_at.is_some_and(|at| at <= now) {
        track.resolve_at = None;
        track.resumed_at = Some(now);
        let _ = events.send(DeviceEvent::PlayResolved {
            ticket: track.ticket,
        });
        return;
    }
    if track.resumed_at.is_some() && track.played(now) >= track.clip {
        let ticket = track.ticket;
        *loaded = None;
        let _ = events.send(DeviceEvent::Ended { ticket });
    }
}
