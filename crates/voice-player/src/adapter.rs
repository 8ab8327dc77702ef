//! Bridge between a device's event stream and the controller.
//!
//! Devices running on their own thread push [`DeviceEvent`]s into a channel; the
//! thread that owns the controller drains it here, one event at a time, in the
//! order the device sent them.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::controller::{PlaybackController, Transition};
use crate::device::{DeviceEvent, PlaybackDevice, PlaybackError};

/// Receiving end of a device event channel.
pub struct DeviceEventAdapter {
    events: Receiver<DeviceEvent>,
}

impl DeviceEventAdapter {
    pub fn new(events: Receiver<DeviceEvent>) -> Self {
        Self { events }
    }

    /// Raw receiver, for callers multiplexing several channels with `select!`.
    pub fn receiver(&self) -> &Receiver<DeviceEvent> {
        &self.events
    }

    /// Apply every event already queued, without blocking.
    ///
    /// Returns the transitions in the order they happened.
    pub fn pump<D: PlaybackDevice>(
        &self,
        controller: &mut PlaybackController<D>,
    ) -> Vec<Transition> {
        self.events
            .try_iter()
            .map(|event| dispatch(controller, event))
            .collect()
    }

    /// Wait up to `timeout` for one event, then drain whatever else is queued.
    ///
    /// Returns an empty list on timeout and [`PlaybackError::DeviceUnavailable`]
    /// once the device side of the channel is gone.
    pub fn pump_timeout<D: PlaybackDevice>(
        &self,
        controller: &mut PlaybackController<D>,
        timeout: Duration,
    ) -> Result<Vec<Transition>, PlaybackError> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                let mut out = vec![dispatch(controller, event)];
                out.extend(self.pump(controller));
                Ok(out)
            }
            Err(RecvTimeoutError::Timeout) => Ok(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => Err(PlaybackError::DeviceUnavailable),
        }
    }
}

/// Apply one event and log the transition it caused.
pub fn dispatch<D: PlaybackDevice>(
    controller: &mut PlaybackController<D>,
    event: DeviceEvent,
) -> Transition {
    let kind = event.kind();
    let ticket = event.ticket();
    let transition = controller.handle_event(event);
    if transition != Transition::Ignored {
        tracing::trace!(event = kind, %ticket, ?transition, "device event applied");
    }
    transition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{DeviceCommand, channel_device};
    use crate::config::PlayerConfig;
    use voice_bridge_types::{PlaybackEndReason, PlaybackState, QueueEntry, SessionId};

    #[test]
    fn pump_applies_events_in_order() {
        let (device, worker, adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        c.play_or_toggle("a.mp3", "m1", vec![QueueEntry::new("b.mp3", "m2")]);

        let ticket = match worker.commands.try_recv().unwrap() {
            DeviceCommand::Load { ticket, .. } => ticket,
            other => panic!("unexpected command {other:?}"),
        };
        worker.events.send(DeviceEvent::PlayResolved { ticket }).unwrap();
        worker.events.send(DeviceEvent::Ended { ticket }).unwrap();

        let transitions = adapter.pump(&mut c);

        assert_eq!(
            transitions,
            vec![
                Transition::Playing(SessionId::from("m1")),
                Transition::Loading(SessionId::from("m2")),
            ]
        );
        assert_eq!(c.state(), PlaybackState::Loading);
    }

    #[test]
    fn pump_with_nothing_queued_is_empty() {
        let (device, _worker, adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        assert!(adapter.pump(&mut c).is_empty());
    }

    #[test]
    fn pump_timeout_returns_empty_on_timeout() {
        let (device, _worker, adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        let out = adapter
            .pump_timeout(&mut c, Duration::from_millis(5))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn pump_timeout_reports_disconnected_device() {
        let (device, worker, adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        drop(worker);

        let out = adapter.pump_timeout(&mut c, Duration::from_millis(5));

        assert_eq!(out, Err(PlaybackError::DeviceUnavailable));
    }

    #[test]
    fn end_from_worker_thread_finishes_session() {
        let (device, worker, adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        c.play_or_toggle("a.mp3", "m1", vec![]);

        let handle = std::thread::spawn(move || {
            while let Ok(cmd) = worker.commands.recv() {
                if let DeviceCommand::Play { ticket } = cmd {
                    worker.events.send(DeviceEvent::PlayResolved { ticket }).unwrap();
                    worker.events.send(DeviceEvent::Ended { ticket }).unwrap();
                    break;
                }
            }
        });
        handle.join().unwrap();

        let mut seen = Vec::new();
        while seen.len() < 2 {
            let batch = adapter
                .pump_timeout(&mut c, Duration::from_millis(200))
                .unwrap();
            assert!(!batch.is_empty());
            seen.extend(batch);
        }

        assert_eq!(seen[1], Transition::Idle(PlaybackEndReason::Eof));
        assert!(c.current_session_id().is_none());
    }
}
