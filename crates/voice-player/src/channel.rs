//! Device handle that forwards commands to a renderer thread.
//!
//! [`ChannelDevice`] is the controller-side half; the renderer owns the
//! [`DeviceWorkerEnds`], executes [`DeviceCommand`]s and answers with
//! [`DeviceEvent`]s that a [`DeviceEventAdapter`] feeds back to the controller.

use crossbeam_channel::{Receiver, Sender};
use voice_bridge_types::ResourceLocator;

use crate::adapter::DeviceEventAdapter;
use crate::device::{DeviceEvent, LoadTicket, PlayRequest, PlaybackDevice, PlaybackError};

/// Commands accepted by a renderer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Replace the loaded resource.
    Load {
        ticket: LoadTicket,
        locator: ResourceLocator,
    },
    /// Start the loaded resource; answer with `PlayResolved` or `PlayRejected`.
    Play { ticket: LoadTicket },
    Pause,
    /// Rewind to the start of the loaded resource.
    ResetPosition,
    /// Leave the renderer loop.
    Quit,
}

/// Renderer-side channel ends.
pub struct DeviceWorkerEnds {
    pub commands: Receiver<DeviceCommand>,
    pub events: Sender<DeviceEvent>,
}

/// [`PlaybackDevice`] backed by a command channel.
///
/// Play requests always resolve asynchronously. Once the renderer hangs up the
/// device reports itself unavailable.
pub struct ChannelDevice {
    cmd_tx: Sender<DeviceCommand>,
    online: bool,
}

impl ChannelDevice {
    pub fn new(cmd_tx: Sender<DeviceCommand>) -> Self {
        Self {
            cmd_tx,
            online: true,
        }
    }

    fn send(&mut self, cmd: DeviceCommand) -> Result<(), PlaybackError> {
        if self.cmd_tx.send(cmd).is_err() {
            if self.online {
                tracing::warn!("renderer disconnected");
            }
            self.online = false;
            return Err(PlaybackError::DeviceUnavailable);
        }
        Ok(())
    }
}

impl PlaybackDevice for ChannelDevice {
    fn is_available(&self) -> bool {
        self.online
    }

    fn set_source(
        &mut self,
        ticket: LoadTicket,
        locator: &ResourceLocator,
    ) -> Result<(), PlaybackError> {
        self.send(DeviceCommand::Load {
            ticket,
            locator: locator.clone(),
        })
    }

    fn play(&mut self, ticket: LoadTicket) -> Result<PlayRequest, PlaybackError> {
        self.send(DeviceCommand::Play { ticket })?;
        Ok(PlayRequest::Pending)
    }

    fn pause(&mut self) {
        let _ = self.send(DeviceCommand::Pause);
    }

    fn reset_position(&mut self) {
        let _ = self.send(DeviceCommand::ResetPosition);
    }
}

impl Drop for ChannelDevice {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(DeviceCommand::Quit);
    }
}

/// Create a connected device handle, renderer ends and event adapter.
pub fn channel_device() -> (ChannelDevice, DeviceWorkerEnds, DeviceEventAdapter) {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    (
        ChannelDevice::new(cmd_tx),
        DeviceWorkerEnds {
            commands: cmd_rx,
            events: event_tx,
        },
        DeviceEventAdapter::new(event_rx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::controller::{PlaybackController, Transition};
    use voice_bridge_types::{PlaybackState, SessionId};

    #[test]
    fn play_sends_load_then_play() {
        let (device, worker, _adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());

        let t = c.play_or_toggle("a.mp3", "m1", vec![]);

        assert_eq!(t, Transition::Loading(SessionId::from("m1")));
        let cmds: Vec<_> = worker.commands.try_iter().collect();
        assert_eq!(
            cmds,
            vec![
                DeviceCommand::Load {
                    ticket: LoadTicket::new(1),
                    locator: ResourceLocator::from("a.mp3"),
                },
                DeviceCommand::Play {
                    ticket: LoadTicket::new(1)
                },
            ]
        );
    }

    #[test]
    fn stop_sends_pause_and_reset() {
        let (device, worker, _adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        c.play_or_toggle("a.mp3", "m1", vec![]);
        let _: Vec<_> = worker.commands.try_iter().collect();

        c.stop();

        let cmds: Vec<_> = worker.commands.try_iter().collect();
        assert_eq!(cmds, vec![DeviceCommand::Pause, DeviceCommand::ResetPosition]);
    }

    #[test]
    fn dropped_renderer_makes_device_unavailable() {
        let (device, worker, _adapter) = channel_device();
        let mut c = PlaybackController::new(device, PlayerConfig::default());
        drop(worker);

        let t = c.play_or_toggle("a.mp3", "m1", vec![]);
        assert_eq!(t, Transition::Rejected(PlaybackError::DeviceUnavailable));
        assert!(!c.device().is_available());

        assert_eq!(c.play_or_toggle("a.mp3", "m1", vec![]), Transition::Ignored);
        assert_eq!(c.state(), PlaybackState::Idle);
    }

    #[test]
    fn dropping_device_asks_renderer_to_quit() {
        let (device, worker, _adapter) = channel_device();
        drop(device);
        assert_eq!(worker.commands.try_recv().unwrap(), DeviceCommand::Quit);
    }
}
