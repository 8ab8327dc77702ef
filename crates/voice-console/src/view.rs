//! Status rendering for the console.

use anyhow::Result;
use voice_player::{PlaybackEndReason, PlaybackState, PlaybackStatus};

/// One-line human description of a status snapshot.
pub fn describe(status: &PlaybackStatus) -> String {
    let session = status
        .session_id
        .as_ref()
        .map(|id| id.as_str())
        .unwrap_or("-");
    let locator = status
        .now_playing
        .as_ref()
        .map(|l| l.as_str())
        .unwrap_or("-");
    match status.state {
        PlaybackState::Idle => match status.end_reason {
            Some(reason) => format!("idle (last: {})", reason_label(reason)),
            None => "idle".to_string(),
        },
        PlaybackState::Loading => format!("loading {session} ({locator}){}", queued(status.queued)),
        PlaybackState::Playing => format!("playing {session} ({locator}){}", queued(status.queued)),
        PlaybackState::Paused => format!("paused {session} ({locator}){}", queued(status.queued)),
    }
}

fn reason_label(reason: PlaybackEndReason) -> &'static str {
    match reason {
        PlaybackEndReason::Eof => "finished",
        PlaybackEndReason::Stopped => "stopped",
        PlaybackEndReason::ToggledOff => "toggled off",
        PlaybackEndReason::Preempted => "pre-empted",
        PlaybackEndReason::Rejected => "rejected",
        PlaybackEndReason::Error => "error",
    }
}

fn queued(n: usize) -> String {
    match n {
        0 => String::new(),
        1 => ", 1 queued".to_string(),
        n => format!(", {n} queued"),
    }
}

/// Render a snapshot as text or JSON.
pub fn render(status: &PlaybackStatus, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string(status)?)
    } else {
        Ok(describe(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_player::{ResourceLocator, SessionId};

    #[test]
    fn describes_playing_with_queue() {
        let status = PlaybackStatus {
            state: PlaybackState::Playing,
            session_id: Some(SessionId::from("m1")),
            now_playing: Some(ResourceLocator::from("a.mp3")),
            playing: true,
            queued: 2,
            end_reason: None,
        };
        assert_eq!(describe(&status), "playing m1 (a.mp3), 2 queued");
    }

    #[test]
    fn describes_idle_with_reason() {
        let status = PlaybackStatus {
            end_reason: Some(PlaybackEndReason::ToggledOff),
            ..PlaybackStatus::default()
        };
        assert_eq!(describe(&status), "idle (last: toggled off)");
        assert_eq!(describe(&PlaybackStatus::default()), "idle");
    }

    #[test]
    fn renders_json() {
        let status = PlaybackStatus {
            state: PlaybackState::Loading,
            session_id: Some(SessionId::from("m1")),
            ..PlaybackStatus::default()
        };
        let json = render(&status, true).unwrap();
        assert!(json.contains(r#""state":"loading""#));
        assert!(json.contains(r#""session_id":"m1""#));
    }
}
