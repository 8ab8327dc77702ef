//! Line commands typed into the console.

use anyhow::{Result, anyhow, bail};
use voice_player::QueueEntry;

pub const HELP: &str = "\
commands:
  play <id> <url> [<id>=<url> ...]   play a message, then the listed ones in order
  stop                               stop playback and drop the queue
  pause | resume                     media key pause/resume (device side)
  end                                finish the current clip now (device side)
  status                             print the controller status
  help                               show this help
  quit                               exit";

/// Parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Play {
        id: String,
        url: String,
        continuation: Vec<QueueEntry>,
    },
    Stop,
    Pause,
    Resume,
    End,
    Status,
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "play" | "p" => {
            let id = parts.next().ok_or_else(|| anyhow!("play: missing message id"))?;
            let url = parts.next().ok_or_else(|| anyhow!("play: missing url"))?;
            let continuation = parts
                .map(parse_queue_entry)
                .collect::<Result<Vec<_>>>()?;
            ConsoleCommand::Play {
                id: id.to_string(),
                url: url.to_string(),
                continuation,
            }
        }
        "stop" | "s" => ConsoleCommand::Stop,
        "pause" => ConsoleCommand::Pause,
        "resume" => ConsoleCommand::Resume,
        "end" => ConsoleCommand::End,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        other => bail!("unknown command: {other} (try `help`)"),
    };
    Ok(Some(cmd))
}

fn parse_queue_entry(token: &str) -> Result<QueueEntry> {
    let (id, url) = token
        .split_once('=')
        .ok_or_else(|| anyhow!("queue entry must be <id>=<url>: {token}"))?;
    Ok(QueueEntry::new(url, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_play_with_continuation() {
        let cmd = parse_line("play m1 a.mp3 m2=b.mp3 m3=c.mp3").unwrap().unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::Play {
                id: "m1".to_string(),
                url: "a.mp3".to_string(),
                continuation: vec![QueueEntry::new("b.mp3", "m2"), QueueEntry::new("c.mp3", "m3")],
            }
        );
    }

    #[test]
    fn keeps_equals_signs_inside_urls() {
        let cmd = parse_line("play m1 a.mp3 m2=https://cdn/b.mp3?sig=x").unwrap().unwrap();
        let ConsoleCommand::Play { continuation, .. } = cmd else {
            panic!("expected play");
        };
        assert_eq!(continuation[0].url.as_str(), "https://cdn/b.mp3?sig=x");
    }

    #[test]
    fn blank_line_is_none() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn short_verbs_and_case_are_accepted() {
        assert_eq!(parse_line("STOP").unwrap(), Some(ConsoleCommand::Stop));
        assert_eq!(parse_line("q").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(parse_line("end").unwrap(), Some(ConsoleCommand::End));
    }

    #[test]
    fn rejects_incomplete_or_unknown_input() {
        assert!(parse_line("play m1").is_err());
        assert!(parse_line("play m1 a.mp3 b.mp3").is_err());
        assert!(parse_line("rewind").is_err());
    }
}
