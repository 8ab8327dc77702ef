//! `voice-console`: drive the voice message playback controller from a terminal.
//!
//! One controller is built at startup around a simulated renderer thread (or no
//! device at all with `--no-device`). Each input line plays as a click on a
//! message row:
//! - `play m1 a.mp3 m2=b.mp3`: play `m1`, then `m2` when it ends
//! - `play m1 a.mp3` again while it plays: stop
//! - `pause` / `resume` / `end`: device-side media keys
//!
//! Status snapshots published by the controller are printed as they arrive.

mod commands;
mod config;
mod renderer;
mod view;

use std::io::BufRead;
use std::path::PathBuf;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use voice_player::{
    DeviceEventAdapter, NullDevice, PlaybackController, PlaybackDevice, Transition,
    adapter::dispatch, channel_device,
};

use commands::ConsoleCommand;
use config::{ConsoleConfig, Overrides};
use renderer::{MediaKey, RendererHandle};

#[derive(Parser, Debug)]
#[command(name = "voice-console", version)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Length of every simulated clip in milliseconds
    #[arg(long)]
    clip_ms: Option<u64>,

    /// Delay before a play request resolves, in milliseconds
    #[arg(long)]
    start_delay_ms: Option<u64>,

    /// Refuse play requests whose locator contains this substring (repeatable)
    #[arg(long = "reject")]
    reject: Vec<String>,

    /// Run without an audio device
    #[arg(long)]
    no_device: bool,

    /// Print status snapshots as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let file_config = match args.config.as_deref() {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::default(),
    };
    let settings = file_config.resolve(Overrides {
        clip_ms: args.clip_ms,
        start_delay_ms: args.start_delay_ms,
        reject: args.reject.clone(),
        no_device: args.no_device,
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (input_tx, input_rx) = crossbeam_channel::unbounded();
    let quit_tx = input_tx.clone();
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(ConsoleCommand::Quit);
    })
    .context("install ctrl-c handler")?;
    spawn_stdin_reader(input_tx);

    println!("{}", commands::HELP);

    match settings.renderer {
        Some(renderer_config) => {
            tracing::info!(
                clip_ms = renderer_config.clip.as_millis() as u64,
                start_delay_ms = renderer_config.start_delay.as_millis() as u64,
                "simulated renderer"
            );
            let (device, ends, adapter) = channel_device();
            let renderer = renderer::spawn_renderer(renderer_config, ends);
            let controller = PlaybackController::new(device, settings.player);
            run(controller, Some(&adapter), Some(renderer), input_rx, args.json)
        }
        None => {
            let controller = PlaybackController::new(NullDevice, settings.player);
            run(controller, None, None, input_rx, args.json)
        }
    }
}

/// Forward parsed stdin lines; EOF becomes `quit`.
fn spawn_stdin_reader(tx: Sender<ConsoleCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match commands::parse_line(&line) {
                Ok(Some(cmd)) => {
                    if tx.send(cmd).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{e:#}"),
            }
        }
        let _ = tx.send(ConsoleCommand::Quit);
    });
}

/// Print every published snapshot until the controller goes away.
fn spawn_status_printer<D: PlaybackDevice>(
    controller: &PlaybackController<D>,
    json: bool,
) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    std::thread::spawn(move || loop {
        match rx.blocking_recv() {
            Ok(status) => match view::render(&status, json) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("status render error: {e:#}"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "status printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    })
}

/// Own the controller on this thread and serialize input and device events into it.
fn run<D: PlaybackDevice>(
    mut controller: PlaybackController<D>,
    adapter: Option<&DeviceEventAdapter>,
    renderer: Option<RendererHandle>,
    input: Receiver<ConsoleCommand>,
    json: bool,
) -> Result<()> {
    let printer = spawn_status_printer(&controller, json);

    let no_events = crossbeam_channel::never();
    let mut events_open = adapter.is_some();

    loop {
        let events = match adapter {
            Some(adapter) if events_open => adapter.receiver(),
            _ => &no_events,
        };
        crossbeam_channel::select! {
            recv(input) -> cmd => {
                let Ok(cmd) = cmd else {
                    break;
                };
                if !apply(&mut controller, renderer.as_ref(), cmd, json)? {
                    break;
                }
            },
            recv(events) -> event => match event {
                Ok(event) => {
                    dispatch(&mut controller, event);
                    if let Some(adapter) = adapter {
                        adapter.pump(&mut controller);
                    }
                }
                Err(_) => {
                    tracing::warn!("renderer exited; device events closed");
                    events_open = false;
                }
            },
        }
    }

    drop(controller.dispose());
    if printer.join().is_err() {
        tracing::warn!("status printer panicked");
    }
    Ok(())
}

/// Apply one console command. Returns `false` to exit.
fn apply<D: PlaybackDevice>(
    controller: &mut PlaybackController<D>,
    renderer: Option<&RendererHandle>,
    cmd: ConsoleCommand,
    json: bool,
) -> Result<bool> {
    match cmd {
        ConsoleCommand::Play {
            id,
            url,
            continuation,
        } => match controller.play_or_toggle(url, id, continuation) {
            Transition::Ignored => println!("(ignored)"),
            Transition::Rejected(e) => println!("(not playing: {e})"),
            _ => {}
        },
        ConsoleCommand::Stop => controller.stop(),
        ConsoleCommand::Pause => press(renderer, MediaKey::Pause),
        ConsoleCommand::Resume => press(renderer, MediaKey::Resume),
        ConsoleCommand::End => press(renderer, MediaKey::End),
        ConsoleCommand::Status => println!("{}", view::render(&controller.status(), json)?),
        ConsoleCommand::Help => println!("{}", commands::HELP),
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn press(renderer: Option<&RendererHandle>, key: MediaKey) {
    match renderer {
        Some(renderer) => {
            if renderer.keys.send(key).is_err() {
                tracing::warn!(?key, "renderer not running");
            }
        }
        None => println!("(no device)"),
    }
}
