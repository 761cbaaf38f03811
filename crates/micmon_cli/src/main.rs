//! MicMonitor - headless host for the audio engine
//!
//! Loads the last-used settings, starts monitoring on the default devices,
//! and accepts control commands on stdin until `quit` or Ctrl+C.

mod commands;

use std::io::{self, BufRead};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use micmon_core::{
    AudioBackend, AudioEngine, CpalBackend, EngineConfig, ErrorMessage, MonitorSettings,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{ConsoleCommand, HELP};

/// Depth of the queue between the audio thread's error sink and the main loop
const ERROR_QUEUE_DEPTH: usize = 16;

#[derive(Parser, Debug)]
#[command(
    name = "micmon",
    version,
    about = "Monitor your microphone through your headset in real time"
)]
struct Args {
    /// Monitoring volume (0-100), overrides the saved value
    #[arg(long)]
    volume: Option<i32>,

    /// Latency in milliseconds (5-100), overrides the saved value
    #[arg(long)]
    latency: Option<i32>,

    /// Settings file to use instead of the platform default
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Only start monitoring if it was enabled when last saved
    #[arg(long)]
    resume: bool,

    /// Do not write settings on exit
    #[arg(long)]
    no_save: bool,
}

enum Control {
    Command(ConsoleCommand),
    Shutdown,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("micmon=info,micmon_core=info,micmon_platform=info")
            }),
        )
        .init();

    let args = Args::parse();
    info!("Starting MicMonitor");

    let mut settings = match &args.settings {
        Some(path) => MonitorSettings::load_from(path),
        None => MonitorSettings::load(),
    };
    if let Some(volume) = args.volume {
        settings.volume = volume;
    }
    if let Some(latency) = args.latency {
        settings.latency_ms = latency;
    }
    let settings = settings.clamped();

    let mut engine = AudioEngine::with_config(CpalBackend::new(), EngineConfig::from(&settings));

    // Runs on the audio thread: must never block
    let (error_tx, error_rx) = bounded::<ErrorMessage>(ERROR_QUEUE_DEPTH);
    engine.set_error_callback(move |message| {
        let _ = error_tx.try_send(message);
    });

    let (control_tx, control_rx) = unbounded::<Control>();
    let ctrlc_tx = control_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Control::Shutdown);
    })
    .context("failed to install Ctrl+C handler")?;
    spawn_console(control_tx).context("failed to spawn console reader")?;

    if !args.resume || settings.monitoring_enabled {
        if engine.start() {
            println!(
                "monitoring: volume {}, latency {} ms (type `help` for commands)",
                engine.volume(),
                engine.latency_ms()
            );
        }
    } else {
        println!("monitoring paused (type `start` to begin)");
    }

    run(&mut engine, &control_rx, &error_rx);

    let snapshot = MonitorSettings::capture(&engine);
    engine.stop();

    if !args.no_save {
        let saved = match &args.settings {
            Some(path) => snapshot.save_to(path),
            None => snapshot.save().map(|_| ()),
        };
        if let Err(e) = saved {
            error!("Failed to save settings: {}", e);
        }
    }

    info!("MicMonitor exited");
    Ok(())
}

/// Read console lines on a background thread and forward parsed commands
fn spawn_console(control: Sender<Control>) -> io::Result<()> {
    thread::Builder::new()
        .name("micmon-console".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(command) => {
                        if control.send(Control::Command(command)).is_err() {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            debug!("Console input closed");
        })?;
    Ok(())
}

fn run<B: AudioBackend>(
    engine: &mut AudioEngine<B>,
    control: &Receiver<Control>,
    errors: &Receiver<ErrorMessage>,
) {
    loop {
        select! {
            recv(control) -> message => match message {
                Ok(Control::Command(command)) => {
                    if apply(engine, command).is_break() {
                        break;
                    }
                }
                Ok(Control::Shutdown) | Err(_) => break,
            },
            recv(errors) -> message => {
                if let Ok(message) = message {
                    warn!("Audio engine: {}", message);
                }
            }
        }
    }
}

fn apply<B: AudioBackend>(
    engine: &mut AudioEngine<B>,
    command: ConsoleCommand,
) -> ControlFlow<()> {
    match command {
        ConsoleCommand::Volume(volume) => {
            engine.set_volume(volume);
            println!("volume {}", engine.volume());
        }
        ConsoleCommand::Latency(latency) => {
            let was_running = engine.is_running();
            engine.set_latency(latency);
            println!("latency {} ms ({} frames)", engine.latency_ms(), engine.block_size());
            if was_running && !engine.is_running() {
                println!("restart failed; monitoring stopped");
            }
        }
        ConsoleCommand::Start => {
            if engine.start() {
                println!("monitoring started");
            } else if let Some(message) = engine.last_error() {
                println!("start failed: {}", message);
            }
        }
        ConsoleCommand::Stop => {
            engine.stop();
            println!("monitoring stopped");
        }
        ConsoleCommand::Status => print_status(engine),
        ConsoleCommand::Clear => engine.clear_error(),
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn print_status<B: AudioBackend>(engine: &AudioEngine<B>) {
    println!(
        "{:?}: volume {}, latency {} ms",
        engine.state(),
        engine.volume(),
        engine.latency_ms()
    );
    if let Some(stream) = engine.active_stream() {
        println!(
            "stream: {} Hz, {} ch, {} frames",
            stream.sample_rate, stream.channels, stream.buffer_size
        );
    }
    if let Some(message) = engine.last_error() {
        println!("last error: {}", message);
    }
}
