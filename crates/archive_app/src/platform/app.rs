use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use archive_core::{update, AppState, Msg};
use archive_logging::{archive_debug, archive_info, archive_warn};
use clap::Parser;
use log::LevelFilter;

use super::cli::Cli;
use super::config::ClientConfig;
use super::console::{self, Command};
use super::effects::EffectRunner;
use super::persistence;

/// Everything the main loop reacts to.
pub(crate) enum AppEvent {
    Msg(Msg),
    Quit,
}

pub fn run_app() -> Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("invalid configuration")?;
    archive_logging::initialize(config.log_destination, LevelFilter::Info, &config.log_path());
    archive_info!("Starting archive viewer against {}", config.api_root);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(&config, event_tx.clone())?;
    spawn_input_reader(event_tx.clone());

    // A location on the command line wins over the saved session.
    let location = cli
        .location
        .or_else(|| persistence::load_location(&config.state_dir));
    event_tx
        .send(AppEvent::Msg(Msg::Started { location }))
        .context("event channel closed before start")?;
    drop(event_tx);

    let mut state = AppState::with_poll_interval(config.poll_interval);
    println!("{}", console::HELP);

    while let Ok(event) = event_rx.recv() {
        // Apply everything already queued before rendering once.
        let mut pending = vec![event];
        pending.extend(event_rx.try_iter());
        for event in pending {
            match event {
                AppEvent::Msg(msg) => state = dispatch_msg(state, msg, &runner),
                AppEvent::Quit => {
                    archive_info!("Quit requested");
                    return Ok(());
                }
            }
        }
        if state.consume_dirty() {
            print!("{}", console::render(&state.view(), state.location()));
        }
    }
    archive_info!("Input closed; exiting");
    Ok(())
}

fn dispatch_msg(state: AppState, msg: Msg, runner: &EffectRunner) -> AppState {
    archive_debug!("Dispatching {:?}", msg);
    let (state, effects) = update(state, msg);
    runner.enqueue(effects);
    state
}

fn spawn_input_reader(events: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    archive_warn!("Failed to read input: {}", err);
                    break;
                }
            };
            let event = match console::parse_command(&line) {
                Ok(Some(Command::Dispatch(msg))) => AppEvent::Msg(msg),
                Ok(Some(Command::Quit)) => AppEvent::Quit,
                Ok(Some(Command::Help)) => {
                    println!("{}", console::HELP);
                    continue;
                }
                Ok(None) => continue,
                Err(problem) => {
                    println!("{problem}");
                    continue;
                }
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(AppEvent::Quit);
    });
}
