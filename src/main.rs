pub mod config;
pub mod content;
pub mod input;
pub mod notify;
pub mod sound;
pub mod timer;
pub mod tray;

use std::sync::mpsc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use console::style;
use log::info;

use config::{Args, Settings};
use notify::DesktopNotifier;
use sound::SoundCue;
use timer::{spawn_timer_thread, ReminderState, Scheduler, TimerCommand, UiMessage, POLL_INTERVAL};


fn print_banner() {
    for line in content::BANNER {
        println!("{}", style(line).magenta());
    }
    println!();
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    print_banner();

    let settings = Settings::load(Args::parse()).context("failed to load settings")?;
    info!(
        "reminding every {} minutes, sound {}, icon {}",
        settings.interval_minutes,
        if settings.sound_enabled { "on" } else { "off" },
        settings.icon_path.display()
    );

    let (tx_ui, rx_ui) = mpsc::channel::<UiMessage>();
    let (tx_timer, rx_timer) = mpsc::channel::<TimerCommand>();

    let event_loop = tray::event_loop();
    tray::spawn_ui_bridge(rx_ui, event_loop.create_proxy());
    input::spawn_signal_thread(event_loop.create_proxy()).context("failed to install signal handlers")?;

    let notifier = DesktopNotifier::new(SoundCue::detect(settings.sound_file.clone()));
    let state = ReminderState::new(settings.interval_minutes, settings.sound_enabled, Instant::now());
    spawn_timer_thread(rx_timer, Scheduler::new(state, notifier, tx_ui), POLL_INTERVAL);

    tray::run(event_loop, &settings, tx_timer).context("tray failed to start")?;

    Ok(())
}
