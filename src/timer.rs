use std::num::NonZeroU64;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::content::{self, Reminder};
use crate::notify::Notifier;


pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    TogglePause,
    ToggleSound,
    CheckStatus,
    AlertNow,
    Exit,
}

/// Sent from the timer thread to the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMessage {
    Refresh {
        status: StatusSnapshot,
        sound_enabled: bool,
    },
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub interval_minutes: u64,
    /// Whole minutes, truncated.
    pub minutes_remaining: u64,
    pub paused: bool,
}

/// Time spent paused does not count toward the interval. The last
/// reminder instant is left alone by pause and resume; the paused span is
/// subtracted from the elapsed time instead.
#[derive(Debug)]
pub struct ReminderState {
    interval_minutes: NonZeroU64,
    running: bool,
    paused_since: Option<Instant>,
    paused_total: Duration,
    last_reminder: Instant,
    sound_enabled: bool,
}

impl ReminderState {
    pub fn new(interval_minutes: NonZeroU64, sound_enabled: bool, now: Instant) -> ReminderState {
        ReminderState {
            interval_minutes,
            running: true,
            paused_since: None,
            paused_total: Duration::ZERO,
            last_reminder: now,
            sound_enabled,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.get().saturating_mul(60))
    }

    pub fn interval_minutes(&self) -> u64 {
        self.interval_minutes.get()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn last_reminder(&self) -> Instant {
        self.last_reminder
    }

    /// Active time since the last reminder.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let current_pause = self
            .paused_since
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since));

        now.saturating_duration_since(self.last_reminder)
            .saturating_sub(self.paused_total + current_pause)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.running && !self.is_paused() && self.elapsed(now) >= self.interval()
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_since.is_none() {
            self.paused_since = Some(now.max(self.last_reminder));
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total += now.saturating_duration_since(since);
        }
    }

    /// Returns the new paused value.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if self.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }

        self.is_paused()
    }

    /// Returns the new sound value.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn mark_fired(&mut self, now: Instant) {
        self.last_reminder = self.last_reminder.max(now);
        self.paused_total = Duration::ZERO;

        if self.paused_since.is_some() {
            self.paused_since = Some(self.last_reminder);
        }
    }

    pub fn status_snapshot(&self, now: Instant) -> StatusSnapshot {
        let remaining = self.interval().saturating_sub(self.elapsed(now));

        StatusSnapshot {
            interval_minutes: self.interval_minutes(),
            minutes_remaining: remaining.as_secs() / 60,
            paused: self.is_paused(),
        }
    }
}


/// Owns the reminder state and decides when the notifier gets called.
pub struct Scheduler<N: Notifier> {
    state: ReminderState,
    notifier: N,
    tx_ui: Sender<UiMessage>,
}

impl<N: Notifier> Scheduler<N> {
    pub fn new(state: ReminderState, notifier: N, tx_ui: Sender<UiMessage>) -> Scheduler<N> {
        Scheduler { state, notifier, tx_ui }
    }

    pub fn state(&self) -> &ReminderState {
        &self.state
    }

    pub fn status_snapshot(&self, now: Instant) -> StatusSnapshot {
        self.state.status_snapshot(now)
    }

    pub fn announce_start(&self, now: Instant) {
        let (title, message) = content::welcome_message(self.state.interval_minutes());
        self.notifier.notify(&title, &message);
        self.refresh(now);
    }

    /// Returns true if a reminder fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.state.is_due(now) {
            return false;
        }

        self.fire_reminder(now, false);
        true
    }

    pub fn fire_reminder_now(&mut self, now: Instant) {
        self.fire_reminder(now, true);
    }

    fn fire_reminder(&mut self, now: Instant, manual: bool) {
        let reminder = Reminder::random();

        info!("reminder ({}): {} / {}", if manual { "manual" } else { "due" }, reminder.title, reminder.message);

        if self.state.sound_enabled() {
            self.notifier.play_cue();
        }
        self.notifier.notify(reminder.title, reminder.message);

        self.state.mark_fired(now);
        self.refresh(now);
    }

    pub fn handle(&mut self, command: TimerCommand, now: Instant) {
        use TimerCommand::*;

        match command {
            TogglePause => {
                let paused = self.state.toggle_pause(now);
                info!("reminders {}", if paused { "paused" } else { "resumed" });

                self.refresh(now);
                let (title, message) = content::pause_summary(paused);
                self.notifier.notify(&title, &message);
            }

            ToggleSound => {
                let sound_enabled = self.state.toggle_sound();
                info!("sound {}", if sound_enabled { "on" } else { "off" });

                self.refresh(now);
                let (title, message) = content::sound_summary(sound_enabled);
                self.notifier.notify(&title, &message);
            }

            CheckStatus => {
                let (title, message) = content::status_message(&self.status_snapshot(now), chrono::Local::now());
                self.notifier.notify(&title, &message);
            }

            AlertNow => self.fire_reminder_now(now),

            Exit => {
                self.state.stop();
                self.send_ui(UiMessage::Exit);
            }
        }
    }

    fn refresh(&self, now: Instant) {
        self.send_ui(UiMessage::Refresh {
            status: self.status_snapshot(now),
            sound_enabled: self.state.sound_enabled(),
        });
    }

    fn send_ui(&self, message: UiMessage) {
        if self.tx_ui.send(message).is_err() {
            debug!("tray is gone, dropped {message:?}");
        }
    }
}


pub fn spawn_timer_thread<N>(rx: Receiver<TimerCommand>, mut scheduler: Scheduler<N>, poll: Duration) -> JoinHandle<()>
where
    N: Notifier + Send + 'static,
{
    std::thread::spawn(move || {
        scheduler.announce_start(Instant::now());

        let mut next_poll = Instant::now() + poll;

        while scheduler.state().is_running() {
            let wait = next_poll.saturating_duration_since(Instant::now());

            match rx.recv_timeout(wait) {
                // Commands do not move the poll deadline
                Ok(command) => scheduler.handle(command, Instant::now()),

                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    if !scheduler.tick(now) {
                        scheduler.refresh(now);
                    }

                    next_poll += poll;
                    if next_poll <= now {
                        next_poll = now + poll;
                    }
                }

                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command channel closed, stopping timer");
                    scheduler.handle(TimerCommand::Exit, Instant::now());
                }
            }
        }
    })
}
