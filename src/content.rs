use chrono::{DateTime, Local, TimeDelta};
use rand::seq::IndexedRandom;

use crate::timer::StatusSnapshot;


pub const APP_NAME: &str = "Movement Reminder";

pub const TITLES: &[&str] = &[
    "Time to stretch, cutie!",
    "Let's wiggle a bit!",
    "Stand up and shine!",
    "Movement break time!",
    "Time to flutter around!",
    "Stretch those lovely limbs!",
    "Let's get moving, bestie!",
    "Your body will thank you!",
    "Time for a little dance!",
    "Float around for a minute!",
];

pub const EXERCISES: &[&str] = &[
    "🙆‍♀️ Reach for the sky - 10 times!",
    "🤸‍♀️ Do 5 gentle stretches",
    "🚶‍♀️ Walk around for 2 minutes",
    "☀️ Look outside the window!",
    "🧘‍♀️ Take 5 deep breaths",
    "🔄 Roll your shoulders - feels amazing!",
    "🤗 Give yourself a hug (you deserve it!)",
    "👣 March in place for 30 seconds",
    "🌊 Gentle side-to-side stretches",
];

pub const BANNER: [&str; 3] = [
    "✨ Starting Movement Reminder App...",
    "💕 Look for the pink heart icon in your system tray!",
    "🎀 Right-click it to access settings and options.",
];

/// A title and an exercise suggestion, shown together as one popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub title: &'static str,
    pub message: &'static str,
}

impl Reminder {
    pub fn random() -> Reminder {
        Reminder {
            title: pick_title(),
            message: pick_exercise(),
        }
    }
}

pub fn pick_title() -> &'static str {
    pick(TITLES)
}

pub fn pick_exercise() -> &'static str {
    pick(EXERCISES)
}

fn pick(list: &'static [&'static str]) -> &'static str {
    list.choose(&mut rand::rng()).copied().unwrap_or_default()
}


// Menu labels

pub fn interval_label(interval_minutes: u64) -> String {
    format!("⏰ Every {interval_minutes} minutes")
}

pub fn sound_label(sound_enabled: bool) -> &'static str {
    if sound_enabled { "🔔 Sound ON ✓" } else { "🔔 Sound OFF" }
}

pub fn pause_label(paused: bool) -> &'static str {
    if paused { "▶️ Resume" } else { "⏸️ Pause" }
}

pub fn tooltip(status: &StatusSnapshot) -> String {
    if status.paused {
        format!("{APP_NAME} 💕 · paused")
    } else {
        format!("{APP_NAME} 💕 · next in {} min", status.minutes_remaining)
    }
}


// Notification text

pub fn welcome_message(interval_minutes: u64) -> (String, String) {
    (
        format!("{APP_NAME} Started!"),
        format!(
            "I'll remind you every {interval_minutes} minutes to move and stretch! \
             Right-click the pink heart icon for options. ✨"
        ),
    )
}

pub fn pause_summary(paused: bool) -> (String, String) {
    let status = if paused { "paused ⏸️" } else { "resumed ▶️" };

    (
        format!("{APP_NAME} {status}"),
        String::from("Right-click the tray icon to change this anytime!"),
    )
}

pub fn sound_summary(sound_enabled: bool) -> (String, String) {
    if sound_enabled {
        (String::from("Sound ON 🔔"), String::from("Notification sounds are now enabled! 🎵"))
    } else {
        (String::from("Sound OFF 🔇"), String::from("Notification sounds are now disabled."))
    }
}

pub fn status_message(status: &StatusSnapshot, now: DateTime<Local>) -> (String, String) {
    let state_line = if status.paused {
        String::from("⏸️ PAUSED")
    } else {
        match next_reminder_at(status.minutes_remaining, now) {
            Some(next_at) => format!("✅ Active (next around {})", next_at.format("%H:%M")),
            None => String::from("✅ Active"),
        }
    };

    (
        String::from("📊 Current Status"),
        format!(
            "⏰ Reminds every {} minutes\n⏳ Next in: {} min\n{}",
            status.interval_minutes, status.minutes_remaining, state_line
        ),
    )
}

/// None when the wall-clock time would be out of chrono's range.
fn next_reminder_at(minutes_remaining: u64, now: DateTime<Local>) -> Option<DateTime<Local>> {
    i64::try_from(minutes_remaining)
        .ok()
        .and_then(TimeDelta::try_minutes)
        .and_then(|delta| now.checked_add_signed(delta))
}
