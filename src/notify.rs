use log::warn;
use notify_rust::{Notification, Timeout};

use crate::content::APP_NAME;
use crate::sound::SoundCue;


const POPUP_TIMEOUT_MS: u32 = 10_000;

/// Where reminders and state summaries end up.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
    fn play_cue(&self);
}

pub struct DesktopNotifier {
    cue: SoundCue,
}

impl DesktopNotifier {
    pub fn new(cue: SoundCue) -> DesktopNotifier {
        DesktopNotifier { cue }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let shown = Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(message)
            .timeout(Timeout::Milliseconds(POPUP_TIMEOUT_MS))
            .show();

        if let Err(why) = shown {
            warn!("could not show notification {title:?}: {why}");
        }
    }

    fn play_cue(&self) {
        self.cue.play();
    }
}
