use std::cell::Cell;
use std::io;
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Once;
use std::thread;

use rusty_audio::Audio;
use thiserror::Error;


pub const MACOS_PLAYER: &str = "afplay";
pub const MACOS_SOUND: &str = "/System/Library/Sounds/Glass.aiff";

pub const LINUX_PLAYER: &str = "paplay";
pub const LINUX_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/message.oga";

#[derive(Debug, Error)]
pub enum CueError {
    #[error("no sound cue for platform `{0}`")]
    Unsupported(String),

    #[error("sound asset {} does not exist", .0.display())]
    MissingAsset(PathBuf),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit {
        program: &'static str,
        status: ExitStatus,
    },

    #[error("system beep failed")]
    Beep,

    #[error("could not play {}", .0.display())]
    Audio(PathBuf),
}

/// How the host plays its built-in notification sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuePlatform {
    /// System message beep.
    Windows,
    /// `afplay` with the Glass system sound.
    MacOs,
    /// `paplay` with the freedesktop message sound.
    Linux,
    Unsupported,
}

impl CuePlatform {
    pub fn detect() -> CuePlatform {
        CuePlatform::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> CuePlatform {
        match os {
            "windows" => CuePlatform::Windows,
            "macos" => CuePlatform::MacOs,
            "linux" => CuePlatform::Linux,
            _ => CuePlatform::Unsupported,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SoundCue {
    platform: CuePlatform,
    custom: Option<PathBuf>,
}

impl SoundCue {
    pub fn new(platform: CuePlatform, custom: Option<PathBuf>) -> SoundCue {
        SoundCue { platform, custom }
    }

    pub fn detect(custom: Option<PathBuf>) -> SoundCue {
        SoundCue::new(CuePlatform::detect(), custom)
    }

    /// Plays the cue, blocking until playback ends. Never fails.
    pub fn play(&self) {
        self.try_play().unwrap_or_else(discard);
    }

    pub fn try_play(&self) -> Result<(), CueError> {
        if let Some(path) = &self.custom {
            return play_file(path);
        }

        match self.platform {
            CuePlatform::Windows => system_beep(),
            CuePlatform::MacOs => run_player(MACOS_PLAYER, Path::new(MACOS_SOUND)),
            CuePlatform::Linux => run_player(LINUX_PLAYER, Path::new(LINUX_SOUND)),
            CuePlatform::Unsupported => Err(CueError::Unsupported(std::env::consts::OS.to_string())),
        }
    }
}

/// Sound is optional: a missing player, asset or audio device is
/// dropped here without logging.
fn discard(_: CueError) {}

fn run_player(program: &'static str, asset: &Path) -> Result<(), CueError> {
    if !asset.exists() {
        return Err(CueError::MissingAsset(asset.to_path_buf()));
    }

    let status = Command::new(program)
        .arg(asset)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| CueError::Spawn { program, source })?;

    if status.success() {
        Ok(())
    } else {
        Err(CueError::Exit { program, status })
    }
}

fn play_file(path: &Path) -> Result<(), CueError> {
    if !path.is_file() {
        return Err(CueError::MissingAsset(path.to_path_buf()));
    }

    let owned = path.to_path_buf();

    // rusty_audio panics on undecodable files and missing output devices.
    quietly(move || {
        let mut audio = Audio::new();
        audio.add("cue", owned);
        audio.play("cue");
        audio.wait();
    })
    .map_err(|_| CueError::Audio(path.to_path_buf()))
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Like `catch_unwind`, but a panic inside `f` is not reported by the
/// panic hook. Panics elsewhere still reach the previous hook.
fn quietly<F, R>(f: F) -> thread::Result<R>
where
    F: FnOnce() -> R + UnwindSafe,
{
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });

    QUIET_PANICS.with(|quiet| quiet.set(true));
    let result = panic::catch_unwind(f);
    QUIET_PANICS.with(|quiet| quiet.set(false));

    result
}

#[cfg(windows)]
fn system_beep() -> Result<(), CueError> {
    use windows_sys::Win32::System::Diagnostics::Debug::MessageBeep;
    use windows_sys::Win32::UI::WindowsAndMessaging::MB_ICONASTERISK;

    // SAFETY: MessageBeep takes a plain flag value and touches no caller memory.
    let ok = unsafe { MessageBeep(MB_ICONASTERISK) };
    if ok != 0 { Ok(()) } else { Err(CueError::Beep) }
}

#[cfg(not(windows))]
fn system_beep() -> Result<(), CueError> {
    Err(CueError::Unsupported(std::env::consts::OS.to_string()))
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn platform_from_os_name() {
        assert_eq!(CuePlatform::from_os("windows"), CuePlatform::Windows);
        assert_eq!(CuePlatform::from_os("macos"), CuePlatform::MacOs);
        assert_eq!(CuePlatform::from_os("linux"), CuePlatform::Linux);
        assert_eq!(CuePlatform::from_os("freebsd"), CuePlatform::Unsupported);
        assert_eq!(CuePlatform::from_os(""), CuePlatform::Unsupported);
    }

    #[test]
    fn unsupported_platform_is_an_error_but_play_is_silent() {
        let cue = SoundCue::new(CuePlatform::Unsupported, None);

        assert!(matches!(cue.try_play(), Err(CueError::Unsupported(_))));
        cue.play();
    }

    #[test]
    fn missing_custom_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.wav");
        let cue = SoundCue::new(CuePlatform::Linux, Some(path.clone()));

        match cue.try_play() {
            Err(CueError::MissingAsset(missing)) => assert_eq!(missing, path),
            other => panic!("unexpected result: {other:?}"),
        }
        cue.play();
    }

    #[test]
    fn quietly_catches_panics_and_resets() {
        let caught = quietly(|| -> u8 { panic!("undecodable cue") });
        assert!(caught.is_err());
        assert!(!QUIET_PANICS.with(Cell::get));

        assert_eq!(quietly(|| 7).unwrap(), 7);
        assert!(!QUIET_PANICS.with(Cell::get));
    }

    #[test]
    fn missing_player_asset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("ding.oga");

        assert!(matches!(
            run_player(LINUX_PLAYER, &asset),
            Err(CueError::MissingAsset(_))
        ));
    }

    #[test]
    fn missing_player_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("ding.oga");
        std::fs::write(&asset, b"not really audio").unwrap();

        assert!(matches!(
            run_player("movebreak-no-such-player", &asset),
            Err(CueError::Spawn { .. })
        ));
    }
}
