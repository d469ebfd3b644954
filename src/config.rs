use std::fs;
use std::io;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_derive::Deserialize;
use thiserror::Error;


pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;
pub const DEFAULT_ICON_PATH: &str = "icon.png";
pub const DEFAULT_CONFIG_PATH: &str = "movebreak.toml";

const DEFAULT_INTERVAL: NonZeroU64 = match NonZeroU64::new(DEFAULT_INTERVAL_MINUTES) {
    Some(minutes) => minutes,
    None => panic!("default interval must be positive"),
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Reminds you to get up and move.
#[derive(Debug, Default, Parser)]
#[command(version)]
pub struct Args {
    /// Minutes between reminders
    #[arg(short, long, value_name = "MINUTES")]
    pub interval: Option<NonZeroU64>,

    /// Tray icon image, any common raster format
    #[arg(long, value_name = "PATH")]
    pub icon: Option<PathBuf>,

    /// Play this audio file instead of the system sound
    #[arg(long, value_name = "PATH")]
    pub sound_file: Option<PathBuf>,

    /// Start with sound turned off
    #[arg(short, long)]
    pub mute: bool,

    /// Read settings from this TOML file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Optional keys of the TOML file. Never written back.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub interval_minutes: Option<NonZeroU64>,
    pub sound_enabled: Option<bool>,
    pub icon_path: Option<PathBuf>,
    pub sound_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(path: &Path, text: &str) -> Result<FileConfig, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// An explicitly named file must exist; the default one is optional.
    pub fn load(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let path = explicit.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        match fs::read_to_string(path) {
            Ok(text) => FileConfig::parse(path, &text),
            Err(why) if why.kind() == io::ErrorKind::NotFound && explicit.is_none() => Ok(FileConfig::default()),
            Err(source) => Err(ConfigError::Read { path: path.to_path_buf(), source }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub interval_minutes: NonZeroU64,
    pub sound_enabled: bool,
    pub icon_path: PathBuf,
    pub sound_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            interval_minutes: DEFAULT_INTERVAL,
            sound_enabled: true,
            icon_path: PathBuf::from(DEFAULT_ICON_PATH),
            sound_file: None,
        }
    }
}

impl Settings {
    pub fn load(args: Args) -> Result<Settings, ConfigError> {
        let file = FileConfig::load(args.config.as_deref())?;
        Ok(Settings::merge(args, file))
    }

    /// Flags win over the file, the file wins over defaults.
    pub fn merge(args: Args, file: FileConfig) -> Settings {
        let defaults = Settings::default();

        Settings {
            interval_minutes: args.interval.or(file.interval_minutes).unwrap_or(defaults.interval_minutes),
            sound_enabled: !args.mute && file.sound_enabled.unwrap_or(defaults.sound_enabled),
            icon_path: args.icon.or(file.icon_path).unwrap_or(defaults.icon_path),
            sound_file: args.sound_file.or(file.sound_file),
        }
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn minutes(m: u64) -> NonZeroU64 {
        NonZeroU64::new(m).unwrap()
    }

    #[test]
    fn defaults_match_the_built_in_constants() {
        let settings = Settings::default();

        assert_eq!(settings.interval_minutes.get(), 30);
        assert!(settings.sound_enabled);
        assert_eq!(settings.icon_path, PathBuf::from("icon.png"));
        assert_eq!(settings.sound_file, None);
    }

    #[test]
    fn flags_override_file_and_file_overrides_defaults() {
        let file = FileConfig {
            interval_minutes: Some(minutes(45)),
            sound_enabled: Some(true),
            icon_path: Some(PathBuf::from("fox.jpg")),
            sound_file: Some(PathBuf::from("ding.wav")),
        };
        let args = Args {
            interval: Some(minutes(20)),
            mute: true,
            ..Args::default()
        };

        let settings = Settings::merge(args, file);

        assert_eq!(
            settings,
            Settings {
                interval_minutes: minutes(20),
                sound_enabled: false,
                icon_path: PathBuf::from("fox.jpg"),
                sound_file: Some(PathBuf::from("ding.wav")),
            }
        );
    }

    #[test]
    fn parses_a_partial_file() {
        let file = FileConfig::parse(Path::new("t.toml"), "interval_minutes = 50\nsound_enabled = false\n").unwrap();

        assert_eq!(file.interval_minutes, Some(minutes(50)));
        assert_eq!(file.sound_enabled, Some(false));
        assert_eq!(file.icon_path, None);

        let settings = Settings::merge(Args::default(), file);
        assert_eq!(settings.interval_minutes, minutes(50));
        assert!(!settings.sound_enabled);
    }

    #[test]
    fn rejects_zero_interval_and_unknown_keys() {
        assert!(matches!(
            FileConfig::parse(Path::new("t.toml"), "interval_minutes = 0"),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            FileConfig::parse(Path::new("t.toml"), "interval = 10"),
            Err(ConfigError::Parse { .. })
        ));

        assert!(Args::try_parse_from(["movebreak", "--interval", "0"]).is_err());
    }

    #[test]
    fn cli_flags_parse() {
        let args = Args::try_parse_from(["movebreak", "-i", "15", "--icon", "me.png", "-m"]).unwrap();

        assert_eq!(args.interval, Some(minutes(15)));
        assert_eq!(args.icon, Some(PathBuf::from("me.png")));
        assert!(args.mute);
        assert_eq!(args.config, None);
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        assert!(matches!(FileConfig::load(Some(&missing)), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn loads_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movebreak.toml");
        fs::write(&path, "icon_path = \"heart.png\"\n").unwrap();

        let file = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(file.icon_path, Some(PathBuf::from("heart.png")));
    }
}
