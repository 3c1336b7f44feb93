//! Application-level configuration loading, including the room policy knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STUDY_ROOM_BACK_CONFIG_PATH";

/// Baked-in participant capacity per room.
const DEFAULT_ROOM_CAPACITY: usize = 10;
/// Baked-in length of generated room codes.
const DEFAULT_ROOM_CODE_LENGTH: usize = 6;
/// A study session needs the host plus at least one other participant.
const DEFAULT_MIN_SESSION_PARTICIPANTS: usize = 2;
/// Baked-in chat message length cap, in characters.
const DEFAULT_MAX_CHAT_MESSAGE_LEN: usize = 500;
/// Poll interval hint surfaced to clients, in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Maximum number of participants per room, host included.
    pub room_capacity: usize,
    /// Length of generated room codes.
    pub room_code_length: usize,
    /// Minimum total participants required to start a study session.
    pub min_session_participants: usize,
    /// Maximum accepted chat message length.
    pub max_chat_message_len: usize,
    /// Snapshot poll interval hint handed to clients.
    pub poll_interval_secs: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        capacity = app_config.room_capacity,
                        "loaded room configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room_capacity: DEFAULT_ROOM_CAPACITY,
            room_code_length: DEFAULT_ROOM_CODE_LENGTH,
            min_session_participants: DEFAULT_MIN_SESSION_PARTICIPANTS,
            max_chat_message_len: DEFAULT_MAX_CHAT_MESSAGE_LEN,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`]. Every field is optional and defaults apply
/// per-field.
struct RawConfig {
    room_capacity: Option<usize>,
    room_code_length: Option<usize>,
    min_session_participants: Option<usize>,
    max_chat_message_len: Option<usize>,
    poll_interval_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            room_capacity: value.room_capacity.unwrap_or(defaults.room_capacity),
            room_code_length: value.room_code_length.unwrap_or(defaults.room_code_length),
            min_session_participants: value
                .min_session_participants
                .unwrap_or(defaults.min_session_participants),
            max_chat_message_len: value
                .max_chat_message_len
                .unwrap_or(defaults.max_chat_message_len),
            poll_interval_secs: value
                .poll_interval_secs
                .unwrap_or(defaults.poll_interval_secs),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
