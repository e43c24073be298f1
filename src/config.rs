//! Application-level configuration loading for the duel engine constants.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_DUEL_BACK_CONFIG_PATH";
/// Questions drawn into every game when the config does not say otherwise.
const DEFAULT_QUESTIONS_PER_GAME: usize = 5;
/// Grace window after the first finisher when the config does not say otherwise.
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    questions_per_game: usize,
    grace_period: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in engine defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        questions_per_game = app_config.questions_per_game,
                        grace_period_secs = app_config.grace_period.as_secs(),
                        "loaded engine configuration"
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

    /// Build a configuration with explicit values (used by tests).
    pub fn with_values(questions_per_game: usize, grace_period: Duration) -> Self {
        Self {
            questions_per_game,
            grace_period,
        }
    }

    /// Number of questions drawn into every game.
    pub fn questions_per_game(&self) -> usize {
        self.questions_per_game
    }

    /// Grace window granted to the slower player after the first finisher.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            questions_per_game: DEFAULT_QUESTIONS_PER_GAME,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    questions_per_game: Option<usize>,
    grace_period_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            questions_per_game: value
                .questions_per_game
                .unwrap_or(DEFAULT_QUESTIONS_PER_GAME),
            grace_period: value
                .grace_period_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_GRACE_PERIOD),
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
