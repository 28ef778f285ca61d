//! Application-level configuration loading: phase timers, content sources and
//! gameplay switches.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::state_machine::RoundPhase;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CAPTION_CLASH_CONFIG_PATH";
/// Public meme provider queried for each new round.
const DEFAULT_MEME_API_URL: &str = "https://meme-api.com/gimme";
/// Content shipped with the frontend, used whenever the provider cannot answer.
const DEFAULT_MEME_POOL: [&str; 3] = ["/memes/meme1.png", "/memes/meme2.png", "/memes/meme3.png"];

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub timers: TimerConfig,
    pub content: ContentConfig,
    pub rules: RulesConfig,
    /// Conditional write attempts before a store operation gives up.
    pub max_write_attempts: u32,
}

/// How long each phase lasts before it advances on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    pub enabled: bool,
    pub submission: Duration,
    pub voting: Duration,
    pub results: Duration,
}

impl TimerConfig {
    pub fn duration_for(&self, phase: RoundPhase) -> Duration {
        match phase {
            RoundPhase::Submission => self.submission,
            RoundPhase::Voting => self.voting,
            RoundPhase::Results => self.results,
        }
    }
}

/// Where round content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// Remote provider; `None` disables the network lookup entirely.
    pub remote_url: Option<String>,
    pub fetch_timeout: Duration,
    /// Never empty.
    pub fallback_pool: Vec<String>,
}

/// Gameplay switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    /// Reject a second vote from the same user within a round.
    pub single_vote_per_user: bool,
    pub max_caption_chars: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        pool = app_config.content.fallback_pool.len(),
                        timers = app_config.timers.enabled,
                        "loaded configuration"
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
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    timers: RawTimers,
    content: RawContent,
    voting: RawVoting,
    captions: RawCaptions,
    store: RawStore,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawTimers {
    enabled: bool,
    submission_secs: u64,
    voting_secs: u64,
    results_secs: u64,
}

impl Default for RawTimers {
    fn default() -> Self {
        Self {
            enabled: true,
            submission_secs: 60,
            voting_secs: 30,
            results_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawContent {
    remote_enabled: bool,
    remote_url: String,
    timeout_ms: u64,
    fallback_pool: Vec<String>,
}

impl Default for RawContent {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            remote_url: DEFAULT_MEME_API_URL.into(),
            timeout_ms: 3_000,
            fallback_pool: default_pool(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVoting {
    single_vote_per_user: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawCaptions {
    max_chars: usize,
}

impl Default for RawCaptions {
    fn default() -> Self {
        Self { max_chars: 280 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawStore {
    max_write_attempts: u32,
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            max_write_attempts: 3,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let RawConfig {
            timers,
            content,
            voting,
            captions,
            store,
        } = value;

        let fallback_pool: Vec<String> = content
            .fallback_pool
            .into_iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect();

        Self {
            timers: TimerConfig {
                enabled: timers.enabled,
                submission: Duration::from_secs(timers.submission_secs.max(1)),
                voting: Duration::from_secs(timers.voting_secs.max(1)),
                results: Duration::from_secs(timers.results_secs.max(1)),
            },
            content: ContentConfig {
                remote_url: Some(content.remote_url)
                    .filter(|url| content.remote_enabled && !url.trim().is_empty()),
                fetch_timeout: Duration::from_millis(content.timeout_ms.max(1)),
                fallback_pool: if fallback_pool.is_empty() {
                    default_pool()
                } else {
                    fallback_pool
                },
            },
            rules: RulesConfig {
                single_vote_per_user: voting.single_vote_per_user,
                max_caption_chars: captions.max_chars.max(1),
            },
            max_write_attempts: store.max_write_attempts.max(1),
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

fn default_pool() -> Vec<String> {
    DEFAULT_MEME_POOL.iter().map(|entry| entry.to_string()).collect()
}
