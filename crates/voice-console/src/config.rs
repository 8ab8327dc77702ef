//! Console configuration loading.
//!
//! An optional TOML file provides defaults; command-line flags override it.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use voice_player::PlayerConfig;

/// Top-level console configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Simulated renderer settings.
    pub renderer: RendererSection,
    /// Controller tuning.
    pub player: PlayerSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RendererSection {
    /// Disable the renderer entirely (no audio output available).
    pub disabled: Option<bool>,
    /// Default clip length in milliseconds.
    pub clip_ms: Option<u64>,
    /// Delay before a play request resolves, in milliseconds.
    pub start_delay_ms: Option<u64>,
    /// Locator substrings whose play requests are refused.
    pub reject: Option<Vec<String>>,
    /// Locator -> clip length overrides in milliseconds.
    pub durations: Option<HashMap<String, u64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerSection {
    pub continuation_limit: Option<usize>,
    pub status_capacity: Option<usize>,
}

/// Flags that take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub clip_ms: Option<u64>,
    pub start_delay_ms: Option<u64>,
    pub reject: Vec<String>,
    pub no_device: bool,
}

/// Resolved settings for the simulated renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub clip: Duration,
    pub start_delay: Duration,
    pub reject: Vec<String>,
    pub durations: HashMap<String, Duration>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clip: Duration::from_millis(3_000),
            start_delay: Duration::from_millis(150),
            reject: Vec::new(),
            durations: HashMap::new(),
        }
    }
}

impl RendererConfig {
    /// Clip length for `locator`, falling back to the default length.
    pub fn clip_for(&self, locator: &str) -> Duration {
        self.durations.get(locator).copied().unwrap_or(self.clip)
    }

    /// Whether a play request for `locator` should be refused.
    pub fn rejects(&self, locator: &str) -> bool {
        self.reject
            .iter()
            .any(|needle| !needle.is_empty() && locator.contains(needle.as_str()))
    }
}

/// Fully resolved console settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_filter: String,
    /// `None` when no renderer should be started.
    pub renderer: Option<RendererConfig>,
    pub player: PlayerConfig,
}

const DEFAULT_LOG_FILTER: &str = "info,voice_player=info,voice_console=info";

impl ConsoleConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse config {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str::<ConsoleConfig>(raw)?)
    }

    /// Merge file values, flag overrides and built-in defaults.
    pub fn resolve(self, overrides: Overrides) -> Settings {
        let defaults = RendererConfig::default();
        let disabled = overrides.no_device || self.renderer.disabled.unwrap_or(false);

        let renderer = if disabled {
            None
        } else {
            let mut reject = self.renderer.reject.unwrap_or_default();
            reject.extend(overrides.reject);
            Some(RendererConfig {
                clip: overrides
                    .clip_ms
                    .or(self.renderer.clip_ms)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.clip),
                start_delay: overrides
                    .start_delay_ms
                    .or(self.renderer.start_delay_ms)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.start_delay),
                reject,
                durations: self
                    .renderer
                    .durations
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(locator, ms)| (locator, Duration::from_millis(ms)))
                    .collect(),
            })
        };

        let player_defaults = PlayerConfig::default();
        let player = PlayerConfig {
            continuation_limit: self
                .player
                .continuation_limit
                .unwrap_or(player_defaults.continuation_limit),
            status_capacity: self
                .player
                .status_capacity
                .unwrap_or(player_defaults.status_capacity),
        };

        Settings {
            log_filter: self
                .log_filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            renderer,
            player,
        }
    }
}
