//! # Engine Configuration
//!
//! Loaded once at startup from TOML, then overridden from the environment.
//!
//! ```toml
//! worker_threads = 4
//! render_timeout_ms = 6000
//! click_throttle_ms = 200
//! reopen_reasons = ["player", "open_new", "disconnect", "shutdown", "unknown"]
//! ```

use crate::error::{InterfacesError, InterfacesResult};
use satchel_shared::CloseReason;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the worker pool size.
pub const WORKER_THREADS_ENV: &str = "SATCHEL_WORKER_THREADS";

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterfacesConfig {
    /// Worker threads of the owned runtime.
    pub worker_threads: usize,
    /// Hard bound on one render pass.
    pub render_timeout_ms: u64,
    /// Hard bound on one transform run.
    pub transform_timeout_ms: u64,
    /// Minimum gap between two clicks of the same player.
    pub click_throttle_ms: u64,
    /// How long a click handler may keep completing later.
    pub max_click_wait_ms: u64,
    /// Debounce window of lazily loaded properties.
    pub property_debounce_ms: u64,
    /// Default chat query timeout.
    pub query_timeout_ms: u64,
    /// Retries before a player whose inventory interface cannot be built is disconnected.
    pub max_player_build_retries: u32,
    /// Close reasons that re-open a backgrounded view.
    pub reopen_reasons: Vec<CloseReason>,
}

impl Default for InterfacesConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            render_timeout_ms: 6_000,
            transform_timeout_ms: 6_000,
            click_throttle_ms: 200,
            max_click_wait_ms: 6_000,
            property_debounce_ms: 200,
            query_timeout_ms: 30_000,
            max_player_build_retries: 3,
            reopen_reasons: CloseReason::default_reopen_reasons(),
        }
    }
}

impl InterfacesConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> InterfacesResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| InterfacesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> InterfacesResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| InterfacesError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Applies environment overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> InterfacesResult<Self> {
        if let Ok(raw) = std::env::var(WORKER_THREADS_ENV) {
            self.worker_threads = raw
                .trim()
                .parse()
                .map_err(|_| InterfacesError::Config(format!("{WORKER_THREADS_ENV}={raw} is not a number")))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> InterfacesResult<()> {
        if self.worker_threads == 0 {
            return Err(InterfacesError::Config("worker_threads must be at least 1".into()));
        }
        let bounds = [
            ("render_timeout_ms", self.render_timeout_ms),
            ("transform_timeout_ms", self.transform_timeout_ms),
            ("max_click_wait_ms", self.max_click_wait_ms),
            ("query_timeout_ms", self.query_timeout_ms),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, value)| *value == 0) {
            return Err(InterfacesError::Config(format!("{name} must be positive")));
        }
        Ok(())
    }

    /// Render bound as a duration.
    #[inline]
    #[must_use]
    pub const fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// Transform bound as a duration.
    #[inline]
    #[must_use]
    pub const fn transform_timeout(&self) -> Duration {
        Duration::from_millis(self.transform_timeout_ms)
    }

    /// Click throttle window as a duration.
    #[inline]
    #[must_use]
    pub const fn click_throttle(&self) -> Duration {
        Duration::from_millis(self.click_throttle_ms)
    }

    /// Maximum deferred click completion as a duration.
    #[inline]
    #[must_use]
    pub const fn max_click_wait(&self) -> Duration {
        Duration::from_millis(self.max_click_wait_ms)
    }

    /// Property debounce window as a duration.
    #[inline]
    #[must_use]
    pub const fn property_debounce(&self) -> Duration {
        Duration::from_millis(self.property_debounce_ms)
    }

    /// Default chat query timeout as a duration.
    #[inline]
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// True when closing for `reason` should re-open a backgrounded view.
    #[must_use]
    pub fn reopens_on(&self, reason: CloseReason) -> bool {
        self.reopen_reasons.contains(&reason)
    }
}
