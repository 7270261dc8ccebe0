use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `ENCORE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("ENCORE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.crossfade_steps == 0 {
            return Err("audio.crossfade_steps must be >= 1".to_string());
        }
        if self.queue.max_pending == 0 {
            return Err("queue.max_pending must be >= 1".to_string());
        }
        // Repeat-all moves the whole history into pending.
        if self.queue.max_history > self.queue.max_pending {
            return Err("queue.max_history must not exceed queue.max_pending".to_string());
        }
        if self.queue.auto_queue.enabled && self.queue.auto_queue.count == 0 {
            return Err("queue.auto_queue.count must be >= 1 when auto_queue is enabled".to_string());
        }
        if self.persistence.key.trim().is_empty() {
            return Err("persistence.key must not be empty".to_string());
        }
        let vis = &self.visualizer;
        if !(1..=512).contains(&vis.elements) {
            return Err("visualizer.elements must be within 1..=512".to_string());
        }
        if !(1..=240).contains(&vis.fps) {
            return Err("visualizer.fps must be within 1..=240".to_string());
        }
        if !vis.fft_size.is_power_of_two() || vis.fft_size < 64 {
            return Err("visualizer.fft_size must be a power of two >= 64".to_string());
        }
        if vis.min_db >= vis.max_db {
            return Err("visualizer.min_db must be below visualizer.max_db".to_string());
        }
        if !(0.0..=1.0).contains(&vis.smoothing) {
            return Err("visualizer.smoothing must be within 0.0..=1.0".to_string());
        }
        Ok(())
    }

    /// Directory for persisted queue snapshots.
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.persistence.directory.clone().or_else(default_state_dir)
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .directory
            .clone()
            .or_else(|| default_state_dir().map(|d| d.join("logs")))
    }
}

/// Resolve the config path from `ENCORE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("ENCORE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/encore/config.toml`
/// or `~/.config/encore/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("encore").join("config.toml"))
}

/// Compute the default state directory `$XDG_STATE_HOME/encore`
/// or `~/.local/state/encore`.
pub fn default_state_dir() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("encore"))
}
