//! Configuration loading for Nocturne.
//!
//! A `nocturne.toml` with `[schedule]` and `[paths]` tables. Every field
//! has a default, so a partial file is valid. Search order when no path is
//! given: `./nocturne.toml`, then `~/.config/nocturne/nocturne.toml`.

use crate::error::{NocturneError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration, immutable after startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub paths: PathsConfig,
}

/// The `[schedule]` table: the shape of the nightly window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Hour the nightly window opens, 0-23.
    pub night_start: u32,
    /// Hour the window closes, 0-23. Exclusive: ordinary wakeups run
    /// through `night_end - 1`, and the closing wakeup fires at
    /// `night_end:00`.
    pub night_end: u32,
    /// Minutes between ordinary wakeups, 1-60.
    pub interval_minutes: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            night_start: 22,
            night_end: 5,
            interval_minutes: 20,
        }
    }
}

/// The `[paths]` table: filesystem locations and the agent binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Working directory for the agent subprocess.
    pub working_dir: PathBuf,
    /// Daemon log file.
    pub log_file: PathBuf,
    /// Directory receiving one transcript file per night.
    pub journal_dir: PathBuf,
    /// Template delivered at the night's first wakeup.
    pub opening_prompt_file: PathBuf,
    /// Template delivered at the night's closing wakeup.
    pub closing_prompt_file: PathBuf,
    /// Dotenv file loaded into the process environment at startup.
    pub env_file: PathBuf,
    /// Agent binary. A bare name resolves through `$PATH`; a leading `~`
    /// expands like the other path fields.
    pub claude_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("~"),
            log_file: PathBuf::from("~/.nocturne/nocturne.log"),
            journal_dir: PathBuf::from("~/.nocturne/nights"),
            opening_prompt_file: PathBuf::from("~/.nocturne/night_begins.md"),
            closing_prompt_file: PathBuf::from("~/.nocturne/night_ends.md"),
            env_file: PathBuf::from("~/.nocturne/.env"),
            claude_path: "claude".to_string(),
        }
    }
}

impl Config {
    /// Load and validate a config file, expanding `~` in every path field.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NocturneError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config: Config = toml::from_str(&raw).map_err(|e| {
            NocturneError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.schedule.validate()?;
        config.paths.expand();
        Ok(config)
    }

    /// Resolve which config file to use.
    ///
    /// An explicit path always wins (even if it does not exist, so `load`
    /// can report it). Otherwise the first existing candidate from the
    /// search order, or `None` when there is no config at all.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path);
        }
        let cwd = PathBuf::from("nocturne.toml");
        if cwd.exists() {
            return Some(cwd);
        }
        let home = Self::default_path();
        if home.exists() {
            return Some(home);
        }
        None
    }

    /// The location `nocturne init` writes to.
    pub fn default_path() -> PathBuf {
        expand_tilde(Path::new("~/.config/nocturne/nocturne.toml"))
    }
}

impl ScheduleConfig {
    /// Reject windows the scheduler cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.night_start > 23 {
            return Err(NocturneError::Config(format!(
                "night_start must be 0-23, got {}",
                self.night_start
            )));
        }
        if self.night_end > 23 {
            return Err(NocturneError::Config(format!(
                "night_end must be 0-23, got {}",
                self.night_end
            )));
        }
        if self.interval_minutes == 0 || self.interval_minutes > 60 {
            return Err(NocturneError::Config(format!(
                "interval_minutes must be 1-60, got {}",
                self.interval_minutes
            )));
        }
        Ok(())
    }
}

impl PathsConfig {
    /// Expand `~` in every path field in place.
    ///
    /// `claude_path` is included: the subprocess spawn does no shell
    /// expansion, so a literal `~/...` binary path would never resolve.
    fn expand(&mut self) {
        for field in [
            &mut self.working_dir,
            &mut self.log_file,
            &mut self.journal_dir,
            &mut self.opening_prompt_file,
            &mut self.closing_prompt_file,
            &mut self.env_file,
        ] {
            *field = expand_tilde(field);
        }
        self.claude_path = expand_tilde(Path::new(&self.claude_path))
            .to_string_lossy()
            .into_owned();
    }
}

/// Expand a leading `~` component to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
