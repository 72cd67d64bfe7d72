//! Configuration management for pardo
//!
//! Settings are layered with figment, lowest priority first: the embedded
//! `default-config.toml`, a config file (`--config`, or `pardo.toml` in the
//! working directory), `PARDO_*` environment variables, and finally whatever
//! was given on the command line. The merged [`Settings`] are then validated
//! into a [`DispatchConfig`], which is all the dispatcher ever sees.

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use thiserror::Error;

use crate::job::{ArgTemplate, CommandTemplate};
use crate::parallel::default_workers;

mod mode;

pub use mode::{OutputFlags, OutputMode};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Config file looked up in the working directory when none is given
pub const REPO_CONFIG_FILE: &str = "pardo.toml";

/// Environment variable for the placeholder token, read verbatim
pub const REPLACE_ENV: &str = "PARDO_REPLACE";

/// Upper bound on the worker pool; each worker is an OS thread
pub const MAX_WORKERS: usize = 4096;

/// Upper bound on each channel's buffer, allocated up front
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Fatal problems found before any job is dispatched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Must be 1 or more workers (got {0})")]
    InvalidWorkers(i64),

    #[error("Too many workers (got {0}, at most {max})", max = MAX_WORKERS)]
    TooManyWorkers(i64),

    #[error("No command given")]
    MissingCommand,

    #[error("Unbalanced quotes in command: {0}")]
    UnbalancedQuotes(String),

    #[error("Placeholder token must not be empty")]
    EmptyPlaceholder,

    #[error("Config file not found: {0}")]
    MissingFile(String),
}

/// Merged, unvalidated settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worker count, signed so bad values reach validation
    pub workers: Option<i64>,
    pub replace: String,
    pub command: Option<CommandTemplate>,
    pub log: bool,
    pub to_stdout: bool,
    pub to_stderr: bool,
    pub pass_std: bool,
    pub echo: bool,
    /// Channel capacity per worker, 0 for rendezvous channels
    pub channel_buffer_multiplier: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: None,
            replace: "{}".to_string(),
            command: None,
            log: false,
            to_stdout: false,
            to_stderr: false,
            pass_std: false,
            echo: false,
            channel_buffer_multiplier: 2,
        }
    }
}

/// Values supplied on the command line; unset fields leave lower layers alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandTemplate>,
    #[serde(skip_serializing_if = "is_false")]
    pub log: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub to_stdout: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub to_stderr: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub pass_std: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub echo: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Validated configuration for one dispatcher run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub workers: NonZeroUsize,
    pub template: ArgTemplate,
    pub placeholder: String,
    pub mode: OutputMode,
    pub echo_input: bool,
    pub channel_buffer_multiplier: usize,
}

impl DispatchConfig {
    /// Capacity of the work and event channels
    pub fn channel_capacity(&self) -> usize {
        self.workers
            .get()
            .saturating_mul(self.channel_buffer_multiplier)
            .min(MAX_CHANNEL_CAPACITY)
    }
}

impl Settings {
    /// Build the layered figment without extracting it
    pub fn figment(config_file: Option<&Path>, overrides: &Overrides) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        figment = match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingFile(path.display().to_string()).into());
                }
                merge_file(figment, path)
            }
            None => figment.merge(Toml::file(REPO_CONFIG_FILE)),
        };

        // Env values are parsed, which would turn `{}` into an empty map
        figment = figment.merge(Env::prefixed("PARDO_").ignore(&["config", "replace"]));
        if let Ok(token) = std::env::var(REPLACE_ENV) {
            figment = figment.merge(Serialized::default("replace", token));
        }

        Ok(figment.merge(Serialized::defaults(overrides)))
    }

    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::figment(config_file, overrides)?
            .extract()
            .context("Failed to load configuration")
    }

    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            log: self.log,
            to_stdout: self.to_stdout,
            to_stderr: self.to_stderr,
            pass_std: self.pass_std,
            echo: self.echo,
        }
    }

    /// Check the settings and resolve defaults
    pub fn validate(self) -> Result<DispatchConfig, ConfigError> {
        let workers = match self.workers {
            None => default_workers(),
            Some(n) if n <= 0 => return Err(ConfigError::InvalidWorkers(n)),
            Some(n) => match usize::try_from(n) {
                Ok(n) if n <= MAX_WORKERS => n,
                _ => return Err(ConfigError::TooManyWorkers(n)),
            },
        };
        let workers = NonZeroUsize::new(workers).ok_or(ConfigError::InvalidWorkers(0))?;
        let mode = OutputMode::select(self.output_flags());

        let template = self.command.ok_or(ConfigError::MissingCommand)?.resolve()?;

        if self.replace.is_empty() {
            return Err(ConfigError::EmptyPlaceholder);
        }

        Ok(DispatchConfig {
            workers,
            mode,
            template,
            placeholder: self.replace,
            echo_input: self.echo,
            channel_buffer_multiplier: self.channel_buffer_multiplier,
        })
    }
}

/// Pick the figment format from the file extension, TOML otherwise
fn merge_file(figment: Figment, path: &Path) -> Figment {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

#[cfg(test)]
mod tests;
