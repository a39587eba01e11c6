//! All of the user config for Constellation.

use color_eyre::eyre::ContextCompat as _;
use color_eyre::eyre::Result;

/// A copy of the default config file. It documents every setting.
pub static DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

/// The name of the main config file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "constellation.toml";

/// The valid log levels. Based on our `tracing` crate.
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Managing user config.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// The maximum log level
    pub log_level: LogLevel,
    /// The location of the log file.
    pub log_path: std::path::PathBuf,
    /// Target frame rate
    pub frame_rate: u32,
    /// How many of the field's units fit in a single terminal pixel. Terminal pixels are huge
    /// compared to screen pixels, so this keeps the default distances looking sensible.
    pub scale: f64,
    /// Terminals can't tell us when the mouse leaves the window, so the pointer is considered to
    /// have left after it hasn't moved for this many seconds. This means a pointer that is still
    /// over the field but idle stops pushing and linking. 0 disables the timeout, and the pointer
    /// then stays put until a `PointerLeave` message.
    pub pointer_timeout: f64,
    /// The particle field
    pub field: crate::field::Config,
}

impl Default for Config {
    fn default() -> Self {
        let log_directory = match dirs::state_dir() {
            Some(directory) => directory,
            None => std::path::PathBuf::new().join("./"),
        };
        let log_path = log_directory
            .join("constellation")
            .join("constellation.log");

        Self {
            log_level: LogLevel::Off,
            log_path,
            frame_rate: crate::frame_loop::TARGET_FRAME_RATE,
            scale: 8.0,
            pointer_timeout: 3.0,
            field: crate::field::Config::default(),
        }
    }
}

impl Config {
    /// Get the stable location of Constellation's config directory on the user's system.
    pub fn default_directory() -> Result<std::path::PathBuf> {
        Ok(dirs::config_dir()
            .context("Couldn't get standard config directory")?
            .join("constellation"))
    }

    /// Canonical path to the main config file.
    pub fn default_path() -> Result<std::path::PathBuf> {
        Ok(Self::default_directory()?.join(DEFAULT_CONFIG_FILE_NAME))
    }

    /// Load the main config.
    ///
    /// A path explicitly asked for must exist. Otherwise the standard config location is used if
    /// there's a file there, and if not, the defaults.
    pub fn load(maybe_path: Option<&std::path::Path>) -> Result<Self> {
        let path = match maybe_path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::default_path()?;
                if !path.exists() {
                    tracing::debug!("No config file at {path:?}, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        tracing::info!("Loading config from: {path:?}");
        let result = std::fs::read_to_string(&path);
        match result {
            Ok(data) => {
                tracing::trace!("Using config file:\n{data}");
                Self::parse(&data)
            }
            Err(err) => {
                tracing::error!("Loading config: {err:?}");
                color_eyre::eyre::bail!("Couldn't load config at {path:?}: {}", err.to_string());
            }
        }
    }

    /// Parse config from TOML.
    pub fn parse(data: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Catch settings that would make the field meaningless.
    fn validate(&self) -> Result<()> {
        if self.scale <= 0.0 {
            color_eyre::eyre::bail!("`scale` must be greater than 0, got {}", self.scale);
        }
        if self.field.density <= 0.0 {
            color_eyre::eyre::bail!(
                "`field.density` must be greater than 0, got {}",
                self.field.density
            );
        }
        if self.field.link_radius <= 0.0 || self.field.influence_radius <= 0.0 {
            color_eyre::eyre::bail!("`field.link_radius` and `field.influence_radius` must be greater than 0");
        }
        Ok(())
    }

    /// The pointer timeout as a duration, `None` if it's disabled. Once it elapses an idle
    /// pointer is treated as absent, even though the mouse may still be over the terminal.
    #[must_use]
    pub fn pointer_timeout(&self) -> Option<std::time::Duration> {
        if self.pointer_timeout > 0.0 {
            std::time::Duration::try_from_secs_f64(self.pointer_timeout).ok()
        } else {
            None
        }
    }
}
