//! All the CLI arguments for Constellation

/// An ambient particle network for your terminal. Move the mouse around to push the particles.
/// Press `q`, `Esc` or `Ctrl-C` to quit.
#[derive(clap::Parser, Debug, Clone, Default)]
#[command(version, about)]
#[non_exhaustive]
pub struct CliArgs {
    /// Path to a config file. Defaults to `constellation.toml` in your system's standard config
    /// directory, if it exists.
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Override the log level from the config.
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::LogLevel>,

    /// Override the log file path from the config.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// Override the target frame rate from the config.
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Seed the random layout of the particles, so that the same field appears every time.
    #[arg(long)]
    pub seed: Option<u64>,
}
