//! Main entrypoint for running Constellation

use color_eyre::eyre::{ContextCompat as _, Result};
use rand::SeedableRng as _;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::animation::Animation;
use crate::cli_args::CliArgs;
use crate::config::Config;
use crate::raw_input::RawInput;
use crate::renderer::Renderer;

/// The environment variable for setting arbitrary log filters.
const LOG_FILTERS_ENV: &str = "CONSTELLATION_LOG";

/// How many frames can queue up for the renderer before the animation waits for it.
const FRAME_BUFFER: usize = 2;

/// Events shared between the various tasks/threads.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    /// User's TTY is resized.
    Resize {
        /// Width of new terminal.
        width: u16,
        /// Height of new terminal.
        height: u16,
    },
    /// The mouse moved over a cell. Zero-based.
    Pointer {
        /// Column
        column: u16,
        /// Row
        row: u16,
    },
    /// The pointer is no longer over the field.
    PointerLeave,
    /// The entire application is exiting.
    End,
}

/// Main entrypoint
pub async fn run(cli_args: &CliArgs, config: &Config) -> Result<()> {
    let (protocol_tx, _) = tokio::sync::broadcast::channel(64);
    let (frames_tx, frames_rx) = tokio::sync::mpsc::channel(FRAME_BUFFER);

    let tty_size = Renderer::get_users_tty_size()?;
    let surface =
        crate::surface::Surface::new(tty_size.cols, tty_size.rows, config.scale);
    tracing::debug!("User's terminal is {}x{}", tty_size.cols, tty_size.rows);

    let mut rng = match cli_args.seed {
        Some(seed) => {
            tracing::info!("Using random seed: {seed}");
            rand::rngs::StdRng::seed_from_u64(seed)
        }
        None => rand::rngs::StdRng::from_entropy(),
    };
    let animation = Animation::attach(Some(surface), config, &mut rng)
        .context("Couldn't attach the animation to the terminal")?;

    let renderer = Renderer::start(frames_rx, protocol_tx.clone());
    let input_thread_handle = RawInput::start(protocol_tx.clone());

    override_on_panic_behaviour();
    let animation_handle = tokio::spawn(animation.run(protocol_tx.subscribe(), frames_tx));

    let animation_result = animation_handle.await;
    tracing::debug!("🏁 Animation finished, exiting Constellation...");
    broadcast_protocol_end(&protocol_tx);

    if input_thread_handle.is_finished() {
        // The STDIN loop blocks on reads so it can't listen for `End`. Only join it when it
        // finished by itself.
        input_thread_handle
            .join()
            .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
    }
    renderer.await??;
    animation_result??;

    tracing::trace!("Leaving Constellation's main `run()` function");
    Ok(())
}

/// Log panics rather than print them all over the user's raw mode terminal.
fn override_on_panic_behaviour() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(message) = info.payload().downcast_ref::<String>() {
            message
        } else if let Some(message) = info.payload().downcast_ref::<&str>() {
            message
        } else {
            "Caught a panic with an unknown type."
        };
        let location = match info.location() {
            Some(location) => format!(
                "{}@{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => "Unknown location".to_owned(),
        };
        tracing::error!("Caught panic ({}): {message:?}", location);
    }));
}

/// Signal all task/thread loops to exit.
///
/// The error is handled here rather than bubbled, because the `End` message is itself what lets
/// the central error handler be reached.
pub fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// Load the config and apply any CLI overrides to it.
pub fn setup(cli_args: &CliArgs) -> Result<Config> {
    let config_result = Config::load(cli_args.config.as_deref());
    let mut config = match config_result {
        Ok(config) => config,
        Err(config_error) => {
            color_eyre::eyre::bail!("Bad config file: {config_error:?}");
        }
    };

    if let Some(frame_rate) = cli_args.frame_rate {
        config.frame_rate = frame_rate;
    }
    if let Some(log_level) = &cli_args.log_level {
        config.log_level = log_level.clone();
    }
    if let Some(log_path) = &cli_args.log_path {
        config.log_path.clone_from(log_path);
    }

    Ok(config)
}

/// Setup logging. Returns whether anything is being logged.
pub fn setup_logging(cli_args: &CliArgs, config: &Config) -> Result<bool> {
    let are_log_filters_manually_set = std::env::var(LOG_FILTERS_ENV).is_ok();

    let path = cli_args
        .log_path
        .clone()
        .unwrap_or_else(|| config.log_path.clone());
    let level = cli_args
        .log_level
        .clone()
        .unwrap_or_else(|| config.log_level.clone());
    let level_as_string = format!("{level:?}").to_lowercase();

    let is_loggable =
        !matches!(level, crate::config::LogLevel::Off) || are_log_filters_manually_set;
    if !is_loggable {
        return Ok(false);
    }

    let directory = path.parent().context("Couldn't get log path's parent")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(&path)?;

    let filters = if are_log_filters_manually_set {
        let user_filters = std::env::var(LOG_FILTERS_ENV).unwrap_or_default();
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .parse_lossy(user_filters)
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("constellation={level_as_string}").parse()?)
            .add_directive(format!("tests={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);

    tracing_subscriber::registry().with(logfile_layer).try_init()?;
    tracing::info!("Starting Constellation");
    tracing::debug!("Loaded config: {config:?}");

    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("constellation.toml");
        std::fs::write(&path, "frame_rate = 24\nlog_level = \"warn\"").unwrap();

        let cli_args = CliArgs {
            config: Some(path.clone()),
            frame_rate: Some(12),
            ..CliArgs::default()
        };
        let config = setup(&cli_args).unwrap();
        assert_eq!(config.frame_rate, 12);
        assert_eq!(config.log_level, crate::config::LogLevel::Warn);
    }

    #[test]
    fn bad_config_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("constellation.toml");
        std::fs::write(&path, "frame_rate = \"fast\"").unwrap();

        let cli_args = CliArgs {
            config: Some(path),
            ..CliArgs::default()
        };
        let error = setup(&cli_args).unwrap_err();
        assert!(error.to_string().contains("Bad config file"));
    }

    #[test]
    fn no_logging_when_off() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("logs").join("constellation.log");
        let cli_args = CliArgs {
            log_path: Some(path.clone()),
            ..CliArgs::default()
        };
        if std::env::var(LOG_FILTERS_ENV).is_err() {
            assert!(!setup_logging(&cli_args, &Config::default()).unwrap());
            assert!(!path.exists());
        }
    }

    #[test]
    fn end_is_broadcast() {
        let (protocol_tx, mut protocol_rx) = tokio::sync::broadcast::channel(4);
        broadcast_protocol_end(&protocol_tx);
        assert_eq!(protocol_rx.try_recv().unwrap(), Protocol::End);
    }
}
