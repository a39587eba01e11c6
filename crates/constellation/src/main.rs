//! Just `main()`. Keep as small as possible.

use clap::Parser as _;
use color_eyre::eyre::Result;

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "It's our central place for communicating with the user on CLI"
)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli_args = constellation::cli_args::CliArgs::parse();
    let config = constellation::run::setup(&cli_args)?;
    let is_logging = constellation::run::setup_logging(&cli_args, &config)?;

    let result = constellation::run::run(&cli_args, &config).await;
    println!("{}", constellation::renderer::RESET_SCREEN);
    tracing::debug!("Constellation is exiting");

    let logpath = cli_args.log_path.unwrap_or(config.log_path);
    match result {
        Ok(()) => {
            if is_logging {
                println!("Logs saved to {}", logpath.display());
            }
        }
        Err(error) => {
            tracing::error!("{error:?}");
            eprintln!("Error: {error}");
            if is_logging {
                eprintln!("See {} for more details", logpath.display());
            }
        }
    }

    Ok(())
}
