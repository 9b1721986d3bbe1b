use clap::Parser;
use msgr::logging;
use msgr_cli::cli::Cli;
use msgr_cli::commands;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli.command).await {
		error!(target = "msgr", error = format_args!("{err:#}"), "command failed");
		std::process::exit(1);
	}
}
