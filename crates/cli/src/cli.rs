use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "msgr")]
#[command(about = "Log in to a messaging web session and inspect its state")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Establish a session and list its capabilities
	Login(LoginArgs),

	/// Inspect saved session state
	State {
		#[command(subcommand)]
		action: StateAction,
	},

	/// Manage the client configuration file
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Args, Debug)]
pub struct LoginArgs {
	/// Session state file (JSON array of cookie records)
	#[arg(long, value_name = "FILE", conflicts_with = "email", required_unless_present = "email")]
	pub app_state: Option<PathBuf>,

	/// Account email for cookie priming
	#[arg(long, requires = "password")]
	pub email: Option<String>,

	#[arg(long)]
	pub password: Option<String>,

	/// Write the deduplicated session state here after login
	#[arg(long, value_name = "FILE")]
	pub save_state: Option<PathBuf>,

	/// Write a session snapshot here once the session is up
	#[arg(long, value_name = "FILE")]
	pub snapshot: Option<PathBuf>,

	/// Service base URL
	#[arg(long, default_value = msgr::DEFAULT_BASE_URL)]
	pub base_url: String,

	/// Login options as a JSON object, e.g. '{"selfListen": true}'
	#[arg(long, value_name = "JSON")]
	pub options: Option<String>,

	/// Config file (defaults to the user config directory)
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Per-request timeout in seconds
	#[arg(long, default_value = "30")]
	pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum StateAction {
	/// Print the cookies in a session state file
	Show { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
	/// Print the effective configuration
	Show {
		#[arg(long, value_name = "FILE")]
		path: Option<PathBuf>,
	},
	/// Write the default configuration
	Init {
		#[arg(long, value_name = "FILE")]
		path: Option<PathBuf>,
		/// Overwrite an existing file
		#[arg(long, short)]
		force: bool,
	},
}
