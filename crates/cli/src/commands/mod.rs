mod config;
mod login;
mod state;

use anyhow::Result;

use crate::cli::{Commands, ConfigAction, StateAction};

pub async fn dispatch(command: Commands) -> Result<()> {
	match command {
		Commands::Login(args) => login::execute(args).await,
		Commands::State { action } => match action {
			StateAction::Show { file } => state::show(&file),
		},
		Commands::Config { action } => match action {
			ConfigAction::Show { path } => config::show(path),
			ConfigAction::Init { path, force } => config::init(path, force),
		},
	}
}
