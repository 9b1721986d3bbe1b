use std::path::PathBuf;

use anyhow::{Result, bail};
use msgr::AppConfig;

fn resolve(path: Option<PathBuf>) -> Result<PathBuf> {
	match path {
		Some(path) => Ok(path),
		None => Ok(AppConfig::default_path()?),
	}
}

pub fn show(path: Option<PathBuf>) -> Result<()> {
	let path = resolve(path)?;
	let config = AppConfig::load_or_create(&path);
	println!("# {}", path.display());
	println!("{}", serde_json::to_string_pretty(&config)?);
	Ok(())
}

pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
	let path = resolve(path)?;
	if path.exists() && !force {
		bail!("{} already exists (use --force to overwrite)", path.display());
	}
	AppConfig::default().save(&path)?;
	println!("Wrote default configuration to {}", path.display());
	Ok(())
}
