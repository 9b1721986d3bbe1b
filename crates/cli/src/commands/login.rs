use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use msgr::{AppConfig, AppStateInput, Credentials, JsonFileSink, LoginInput, LoginOptions, login};
use serde_json::{Map, Value};
use tracing::info;

use crate::cli::LoginArgs;

pub async fn execute(args: LoginArgs) -> Result<()> {
	let input = login_input(&args)?;
	let partial = parse_options(args.options.as_deref())?;

	let config_path = match args.config {
		Some(path) => path,
		None => AppConfig::default_path()?,
	};
	let config = AppConfig::load_or_create(&config_path);

	let mut options = LoginOptions::new()
		.base_url(&args.base_url)
		.request_timeout(Duration::from_secs(args.timeout))
		.config(config)
		.without_token_refresh();
	if let Some(path) = &args.snapshot {
		options = options.sink(Arc::new(JsonFileSink::new(path)));
	}

	let mut api = login(input, &partial, options).await?;
	let ctx = api.context();

	println!("user:         {}", api.user_id());
	println!("region:       {}", ctx.region());
	println!(
		"endpoint:     {}",
		ctx.mqtt_endpoint().map_or_else(|| "-".to_string(), |url| url.to_string())
	);
	println!("token:        {}", if ctx.token().is_some() { "present" } else { "missing" });
	println!("capabilities: {}", api.capability_names().join(", "));

	if let Some(path) = &args.save_state {
		let state = api.get_app_state();
		let json = serde_json::to_string_pretty(&state)?;
		std::fs::write(path, json).with_context(|| format!("failed to write session state to {}", path.display()))?;
		info!(target = "msgr", path = %path.display(), cookies = state.len(), "session state saved");
	}

	api.close();
	Ok(())
}

fn login_input(args: &LoginArgs) -> Result<LoginInput> {
	if let Some(path) = &args.app_state {
		return Ok(LoginInput::AppState(read_state(path)?));
	}
	match (&args.email, &args.password) {
		(Some(email), Some(password)) => Ok(LoginInput::Credentials(Credentials::new(email, password))),
		_ => bail!("either --app-state or --email with --password is required"),
	}
}

fn read_state(path: &Path) -> Result<AppStateInput> {
	let text = std::fs::read_to_string(path).with_context(|| format!("failed to read session state {}", path.display()))?;
	Ok(AppStateInput::Text(text))
}

fn parse_options(raw: Option<&str>) -> Result<Map<String, Value>> {
	let Some(raw) = raw else {
		return Ok(Map::new());
	};
	match serde_json::from_str(raw).context("--options must be valid JSON")? {
		Value::Object(map) => Ok(map),
		other => bail!("--options must be a JSON object, got {other}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn options_must_be_an_object() {
		assert!(parse_options(None).unwrap().is_empty());
		assert_eq!(parse_options(Some(r#"{"selfListen": 1}"#)).unwrap()["selfListen"], 1);
		assert!(parse_options(Some("[1]")).is_err());
		assert!(parse_options(Some("{")).is_err());
	}
}
