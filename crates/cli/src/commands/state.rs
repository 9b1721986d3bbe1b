use std::path::Path;

use anyhow::{Context, Result};
use msgr::cookies::{ALT_IDENTITY_COOKIE, IDENTITY_COOKIE};
use msgr_protocol::{AppStateCookie, AppStateInput};

pub fn show(file: &Path) -> Result<()> {
	let cookies = load(file)?;

	println!("Session state from: {}", file.display());
	println!();
	println!("COOKIES ({}):", cookies.len());
	if cookies.is_empty() {
		println!("  (none)");
	} else {
		println!("  {:<20} {:<30} {:<12} {:<20}", "KEY", "DOMAIN", "PATH", "EXPIRES");
		println!("  {}", "-".repeat(84));
		for cookie in &cookies {
			let expires = cookie.expires.as_ref().map_or_else(|| "session".to_string(), ToString::to_string);
			println!("  {:<20} {:<30} {:<12} {:<20}", cookie.key, cookie.domain, cookie.path, expires);
		}
	}

	println!();
	match identity(&cookies) {
		Some(id) => println!("identity: {id}"),
		None => println!("identity: (none; this state cannot log in)"),
	}
	Ok(())
}

fn load(file: &Path) -> Result<Vec<AppStateCookie>> {
	let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
	AppStateInput::Text(text)
		.into_cookies()
		.with_context(|| format!("{} is not a session state file", file.display()))
}

fn identity(cookies: &[AppStateCookie]) -> Option<&str> {
	let find = |name: &str| cookies.iter().find(|c| c.key == name).map(|c| c.value.as_str());
	find(ALT_IDENTITY_COOKIE).or_else(|| find(IDENTITY_COOKIE))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identity_prefers_alternate_cookie() {
		let mut cookies = vec![AppStateCookie::new("c_user", "1", "example.com")];
		assert_eq!(identity(&cookies), Some("1"));
		cookies.push(AppStateCookie::new("i_user", "2", "example.com"));
		assert_eq!(identity(&cookies), Some("2"));
		assert_eq!(identity(&[]), None);
	}
}
