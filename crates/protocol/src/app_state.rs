//! Serialized session state: the cookie set of a previously authenticated session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One cookie record of a serialized session.
///
/// Records are keyed by `key` (the cookie name). `domain` and `path` scope the
/// cookie the same way a browser would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStateCookie {
	pub key: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<CookieExpiry>,
	pub domain: String,
	#[serde(default = "default_path")]
	pub path: String,
}

fn default_path() -> String {
	"/".to_string()
}

impl AppStateCookie {
	pub fn new(key: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
			expires: None,
			domain: domain.into(),
			path: default_path(),
		}
	}

	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	pub fn with_expires(mut self, expires: CookieExpiry) -> Self {
		self.expires = Some(expires);
		self
	}
}

/// Cookie expiry as found in exported session files.
///
/// Exporters disagree: some write an HTTP date string, others a unix
/// timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CookieExpiry {
	Timestamp(f64),
	Date(String),
}

impl fmt::Display for CookieExpiry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CookieExpiry::Timestamp(ts) => write!(f, "{ts}"),
			CookieExpiry::Date(date) => f.write_str(date),
		}
	}
}

/// Session state as handed to `login`: either already parsed, or raw JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum AppStateInput {
	Parsed(Vec<AppStateCookie>),
	Text(String),
}

impl AppStateInput {
	/// Parses text input; parsed input is returned as-is.
	pub fn into_cookies(self) -> Result<Vec<AppStateCookie>, serde_json::Error> {
		match self {
			AppStateInput::Parsed(cookies) => Ok(cookies),
			AppStateInput::Text(text) => serde_json::from_str(&text),
		}
	}
}

impl From<Vec<AppStateCookie>> for AppStateInput {
	fn from(cookies: Vec<AppStateCookie>) -> Self {
		AppStateInput::Parsed(cookies)
	}
}

impl From<String> for AppStateInput {
	fn from(text: String) -> Self {
		AppStateInput::Text(text)
	}
}
