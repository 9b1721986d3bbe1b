//! Protocol parameter extraction from the landing document.
//!
//! This is the only module that looks at raw markup. Missing parameters are
//! reported as absent; only the checkpoint marker is an error.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::LoginError;

/// Present in the landing page of checkpointed or blocked accounts.
pub const CHECKPOINT_MARKER: &str = "/checkpoint/block/?next";
/// Precedes the cross-site request token literal.
pub const TOKEN_MARKER: &str = r#"["DTSGInitialData",[],{"token":""#;
/// Region used when the streaming endpoint carries none.
pub const DEFAULT_REGION: &str = "PRN";

static ENDPOINT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""endpoint":"(.+?)""#).expect("ENDPOINT_RE should compile"));
static TOKEN_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(&format!(r#"{}(.*?)""#, regex::escape(TOKEN_MARKER))).expect("TOKEN_RE should compile"));
static REVISION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""client_revision":(\d+)"#).expect("REVISION_RE should compile"));

/// Ephemeral parameters scraped from the landing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolParams {
	/// Streaming endpoint with path separators unescaped.
	pub endpoint: Option<Url>,
	/// Upper-cased `region` query parameter of the endpoint, or [`DEFAULT_REGION`].
	pub region: String,
	/// Cross-site request token.
	pub token: Option<String>,
	/// Client revision number, sent along with protected requests when known.
	pub revision: Option<String>,
}

impl Default for ProtocolParams {
	fn default() -> Self {
		Self {
			endpoint: None,
			region: DEFAULT_REGION.to_string(),
			token: None,
			revision: None,
		}
	}
}

impl ProtocolParams {
	/// Scans `document`, failing only when the account is checkpointed.
	pub fn extract(document: &str) -> Result<Self, LoginError> {
		if document.contains(CHECKPOINT_MARKER) {
			return Err(LoginError::DeadSession);
		}
		Ok(Self::scan(document))
	}

	fn scan(document: &str) -> Self {
		let endpoint = ENDPOINT_RE
			.captures(document)
			.and_then(|caps| caps.get(1))
			.and_then(|raw| {
				let unescaped = raw.as_str().replace("\\/", "/");
				Url::parse(&unescaped)
					.inspect_err(|err| debug!(target = "msgr.extract", endpoint = %unescaped, error = %err, "ignoring unparsable endpoint"))
					.ok()
			});

		let region = endpoint
			.as_ref()
			.and_then(|url| url.query_pairs().find(|(key, _)| key == "region").map(|(_, value)| value.to_uppercase()))
			.filter(|region| !region.is_empty())
			.unwrap_or_else(|| DEFAULT_REGION.to_string());

		let token = TOKEN_RE
			.captures(document)
			.and_then(|caps| caps.get(1))
			.map(|m| m.as_str().to_string())
			.filter(|token| !token.is_empty());

		let revision = REVISION_RE.captures(document).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string());

		debug!(
			target = "msgr.extract",
			endpoint = endpoint.is_some(),
			%region,
			token = token.is_some(),
			"protocol parameters extracted"
		);

		Self {
			endpoint,
			region,
			token,
			revision,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoint_is_unescaped_and_region_uppercased() {
		let doc = r#"<script>{"appID":1,"endpoint":"https:\/\/edge.example.com\/mqtt?region=prn","pollingEndpoint":"x"}</script>"#;
		let params = ProtocolParams::extract(doc).unwrap();
		let endpoint = params.endpoint.unwrap();
		assert_eq!(endpoint.as_str(), "https://edge.example.com/mqtt?region=prn");
		assert_eq!(endpoint.path(), "/mqtt");
		assert_eq!(params.region, "PRN");
	}

	#[test]
	fn missing_endpoint_falls_back_to_default_region() {
		let params = ProtocolParams::extract("<html><body>welcome</body></html>").unwrap();
		assert_eq!(params, ProtocolParams::default());
		assert_eq!(params.region, DEFAULT_REGION);
	}

	#[test]
	fn endpoint_without_region_uses_default() {
		let params = ProtocolParams::extract(r#""endpoint":"wss:\/\/edge.example.com\/chat?cid=1""#).unwrap();
		assert!(params.endpoint.is_some());
		assert_eq!(params.region, "PRN");
	}

	#[test]
	fn unparsable_endpoint_is_absent() {
		let params = ProtocolParams::extract(r#""endpoint":"not a url""#).unwrap();
		assert_eq!(params.endpoint, None);
		assert_eq!(params.region, DEFAULT_REGION);
	}

	#[test]
	fn token_match_is_non_greedy() {
		let doc = r#"x["DTSGInitialData",[],{"token":"AQH-abc:123","async_get_token":"other"}]"#;
		let params = ProtocolParams::extract(doc).unwrap();
		assert_eq!(params.token.as_deref(), Some("AQH-abc:123"));
	}

	#[test]
	fn first_endpoint_occurrence_wins() {
		let doc = r#""endpoint":"https:\/\/a.example.com\/?region=ash" "endpoint":"https:\/\/b.example.com\/?region=odn""#;
		let params = ProtocolParams::extract(doc).unwrap();
		assert_eq!(params.endpoint.unwrap().host_str(), Some("a.example.com"));
		assert_eq!(params.region, "ASH");
	}

	#[test]
	fn checkpoint_marker_is_dead_session() {
		let doc = r#"<a href="/checkpoint/block/?next=https%3A%2F%2Fexample.com">"endpoint":"https:\/\/e.example.com\/""#;
		assert!(matches!(ProtocolParams::extract(doc), Err(LoginError::DeadSession)));
	}

	#[test]
	fn revision_is_captured_when_present() {
		let params = ProtocolParams::extract(r#"{"client_revision":1012345678,"x":1}"#).unwrap();
		assert_eq!(params.revision.as_deref(), Some("1012345678"));
	}
}
