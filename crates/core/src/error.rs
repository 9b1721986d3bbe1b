//! Error types for session bootstrap, capabilities, and background work.

use thiserror::Error;

/// Terminal failure of a `login` call. Exactly one is produced per failed login.
#[derive(Debug, Error)]
pub enum LoginError {
	/// Session-state text did not deserialize to a cookie sequence.
	#[error("malformed session state: {0}")]
	MalformedState(#[source] serde_json::Error),

	/// The service reports the account as checkpointed or blocked.
	#[error("account is checkpointed or blocked; resolve it in a browser before logging in again")]
	DeadSession,

	/// Neither identity cookie was present after establishment.
	#[error("no identity cookie found after establishing the session; session state is stale or login failed")]
	NoIdentity,

	/// Network failure during the establishment request sequence.
	#[error("failed to establish session: {0}")]
	Establish(#[from] reqwest::Error),

	/// The configured service base URL does not parse.
	#[error("invalid service URL: {0}")]
	InvalidBaseUrl(#[from] url::ParseError),

	/// The HTTP client could not be built from the current settings.
	#[error("invalid transport settings: {0}")]
	Transport(#[source] reqwest::Error),

	/// The capability catalog could not be assembled.
	#[error("capability assembly failed: {0}")]
	Assemble(#[from] CapabilityError),
}

/// Failure inside a capability module, or while building one.
#[derive(Debug, Error)]
pub enum CapabilityError {
	/// A factory needs a sibling that is installed after it (catalog ordering defect).
	#[error("capability '{capability}' requires '{sibling}', which is not installed yet")]
	MissingSibling { capability: &'static str, sibling: &'static str },

	#[error("capability '{0}' is already registered")]
	Duplicate(String),

	#[error("unknown capability '{0}'")]
	Unknown(String),

	#[error("invalid arguments for '{capability}': {reason}")]
	InvalidArgs { capability: &'static str, reason: String },

	/// No cross-site request token is available for a protected request.
	#[error("no request token available; refresh the token or log in again")]
	MissingToken,

	/// No streaming endpoint was found in the landing document.
	#[error("no streaming endpoint available for this session")]
	MissingEndpoint,

	#[error("service rejected request to {path} with status {status}")]
	Rejected { path: String, status: u16 },

	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("invalid transport settings: {0}")]
	Transport(String),

	#[error(transparent)]
	Session(#[from] Box<LoginError>),
}

/// Periodic token refresh failure. Logged, never surfaced to callers.
#[derive(Debug, Error)]
pub enum RefreshError {
	#[error("token refresh failed: {0}")]
	Capability(#[from] CapabilityError),
}

/// Configuration file could not be read, parsed, or written.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
	#[error("failed to read or write config file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("could not determine the user config directory")]
	NoConfigDir,
}

pub type Result<T, E = LoginError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn capability_error_wraps_into_login_error() {
		let err: LoginError = CapabilityError::MissingSibling {
			capability: "listenMqtt",
			sibling: "markAsDelivered",
		}
		.into();
		assert!(matches!(err, LoginError::Assemble(CapabilityError::MissingSibling { .. })));
		assert!(err.to_string().contains("markAsDelivered"));
	}

	#[test]
	fn refresh_error_preserves_cause() {
		let err: RefreshError = CapabilityError::MissingToken.into();
		assert!(err.to_string().contains("no request token"));
	}
}
