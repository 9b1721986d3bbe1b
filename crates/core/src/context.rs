//! Shared session context.
//!
//! One [`SessionContext`] exists per logged-in session and is shared by every
//! capability through an `Arc`. Its shape is fixed at construction; only the
//! settings, the request token, and the counters change afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::cookies::SessionCookies;
use crate::error::{LoginError, Result};
use crate::extract::ProtocolParams;
use crate::options::{Settings, apply_options};

#[derive(Debug)]
pub struct SessionContext {
	user_id: String,
	client_id: u32,
	base_url: Url,
	cookies: Arc<SessionCookies>,
	settings: Arc<RwLock<Settings>>,
	config: AppConfig,
	req_counter: AtomicU64,
	mqtt_endpoint: Option<Url>,
	region: String,
	revision: Option<String>,
	token: RwLock<Option<String>>,
	ws_req_number: AtomicU64,
	ws_task_number: AtomicU64,
}

/// Builds the context for an established session.
///
/// The checkpoint check runs before the identity lookup: a blocked account can
/// still carry stale identity cookies.
pub fn build_context(settings: Arc<RwLock<Settings>>, document: &str, cookies: Arc<SessionCookies>, base_url: Url) -> Result<SessionContext> {
	let params = ProtocolParams::extract(document)?;
	let user_id = cookies.identity().ok_or(LoginError::NoIdentity)?;
	let client_id = rand::random::<u32>();

	debug!(
		target = "msgr.session",
		%user_id,
		client_id = format_args!("{client_id:x}"),
		region = %params.region,
		"session context built"
	);

	Ok(SessionContext {
		user_id,
		client_id,
		base_url,
		cookies,
		settings,
		config: AppConfig::default(),
		req_counter: AtomicU64::new(0),
		mqtt_endpoint: params.endpoint,
		region: params.region,
		revision: params.revision,
		token: RwLock::new(params.token),
		ws_req_number: AtomicU64::new(0),
		ws_task_number: AtomicU64::new(0),
	})
}

impl SessionContext {
	/// Replaces the persisted client configuration. Only valid before sharing.
	pub fn with_config(mut self, config: AppConfig) -> Self {
		self.config = config;
		self
	}

	pub fn user_id(&self) -> &str {
		&self.user_id
	}

	pub fn client_id(&self) -> u32 {
		self.client_id
	}

	/// Client identifier as sent on the wire (lower-case hex).
	pub fn client_id_hex(&self) -> String {
		format!("{:x}", self.client_id)
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn cookies(&self) -> &Arc<SessionCookies> {
		&self.cookies
	}

	pub fn config(&self) -> &AppConfig {
		&self.config
	}

	/// Snapshot of the current settings.
	pub fn settings(&self) -> Settings {
		self.settings.read().clone()
	}

	pub fn settings_handle(&self) -> &Arc<RwLock<Settings>> {
		&self.settings
	}

	/// Applies partial options to the shared settings.
	pub fn apply_options(&self, partial: &Map<String, Value>) {
		apply_options(&mut self.settings.write(), partial);
	}

	pub fn mqtt_endpoint(&self) -> Option<&Url> {
		self.mqtt_endpoint.as_ref()
	}

	pub fn region(&self) -> &str {
		&self.region
	}

	pub fn revision(&self) -> Option<&str> {
		self.revision.as_deref()
	}

	/// Current request token. May change between reads; the last write wins.
	pub fn token(&self) -> Option<String> {
		self.token.read().clone()
	}

	pub fn set_token(&self, token: String) {
		*self.token.write() = Some(token);
	}

	/// Advances the mutation counter and returns the new value.
	pub fn next_request_id(&self) -> u64 {
		self.req_counter.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn request_count(&self) -> u64 {
		self.req_counter.load(Ordering::SeqCst)
	}

	pub fn next_ws_req_number(&self) -> u64 {
		self.ws_req_number.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn next_ws_task_number(&self) -> u64 {
		self.ws_task_number.fetch_add(1, Ordering::SeqCst) + 1
	}
}

#[cfg(test)]
mod tests {
	use msgr_protocol::AppStateCookie;

	use super::*;

	fn build(document: &str, cookies: &[AppStateCookie]) -> Result<SessionContext> {
		build_context(
			Arc::new(RwLock::new(Settings::default())),
			document,
			Arc::new(SessionCookies::from_app_state(cookies)),
			Url::parse("https://www.example.com/").unwrap(),
		)
	}

	const LANDING: &str = r#"<script>["DTSGInitialData",[],{"token":"tok-1"}] {"endpoint":"wss:\/\/edge.example.com\/chat?region=odn"}</script>"#;

	#[test]
	fn identity_comes_from_alternate_cookie_when_present() {
		let ctx = build(
			LANDING,
			&[
				AppStateCookie::new("c_user", "100", "example.com"),
				AppStateCookie::new("i_user", "200", "example.com"),
			],
		)
		.unwrap();
		assert_eq!(ctx.user_id(), "200");
		assert_eq!(ctx.region(), "ODN");
		assert_eq!(ctx.token().as_deref(), Some("tok-1"));
		assert_eq!(ctx.mqtt_endpoint().map(Url::as_str), Some("wss://edge.example.com/chat?region=odn"));
	}

	#[test]
	fn identity_falls_back_to_primary_cookie() {
		let ctx = build(LANDING, &[AppStateCookie::new("c_user", "100", "example.com")]).unwrap();
		assert_eq!(ctx.user_id(), "100");
	}

	#[test]
	fn missing_identity_cookies_fail() {
		let err = build(LANDING, &[AppStateCookie::new("xs", "secret", "example.com")]).unwrap_err();
		assert!(matches!(err, LoginError::NoIdentity));
	}

	#[test]
	fn checkpoint_wins_over_identity() {
		let doc = r#"<a href="/checkpoint/block/?next=%2F">continue</a>"#;
		let with_identity = build(doc, &[AppStateCookie::new("c_user", "100", "example.com")]).unwrap_err();
		let without_identity = build(doc, &[]).unwrap_err();
		assert!(matches!(with_identity, LoginError::DeadSession));
		assert!(matches!(without_identity, LoginError::DeadSession));
	}

	#[test]
	fn counters_start_at_zero_and_increase() {
		let ctx = build("", &[AppStateCookie::new("c_user", "1", "example.com")]).unwrap();
		assert_eq!(ctx.request_count(), 0);
		assert_eq!(ctx.next_request_id(), 1);
		assert_eq!(ctx.next_request_id(), 2);
		assert_eq!(ctx.next_ws_req_number(), 1);
		assert_eq!(ctx.next_ws_task_number(), 1);
		assert_eq!(ctx.client_id_hex(), format!("{:x}", ctx.client_id()));
	}

	#[test]
	fn token_writes_are_visible_to_readers() {
		let ctx = build("", &[AppStateCookie::new("c_user", "1", "example.com")]).unwrap();
		assert_eq!(ctx.token(), None);
		ctx.set_token("fresh".into());
		assert_eq!(ctx.token().as_deref(), Some("fresh"));
	}

	#[test]
	fn option_updates_reach_shared_settings() {
		let ctx = build("", &[AppStateCookie::new("c_user", "1", "example.com")]).unwrap();
		let partial = serde_json::json!({"selfListen": 1}).as_object().cloned().unwrap();
		ctx.apply_options(&partial);
		assert!(ctx.settings().self_listen);
		assert!(ctx.settings_handle().read().self_listen);
	}
}
