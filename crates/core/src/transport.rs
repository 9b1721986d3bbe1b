//! HTTP client construction bound to a session cookie store.
//!
//! The client is rebuilt whenever the user agent or proxy in [`Settings`]
//! changes, which is how a `proxy` option set after login reaches the wire.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::cookies::SessionCookies;
use crate::options::Settings;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientKey {
	user_agent: String,
	proxy: Option<String>,
}

impl From<&Settings> for ClientKey {
	fn from(settings: &Settings) -> Self {
		Self {
			user_agent: settings.user_agent.clone(),
			proxy: settings.proxy.clone(),
		}
	}
}

/// Cookie-aware client factory for one session.
#[derive(Debug)]
pub struct Transport {
	cookies: Arc<SessionCookies>,
	timeout: Duration,
	referer: bool,
	cached: Mutex<Option<(ClientKey, Client)>>,
}

impl Transport {
	pub fn new(cookies: Arc<SessionCookies>, timeout: Duration) -> Self {
		Self {
			cookies,
			timeout,
			referer: true,
			cached: Mutex::new(None),
		}
	}

	/// Disables the `Referer` header on redirects.
	pub fn without_referer(mut self) -> Self {
		self.referer = false;
		self
	}

	pub fn cookies(&self) -> &Arc<SessionCookies> {
		&self.cookies
	}

	/// Returns a client matching `settings`, reusing the cached one when unchanged.
	pub fn client(&self, settings: &Settings) -> Result<Client, reqwest::Error> {
		let key = ClientKey::from(settings);
		let mut cached = self.cached.lock();
		if let Some((cached_key, client)) = cached.as_ref() {
			if *cached_key == key {
				return Ok(client.clone());
			}
		}

		debug!(target = "msgr.transport", proxy = ?key.proxy, referer = self.referer, "building HTTP client");
		let mut builder = Client::builder()
			.cookie_provider(Arc::clone(&self.cookies))
			.user_agent(key.user_agent.as_str())
			.timeout(self.timeout)
			.referer(self.referer);
		if let Some(proxy) = &key.proxy {
			builder = builder.proxy(Proxy::all(proxy.as_str())?);
		}

		let client = builder.build()?;
		*cached = Some((key, client.clone()));
		Ok(client)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn client_is_reused_until_settings_change() {
		let transport = Transport::new(Arc::new(SessionCookies::new()), DEFAULT_REQUEST_TIMEOUT);
		let mut settings = Settings::default();
		transport.client(&settings).unwrap();
		let first_key = transport.cached.lock().as_ref().map(|(k, _)| k.clone());

		transport.client(&settings).unwrap();
		assert_eq!(transport.cached.lock().as_ref().map(|(k, _)| k.clone()), first_key);

		settings.proxy = Some("http://127.0.0.1:3128".into());
		transport.client(&settings).unwrap();
		let key = transport.cached.lock().as_ref().map(|(k, _)| k.clone()).unwrap();
		assert_eq!(key.proxy.as_deref(), Some("http://127.0.0.1:3128"));
	}

	#[test]
	fn invalid_proxy_is_reported() {
		let transport = Transport::new(Arc::new(SessionCookies::new()), DEFAULT_REQUEST_TIMEOUT);
		let settings = Settings {
			proxy: Some("not a proxy url".into()),
			..Settings::default()
		};
		assert!(transport.client(&settings).is_err());
	}
}
