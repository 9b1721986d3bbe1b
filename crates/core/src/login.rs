//! The `login` entry point.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::info;
use url::Url;

use crate::api::{Api, assemble};
use crate::capability::{CATALOG, CapabilitySpec};
use crate::config::AppConfig;
use crate::context::build_context;
use crate::error::Result;
use crate::establish::{LoginInput, establish};
use crate::options::Settings;
use crate::refresh::DEFAULT_REFRESH_INTERVAL;
use crate::sync::SessionSink;
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

pub const DEFAULT_BASE_URL: &str = "https://www.facebook.com/";

/// Everything about a login that is not a user-facing option.
#[derive(Clone)]
pub struct LoginOptions {
	pub base_url: String,
	pub request_timeout: Duration,
	/// `None` disables the periodic token refresh.
	pub refresh_interval: Option<Duration>,
	pub sink: Option<Arc<dyn SessionSink>>,
	pub catalog: &'static [CapabilitySpec],
	pub config: AppConfig,
}

impl Default for LoginOptions {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			refresh_interval: Some(DEFAULT_REFRESH_INTERVAL),
			sink: None,
			catalog: CATALOG,
			config: AppConfig::default(),
		}
	}
}

impl fmt::Debug for LoginOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LoginOptions")
			.field("base_url", &self.base_url)
			.field("request_timeout", &self.request_timeout)
			.field("refresh_interval", &self.refresh_interval)
			.field("sink", &self.sink.is_some())
			.field("catalog", &self.catalog.len())
			.field("config", &self.config)
			.finish()
	}
}

impl LoginOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn refresh_interval(mut self, interval: Duration) -> Self {
		self.refresh_interval = Some(interval);
		self
	}

	pub fn without_token_refresh(mut self) -> Self {
		self.refresh_interval = None;
		self
	}

	pub fn sink(mut self, sink: Arc<dyn SessionSink>) -> Self {
		self.sink = Some(sink);
		self
	}

	pub fn catalog(mut self, catalog: &'static [CapabilitySpec]) -> Self {
		self.catalog = catalog;
		self
	}

	pub fn config(mut self, config: AppConfig) -> Self {
		self.config = config;
		self
	}
}

/// Establishes a session and assembles its capabilities.
///
/// `partial` holds user-facing options keyed by their camelCase names; unknown
/// keys are warned about and ignored. Fails exactly once, with the first error
/// along the way.
pub async fn login(input: impl Into<LoginInput>, partial: &Map<String, Value>, options: LoginOptions) -> Result<Api> {
	let settings = Settings::from_options(partial);
	let base_url = Url::parse(&options.base_url)?;

	let established = establish(input.into(), &settings, &base_url, options.request_timeout).await?;
	let ctx = build_context(Arc::new(RwLock::new(settings)), &established.document, established.cookies, base_url)?
		.with_config(options.config.clone());

	info!(target = "msgr.session", user_id = %ctx.user_id(), region = %ctx.region(), "logged in");
	assemble(Arc::new(ctx), &options)
}
