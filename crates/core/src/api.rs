//! The object a successful login hands back.

use std::sync::Arc;

use msgr_protocol::AppStateCookie;
use serde_json::{Map, Value};
use tracing::debug;

use crate::capability::{Capability, CapabilityRegistry, LISTEN_ALIAS, assemble_registry};
use crate::context::SessionContext;
use crate::error::{CapabilityError, Result};
use crate::login::LoginOptions;
use crate::refresh::RefreshTask;
use crate::request::RequestHelper;
use crate::sync::{SessionSnapshot, spawn_sync};

/// A logged-in session and its capabilities.
///
/// Dropping the `Api` stops the token refresh task.
#[derive(Debug)]
pub struct Api {
	ctx: Arc<SessionContext>,
	registry: Arc<CapabilityRegistry>,
	refresh: Option<RefreshTask>,
}

/// Builds the capability registry for `ctx` and starts the background work.
pub fn assemble(ctx: Arc<SessionContext>, options: &LoginOptions) -> Result<Api> {
	let helper = RequestHelper::new(Arc::clone(&ctx), options.request_timeout);
	let registry = Arc::new(assemble_registry(options.catalog, &helper, &ctx)?);
	debug!(target = "msgr.capability", count = registry.len(), "capabilities assembled");

	if let Some(sink) = &options.sink {
		spawn_sync(Arc::clone(sink), SessionSnapshot::capture(&ctx));
	}
	let refresh = options
		.refresh_interval
		.map(|interval| RefreshTask::spawn(Arc::clone(&registry), interval));

	Ok(Api { ctx, registry, refresh })
}

impl Api {
	pub fn user_id(&self) -> &str {
		self.ctx.user_id()
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		&self.ctx
	}

	pub fn registry(&self) -> &Arc<CapabilityRegistry> {
		&self.registry
	}

	/// Applies partial options to the live settings.
	pub fn set_options(&self, partial: &Map<String, Value>) {
		self.ctx.apply_options(partial);
	}

	/// Current session cookies, first occurrence per key.
	pub fn get_app_state(&self) -> Vec<AppStateCookie> {
		self.ctx.cookies().deduplicated_app_state()
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
		self.registry.get(name)
	}

	pub async fn call(&self, name: &str, args: Value) -> Result<Value, CapabilityError> {
		self.registry.call(name, args).await
	}

	/// The legacy `listen` alias.
	pub fn listen(&self) -> Option<Arc<dyn Capability>> {
		self.registry.get(LISTEN_ALIAS)
	}

	pub fn capability_names(&self) -> Vec<&str> {
		self.registry.names()
	}

	pub fn is_refreshing(&self) -> bool {
		self.refresh.as_ref().is_some_and(|task| !task.is_stopped())
	}

	/// Stops background work. Capabilities stay callable.
	pub fn close(&mut self) {
		if let Some(task) = self.refresh.take() {
			task.stop();
			debug!(target = "msgr.session", user_id = %self.ctx.user_id(), "session closed");
		}
	}
}
