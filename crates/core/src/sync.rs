//! Post-login session persistence.
//!
//! A [`SessionSink`] receives one [`SessionSnapshot`] after every successful
//! login. The sync runs detached from the login call: its failures are logged
//! and never reach the caller.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use msgr_protocol::AppStateCookie;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::context::SessionContext;

pub type SinkError = Box<dyn Error + Send + Sync>;

/// What a sink gets to store about a fresh session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	pub user_id: String,
	pub region: String,
	pub endpoint: Option<String>,
	pub app_state: Vec<AppStateCookie>,
}

impl SessionSnapshot {
	pub fn capture(ctx: &SessionContext) -> Self {
		Self {
			user_id: ctx.user_id().to_string(),
			region: ctx.region().to_string(),
			endpoint: ctx.mqtt_endpoint().map(|url| url.to_string()),
			app_state: ctx.cookies().deduplicated_app_state(),
		}
	}
}

#[async_trait]
pub trait SessionSink: Send + Sync {
	async fn sync(&self, snapshot: SessionSnapshot) -> Result<(), SinkError>;
}

/// Writes each snapshot as pretty JSON to a fixed path, replacing the previous one.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
	path: PathBuf,
}

impl JsonFileSink {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

#[async_trait]
impl SessionSink for JsonFileSink {
	async fn sync(&self, snapshot: SessionSnapshot) -> Result<(), SinkError> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await?;
			}
		}
		let json = serde_json::to_vec_pretty(&snapshot)?;
		tokio::fs::write(&self.path, json).await?;
		Ok(())
	}
}

/// Runs `sink` on a detached task.
pub fn spawn_sync(sink: Arc<dyn SessionSink>, snapshot: SessionSnapshot) {
	tokio::spawn(async move {
		let user_id = snapshot.user_id.clone();
		match sink.sync(snapshot).await {
			Ok(()) => debug!(target = "msgr.sync", %user_id, "session synced"),
			Err(err) => error!(target = "msgr.sync", %user_id, error = %err, "session sync failed"),
		}
	});
}
