//! Periodic request-token refresh.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::capability::{CapabilityRegistry, REFRESH_TOKEN};
use crate::error::RefreshError;

/// Default time between refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
/// Upper bound on the refresh interval; larger values are clamped.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Background task calling `refreshToken` on a fixed interval.
///
/// Stops on [`stop`](Self::stop) or when dropped. A failed refresh is logged
/// and retried on the next tick.
#[derive(Debug)]
pub struct RefreshTask {
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}

impl RefreshTask {
	/// Spawns the task on the current runtime. The first refresh happens one
	/// full `interval` after spawning.
	pub fn spawn(registry: Arc<CapabilityRegistry>, interval: Duration) -> Self {
		let interval = interval.clamp(Duration::from_millis(1), MAX_REFRESH_INTERVAL);
		let cancel = CancellationToken::new();
		let token = cancel.clone();
		let handle = tokio::spawn(async move {
			let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				tokio::select! {
					_ = token.cancelled() => break,
					_ = ticker.tick() => {
						if let Err(err) = refresh_once(&registry).await {
							error!(target = "msgr.refresh", error = %err, "periodic token refresh failed");
						}
					}
				}
			}
			debug!(target = "msgr.refresh", "refresh task stopped");
		});
		debug!(target = "msgr.refresh", interval_secs = interval.as_secs(), "refresh task started");
		Self { cancel, handle }
	}

	pub fn stop(&self) {
		self.cancel.cancel();
	}

	/// True once the task has been asked to stop or has exited.
	pub fn is_stopped(&self) -> bool {
		self.cancel.is_cancelled() || self.handle.is_finished()
	}
}

impl Drop for RefreshTask {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

async fn refresh_once(registry: &CapabilityRegistry) -> Result<(), RefreshError> {
	let Some(capability) = registry.get(REFRESH_TOKEN) else {
		return Ok(());
	};
	capability.call(Value::Null).await?;
	Ok(())
}
