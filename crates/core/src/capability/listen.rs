//! `listenMqtt` (alias `listen`): describes the streaming connection for this
//! session and acknowledges delivered messages through `markAsDelivered`.
//!
//! The streaming wire protocol lives outside this crate. The capability hands
//! the caller everything needed to open the connection: the endpoint with the
//! session query attached, the client identifiers, and the listen flags.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{Capability, CapabilityRegistry, LISTEN, delivery};
use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::request::RequestHelper;

pub struct ListenMqtt {
	ctx: Arc<SessionContext>,
	deliver: Arc<dyn Capability>,
}

pub(super) fn build(_helper: &RequestHelper, registry: &CapabilityRegistry, ctx: &Arc<SessionContext>) -> Result<Arc<dyn Capability>, CapabilityError> {
	let deliver = registry.require(LISTEN, delivery::NAME)?;
	Ok(Arc::new(ListenMqtt {
		ctx: Arc::clone(ctx),
		deliver,
	}))
}

impl ListenMqtt {
	/// Forwards each `{"threadID", "messageID"}` entry to the delivery sibling.
	/// Failures are logged and skipped; the count of acknowledged entries is returned.
	async fn acknowledge(&self, deliveries: &[Value]) -> usize {
		let mut acknowledged = 0;
		for entry in deliveries {
			match self.deliver.call(entry.clone()).await {
				Ok(_) => acknowledged += 1,
				Err(err) => warn!(target = "msgr.listen", error = %err, "delivery receipt failed"),
			}
		}
		acknowledged
	}
}

#[async_trait]
impl Capability for ListenMqtt {
	fn name(&self) -> &'static str {
		LISTEN
	}

	async fn call(&self, args: Value) -> Result<Value, CapabilityError> {
		let ctx = &self.ctx;
		let mut endpoint = ctx.mqtt_endpoint().cloned().ok_or(CapabilityError::MissingEndpoint)?;
		let settings = ctx.settings();
		let config = &ctx.config().mqtt;

		let session_id = rand::random::<u32>() & 0x1f_ffff;
		let client_id = ctx.client_id_hex();
		endpoint
			.query_pairs_mut()
			.append_pair("sid", &session_id.to_string())
			.append_pair("cid", &client_id);

		let mut descriptor = json!({
			"endpoint": endpoint.as_str(),
			"region": ctx.region(),
			"clientId": client_id,
			"sessionId": session_id,
			"userId": ctx.user_id(),
			"wsReqNumber": ctx.next_ws_req_number(),
			"selfListen": settings.self_listen,
			"listenEvents": settings.listen_events,
			"listenTyping": settings.listen_typing,
			"online": settings.online,
			"autoReconnect": settings.auto_reconnect && config.enabled,
			"reconnectIntervalSecs": config.reconnect_interval,
		});

		if let Some(deliveries) = args.get("deliveries").and_then(Value::as_array) {
			let acknowledged = if settings.auto_mark_delivery {
				self.acknowledge(deliveries).await
			} else {
				debug!(target = "msgr.listen", pending = deliveries.len(), "automatic delivery receipts disabled");
				0
			};
			descriptor["acknowledged"] = Value::from(acknowledged);
		}

		debug!(target = "msgr.listen", endpoint = %endpoint, %session_id, "listen descriptor issued");
		Ok(descriptor)
	}
}
