//! `sendMessage`: posts a plain-text message to a thread.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::{Capability, CapabilityRegistry, str_arg};
use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::request::RequestHelper;

pub(super) const NAME: &str = "sendMessage";
const SEND_PATH: &str = "/messaging/send/";

pub struct SendMessage {
	helper: RequestHelper,
	ctx: Arc<SessionContext>,
}

pub(super) fn build(helper: &RequestHelper, _registry: &CapabilityRegistry, ctx: &Arc<SessionContext>) -> Result<Arc<dyn Capability>, CapabilityError> {
	Ok(Arc::new(SendMessage {
		helper: helper.clone(),
		ctx: Arc::clone(ctx),
	}))
}

#[async_trait]
impl Capability for SendMessage {
	fn name(&self) -> &'static str {
		NAME
	}

	/// Expects `{"body": "...", "threadID": "..."}`.
	async fn call(&self, args: Value) -> Result<Value, CapabilityError> {
		let body = str_arg(NAME, &args, "body")?;
		let thread_id = str_arg(NAME, &args, "threadID")?;
		let form = [
			("body".to_string(), body.to_string()),
			("thread_id".to_string(), thread_id.to_string()),
			("client_id".to_string(), self.ctx.client_id_hex()),
		];
		self.helper.post_protected(SEND_PATH, &form).await?;

		let request_id = self.ctx.request_count();
		debug!(target = "msgr.capability", %thread_id, request_id, "message sent");
		Ok(json!({ "threadID": thread_id, "requestID": request_id }))
	}
}
