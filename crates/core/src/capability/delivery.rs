//! `markAsDelivered`: delivery receipt for one message.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Capability, CapabilityRegistry, str_arg};
use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::request::RequestHelper;

pub(super) const NAME: &str = "markAsDelivered";
const DELIVERY_PATH: &str = "/ajax/mercury/delivery_receipts.php";

pub struct MarkAsDelivered {
	helper: RequestHelper,
}

pub(super) fn build(helper: &RequestHelper, _registry: &CapabilityRegistry, _ctx: &Arc<SessionContext>) -> Result<Arc<dyn Capability>, CapabilityError> {
	Ok(Arc::new(MarkAsDelivered { helper: helper.clone() }))
}

#[async_trait]
impl Capability for MarkAsDelivered {
	fn name(&self) -> &'static str {
		NAME
	}

	/// Expects `{"threadID": "...", "messageID": "..."}`.
	async fn call(&self, args: Value) -> Result<Value, CapabilityError> {
		let thread_id = str_arg(NAME, &args, "threadID")?;
		let message_id = str_arg(NAME, &args, "messageID")?;
		let form = [
			("message_ids[0]".to_string(), message_id.to_string()),
			(format!("thread_ids[{thread_id}][0]"), message_id.to_string()),
		];
		self.helper.post_protected(DELIVERY_PATH, &form).await?;
		Ok(json!({ "threadID": thread_id, "messageID": message_id }))
	}
}
