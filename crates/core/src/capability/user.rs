//! `getCurrentUserID`: the logged-in account identifier.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{Capability, CapabilityRegistry};
use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::request::RequestHelper;

pub(super) const NAME: &str = "getCurrentUserID";

pub struct GetCurrentUserId {
	user_id: String,
}

pub(super) fn build(_helper: &RequestHelper, _registry: &CapabilityRegistry, ctx: &Arc<SessionContext>) -> Result<Arc<dyn Capability>, CapabilityError> {
	Ok(Arc::new(GetCurrentUserId {
		user_id: ctx.user_id().to_string(),
	}))
}

#[async_trait]
impl Capability for GetCurrentUserId {
	fn name(&self) -> &'static str {
		NAME
	}

	async fn call(&self, _args: Value) -> Result<Value, CapabilityError> {
		Ok(Value::String(self.user_id.clone()))
	}
}
