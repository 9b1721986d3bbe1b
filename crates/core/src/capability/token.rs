//! `refreshToken`: re-reads the cross-site request token from the landing page.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::{Capability, CapabilityRegistry, REFRESH_TOKEN};
use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::extract::ProtocolParams;
use crate::request::RequestHelper;

pub struct RefreshToken {
	helper: RequestHelper,
	ctx: Arc<SessionContext>,
}

pub(super) fn build(helper: &RequestHelper, _registry: &CapabilityRegistry, ctx: &Arc<SessionContext>) -> Result<Arc<dyn Capability>, CapabilityError> {
	Ok(Arc::new(RefreshToken {
		helper: helper.clone(),
		ctx: Arc::clone(ctx),
	}))
}

#[async_trait]
impl Capability for RefreshToken {
	fn name(&self) -> &'static str {
		REFRESH_TOKEN
	}

	async fn call(&self, _args: Value) -> Result<Value, CapabilityError> {
		let document = self.helper.get_text("/").await?;
		let params = ProtocolParams::extract(&document).map_err(Box::new)?;
		let token = params.token.ok_or(CapabilityError::MissingToken)?;

		self.ctx.set_token(token.clone());
		info!(target = "msgr.capability", user_id = %self.ctx.user_id(), "request token refreshed");
		Ok(json!({ "token": token }))
	}
}
