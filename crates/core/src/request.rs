//! Base request helper handed to every capability.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::transport::Transport;

/// Form field carrying the cross-site request token.
pub const TOKEN_FIELD: &str = "fb_dtsg";

/// Sends requests on behalf of one session: cookies attached, identity and
/// revision parameters added to form posts.
#[derive(Debug, Clone)]
pub struct RequestHelper {
	inner: Arc<HelperInner>,
}

#[derive(Debug)]
struct HelperInner {
	ctx: Arc<SessionContext>,
	transport: Transport,
}

impl RequestHelper {
	pub fn new(ctx: Arc<SessionContext>, timeout: Duration) -> Self {
		let transport = Transport::new(Arc::clone(ctx.cookies()), timeout);
		Self {
			inner: Arc::new(HelperInner { ctx, transport }),
		}
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		&self.inner.ctx
	}

	/// Resolves `path` against the service base URL.
	pub fn url(&self, path: &str) -> Result<Url, CapabilityError> {
		self.inner
			.ctx
			.base_url()
			.join(path)
			.map_err(|err| CapabilityError::Transport(format!("invalid request path '{path}': {err}")))
	}

	fn client(&self) -> Result<Client, CapabilityError> {
		self.inner
			.transport
			.client(&self.inner.ctx.settings())
			.map_err(|err| CapabilityError::Transport(err.to_string()))
	}

	/// GETs `path` and returns the body.
	pub async fn get_text(&self, path: &str) -> Result<String, CapabilityError> {
		let url = self.url(path)?;
		let response = self.client()?.get(url).send().await?;
		Ok(check_status(path, response)?.text().await?)
	}

	/// POSTs a form to `path` with the session's default parameters appended.
	pub async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<String, CapabilityError> {
		let url = self.url(path)?;
		let mut fields = form.to_vec();
		fields.extend(self.default_fields());
		debug!(target = "msgr.request", %path, fields = fields.len(), "posting form");

		let response = self.client()?.post(url).form(&fields).send().await?;
		Ok(check_status(path, response)?.text().await?)
	}

	/// Like [`post_form`](Self::post_form), but also sends the request token and
	/// advances the session's mutation counter.
	pub async fn post_protected(&self, path: &str, form: &[(String, String)]) -> Result<String, CapabilityError> {
		let ctx = &self.inner.ctx;
		let token = ctx.token().ok_or(CapabilityError::MissingToken)?;
		let mut fields = form.to_vec();
		fields.push((TOKEN_FIELD.to_string(), token));
		fields.push(("__req".to_string(), format!("{:x}", ctx.next_request_id())));
		self.post_form(path, &fields).await
	}

	fn default_fields(&self) -> Vec<(String, String)> {
		let ctx = &self.inner.ctx;
		let mut fields = vec![("__user".to_string(), ctx.user_id().to_string()), ("__a".to_string(), "1".to_string())];
		if let Some(revision) = ctx.revision() {
			fields.push(("__rev".to_string(), revision.to_string()));
		}
		if let Some(page_id) = ctx.settings().page_id {
			fields.push(("av".to_string(), page_id));
		}
		fields
	}
}

fn check_status(path: &str, response: Response) -> Result<Response, CapabilityError> {
	let status = response.status();
	if status.is_success() {
		Ok(response)
	} else {
		Err(CapabilityError::Rejected {
			path: path.to_string(),
			status: status.as_u16(),
		})
	}
}
