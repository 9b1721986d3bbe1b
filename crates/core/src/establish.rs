//! Session establishment: from app state or credentials to an authenticated landing page.
//!
//! Requests run strictly in sequence; each one carries the cookies persisted
//! from every earlier response. At most one meta-refresh redirect is followed.
//! Nothing here retries.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use msgr_protocol::{AppStateInput, Credentials};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::cookies::SessionCookies;
use crate::error::{LoginError, Result};
use crate::options::Settings;
use crate::transport::Transport;

static META_REFRESH_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)<meta\s+http-equiv=["']?refresh["']?\s+content=["']?\s*\d+\s*;\s*url=([^"'>\s]+)"#)
		.expect("META_REFRESH_RE should compile")
});

/// What a login starts from.
#[derive(Debug, Clone)]
pub enum LoginInput {
	AppState(AppStateInput),
	Credentials(Credentials),
}

impl From<AppStateInput> for LoginInput {
	fn from(state: AppStateInput) -> Self {
		LoginInput::AppState(state)
	}
}

impl From<Credentials> for LoginInput {
	fn from(credentials: Credentials) -> Self {
		LoginInput::Credentials(credentials)
	}
}

/// Result of a successful establishment.
#[derive(Debug)]
pub struct Established {
	/// Body of the final landing page.
	pub document: String,
	/// URL the final document was served from.
	pub url: Url,
	pub cookies: Arc<SessionCookies>,
}

/// Runs the establishment request sequence against `base_url`.
pub async fn establish(input: LoginInput, settings: &Settings, base_url: &Url, timeout: Duration) -> Result<Established> {
	let (transport, page) = match input {
		LoginInput::AppState(state) => {
			let records = state.into_cookies().map_err(LoginError::MalformedState)?;
			let cookies = Arc::new(SessionCookies::from_app_state(&records));
			debug!(target = "msgr.session", cookies = cookies.len(), "installed session state");

			let transport = Transport::new(cookies, timeout).without_referer();
			let client = transport.client(settings).map_err(LoginError::Transport)?;
			let page = fetch(&client, base_url).await?;
			(transport, page)
		}
		LoginInput::Credentials(_) => {
			debug!(target = "msgr.session", "priming cookies for credential login");
			let transport = Transport::new(Arc::new(SessionCookies::new()), timeout);
			let client = transport.client(settings).map_err(LoginError::Transport)?;
			let baseline = fetch(&client, base_url).await?;
			debug!(target = "msgr.session", cookies = transport.cookies().len(), url = %baseline.url, "baseline cookies persisted");
			let page = fetch(&client, base_url).await?;
			(transport, page)
		}
	};

	let client = transport.client(settings).map_err(LoginError::Transport)?;
	let page = match meta_refresh_target(&page.body, &page.url) {
		Some(target) => {
			debug!(target = "msgr.session", url = %target, "following meta refresh");
			fetch(&client, &target).await?
		}
		None => page,
	};

	Ok(Established {
		document: page.body,
		url: page.url,
		cookies: Arc::clone(transport.cookies()),
	})
}

struct Page {
	url: Url,
	body: String,
}

async fn fetch(client: &Client, url: &Url) -> Result<Page> {
	let response = client.get(url.clone()).send().await?;
	let status = response.status();
	let final_url = response.url().clone();
	let body = response.text().await?;
	debug!(target = "msgr.session", %final_url, status = status.as_u16(), bytes = body.len(), "fetched page");
	Ok(Page { url: final_url, body })
}

/// Target of a `<meta http-equiv="refresh">` directive, resolved against `base`.
fn meta_refresh_target(body: &str, base: &Url) -> Option<Url> {
	let raw = META_REFRESH_RE.captures(body)?.get(1)?.as_str();
	let decoded = raw.replace("&amp;", "&");
	base.join(&decoded)
		.inspect_err(|err| warn!(target = "msgr.session", target_url = %decoded, error = %err, "ignoring unresolvable meta refresh"))
		.ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base() -> Url {
		Url::parse("https://www.example.com/home.php").unwrap()
	}

	#[test]
	fn meta_refresh_absolute_target() {
		let body = r#"<html><head><meta http-equiv="refresh" content="0;url=https://www.example.com/?noscript=1" /></head></html>"#;
		assert_eq!(
			meta_refresh_target(body, &base()).unwrap().as_str(),
			"https://www.example.com/?noscript=1"
		);
	}

	#[test]
	fn meta_refresh_relative_target_with_entities() {
		let body = r#"<META HTTP-EQUIV='Refresh' CONTENT='3; URL=/landing?a=1&amp;b=2'>"#;
		assert_eq!(
			meta_refresh_target(body, &base()).unwrap().as_str(),
			"https://www.example.com/landing?a=1&b=2"
		);
	}

	#[test]
	fn no_meta_refresh() {
		assert!(meta_refresh_target("<meta charset=\"utf-8\">", &base()).is_none());
	}

	#[derive(Clone, Default)]
	struct FieldCapture(Arc<parking_lot::Mutex<Vec<String>>>);

	impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldCapture {
		fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
			struct Collect<'a>(&'a mut Vec<String>);
			impl tracing::field::Visit for Collect<'_> {
				fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
					self.0.push(format!("{}={value:?}", field.name()));
				}
			}
			event.record(&mut Collect(&mut self.0.lock()));
		}
	}

	#[tokio::test]
	async fn credential_login_does_not_log_the_account() {
		use tracing_subscriber::layer::SubscriberExt;

		let capture = FieldCapture::default();
		let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

		let unreachable = Url::parse("http://127.0.0.1:9/").unwrap();
		let input = LoginInput::Credentials(Credentials::new("someone@example.com", "hunter2"));
		let _ = establish(input, &Settings::default(), &unreachable, Duration::from_secs(1)).await;

		let fields = capture.0.lock();
		assert!(!fields.is_empty());
		assert!(fields.iter().all(|f| !f.contains("someone@example.com") && !f.contains("hunter2")));
	}

	#[tokio::test]
	async fn malformed_state_text_fails_before_any_request() {
		let unreachable = Url::parse("http://127.0.0.1:9/").unwrap();
		let err = establish(
			LoginInput::AppState(AppStateInput::Text("{not json".into())),
			&Settings::default(),
			&unreachable,
			Duration::from_secs(1),
		)
		.await
		.unwrap_err();
		assert!(matches!(err, LoginError::MalformedState(_)));
	}
}
