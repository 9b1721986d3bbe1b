//! Session settings and the option validator.
//!
//! [`apply_options`] is the single write path for [`Settings`]: boolean keys are
//! coerced, value keys run their side effect, unknown keys are warned about and
//! dropped. Applying the same partial options twice yields the same state as
//! applying them once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::logging;

/// User agent sent when none (or an empty one) is configured.
pub const DEFAULT_USER_AGENT: &str =
	"Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Settings shared by every component of a logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	pub online: bool,
	pub self_listen: bool,
	pub listen_events: bool,
	pub update_presence: bool,
	pub force_login: bool,
	pub auto_mark_delivery: bool,
	pub auto_mark_read: bool,
	pub listen_typing: bool,
	pub auto_reconnect: bool,
	pub emit_ready: bool,
	pub pause_log: bool,
	pub log_level: String,
	pub log_record_size: usize,
	#[serde(rename = "pageID")]
	pub page_id: Option<String>,
	pub user_agent: String,
	pub proxy: Option<String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			online: true,
			self_listen: false,
			listen_events: true,
			update_presence: false,
			force_login: false,
			auto_mark_delivery: false,
			auto_mark_read: false,
			listen_typing: false,
			auto_reconnect: true,
			emit_ready: false,
			pause_log: false,
			log_level: "info".to_string(),
			log_record_size: logging::DEFAULT_RECORD_LIMIT,
			page_id: None,
			user_agent: DEFAULT_USER_AGENT.to_string(),
			proxy: None,
		}
	}
}

impl Settings {
	/// Defaults with `partial` applied on top.
	pub fn from_options(partial: &Map<String, Value>) -> Self {
		let mut settings = Self::default();
		apply_options(&mut settings, partial);
		settings
	}

	fn bool_slot(&mut self, key: &str) -> Option<&mut bool> {
		Some(match key {
			"online" => &mut self.online,
			"selfListen" => &mut self.self_listen,
			"listenEvents" => &mut self.listen_events,
			"updatePresence" => &mut self.update_presence,
			"forceLogin" => &mut self.force_login,
			"autoMarkDelivery" => &mut self.auto_mark_delivery,
			"autoMarkRead" => &mut self.auto_mark_read,
			"listenTyping" => &mut self.listen_typing,
			"autoReconnect" => &mut self.auto_reconnect,
			"emitReady" => &mut self.emit_ready,
			_ => return None,
		})
	}
}

/// Applies `partial` to `settings` in place. Never fails.
pub fn apply_options(settings: &mut Settings, partial: &Map<String, Value>) {
	for (key, value) in partial {
		if let Some(slot) = settings.bool_slot(key) {
			*slot = truthy(value);
			continue;
		}

		match key.as_str() {
			"pauseLog" => {
				let paused = truthy(value);
				if paused {
					logging::pause();
				} else {
					logging::resume();
				}
				settings.pause_log = paused;
			}
			"logLevel" => match value.as_str().map(|level| (level, logging::set_level(level))) {
				Some((level, Ok(()))) => settings.log_level = level.to_string(),
				Some((_, Err(err))) => warn!(target = "msgr.options", option = %key, error = %err, "ignoring invalid option value"),
				None => warn!(target = "msgr.options", option = %key, value = %value, "logLevel must be a string; ignoring"),
			},
			"logRecordSize" => match value.as_u64() {
				Some(size) => {
					let size = usize::try_from(size).unwrap_or(usize::MAX);
					logging::set_record_limit(size);
					settings.log_record_size = size;
				}
				None => warn!(target = "msgr.options", option = %key, value = %value, "logRecordSize must be a non-negative integer; ignoring"),
			},
			"pageID" => settings.page_id = Some(stringify(value)),
			"userAgent" => {
				settings.user_agent = match value.as_str() {
					Some(ua) if !ua.is_empty() => ua.to_string(),
					_ => DEFAULT_USER_AGENT.to_string(),
				};
			}
			"proxy" => {
				settings.proxy = value.as_str().filter(|p| !p.is_empty()).map(str::to_string);
				debug!(target = "msgr.options", proxy = ?settings.proxy, "proxy updated");
			}
			_ => {
				debug_assert!(!msgr_protocol::is_known_option(key), "recognized option {key} has no handler");
				warn!(target = "msgr.options", option = %key, "unrecognized option; ignoring");
			}
		}
	}
}

/// Boolean coercion with script-style truthiness.
///
/// `false`, `null`, `0`, `NaN` and `""` are false; everything else, including
/// the strings `"false"` and `"0"`, arrays and objects, is true.
pub fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

fn stringify(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
