//! Process-wide logging control.
//!
//! Logging configuration is the only state shared across concurrent logins.
//! [`init_logging`] installs a `tracing-subscriber` registry with a reloadable
//! level filter and an in-memory record buffer; the option validator adjusts
//! both through [`set_level`], [`pause`], [`resume`] and [`set_record_limit`].
//! Without an installed subscriber those calls only update bookkeeping.

use std::collections::VecDeque;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, reload};

/// Default number of records retained by the in-memory buffer.
pub const DEFAULT_RECORD_LIMIT: usize = 100;

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();
static PAUSED: AtomicBool = AtomicBool::new(false);
static LEVEL: Mutex<String> = Mutex::new(String::new());
static RECORDS: Mutex<RecordBuffer> = Mutex::new(RecordBuffer::new(DEFAULT_RECORD_LIMIT));

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbosity maps to a level
/// (`0` warn, `1` info, `2` debug, `3+` trace). Calling this twice is a no-op.
pub fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	*LEVEL.lock() = level.to_string();

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	let (filter_layer, handle) = reload::Layer::new(filter);

	let installed = tracing_subscriber::registry()
		.with(filter_layer)
		.with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
		.with(RecordLayer)
		.try_init()
		.is_ok();

	if installed {
		let _ = FILTER.set(handle);
	}
}

/// Error returned for level names that map to no tracing level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct UnknownLevel(pub String);

/// Maps a user-facing level name to a filter directive.
///
/// Accepts tracing names plus the `silly`/`verbose`/`http`/`silent` names
/// used by exported client configs.
pub fn parse_level(name: &str) -> Result<&'static str, UnknownLevel> {
	match name.trim().to_ascii_lowercase().as_str() {
		"silly" | "trace" => Ok("trace"),
		"verbose" | "debug" | "http" => Ok("debug"),
		"info" => Ok("info"),
		"warn" | "warning" => Ok("warn"),
		"error" => Ok("error"),
		"silent" | "off" => Ok("off"),
		_ => Err(UnknownLevel(name.to_string())),
	}
}

/// Sets the process log level. Takes effect on resume when logging is paused.
pub fn set_level(name: &str) -> Result<(), UnknownLevel> {
	let directive = parse_level(name)?;
	*LEVEL.lock() = directive.to_string();
	if !is_paused() {
		apply_filter(directive);
	}
	Ok(())
}

/// Returns the last level directive applied through this module.
pub fn current_level() -> String {
	LEVEL.lock().clone()
}

/// Silences all output until [`resume`].
pub fn pause() {
	if !PAUSED.swap(true, Ordering::SeqCst) {
		apply_filter("off");
	}
}

pub fn resume() {
	if PAUSED.swap(false, Ordering::SeqCst) {
		let level = current_level();
		apply_filter(if level.is_empty() { "info" } else { &level });
	}
}

pub fn is_paused() -> bool {
	PAUSED.load(Ordering::SeqCst)
}

/// Caps the in-memory record buffer, dropping the oldest records beyond `limit`.
pub fn set_record_limit(limit: usize) {
	RECORDS.lock().set_limit(limit);
}

pub fn record_limit() -> usize {
	RECORDS.lock().limit
}

/// Snapshot of the retained log records, oldest first.
pub fn recent_records() -> Vec<LogRecord> {
	RECORDS.lock().records.iter().cloned().collect()
}

fn apply_filter(directive: &str) {
	let Some(handle) = FILTER.get() else {
		return;
	};
	if let Err(err) = handle.reload(EnvFilter::new(directive)) {
		record_internal(Level::ERROR, format!("failed to reload log filter to '{directive}': {err}"));
	}
}

/// Retains a record about the logging machinery itself, which cannot go
/// through the subscriber it failed to reconfigure.
fn record_internal(level: Level, message: String) {
	RECORDS.lock().push(LogRecord {
		level,
		target: module_path!().to_string(),
		message,
	});
}

/// A log event retained in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
	pub level: Level,
	pub target: String,
	pub message: String,
}

impl fmt::Display for LogRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}: {}", self.level, self.target, self.message)
	}
}

#[derive(Debug)]
struct RecordBuffer {
	limit: usize,
	records: VecDeque<LogRecord>,
}

impl RecordBuffer {
	const fn new(limit: usize) -> Self {
		Self {
			limit,
			records: VecDeque::new(),
		}
	}

	fn set_limit(&mut self, limit: usize) {
		self.limit = limit;
		while self.records.len() > limit {
			self.records.pop_front();
		}
	}

	fn push(&mut self, record: LogRecord) {
		if self.limit == 0 {
			return;
		}
		if self.records.len() == self.limit {
			self.records.pop_front();
		}
		self.records.push_back(record);
	}
}

struct RecordLayer;

impl<S: Subscriber> Layer<S> for RecordLayer {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);
		RECORDS.lock().push(LogRecord {
			level: *event.metadata().level(),
			target: event.metadata().target().to_string(),
			message: visitor.finish(),
		});
	}
}

#[derive(Default)]
struct MessageVisitor {
	message: String,
	fields: Vec<String>,
}

impl MessageVisitor {
	fn finish(self) -> String {
		if self.fields.is_empty() {
			self.message
		} else {
			format!("{} {}", self.message, self.fields.join(" "))
		}
	}
}

impl Visit for MessageVisitor {
	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = value.to_string();
		} else {
			self.fields.push(format!("{}={}", field.name(), value));
		}
	}

	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{value:?}");
		} else {
			self.fields.push(format!("{}={:?}", field.name(), value));
		}
	}
}
