//! Option keys accepted by `setOptions`.

/// Keys whose values are coerced to booleans.
pub const BOOLEAN_OPTIONS: &[&str] = &[
	"online",
	"selfListen",
	"listenEvents",
	"updatePresence",
	"forceLogin",
	"autoMarkDelivery",
	"autoMarkRead",
	"listenTyping",
	"autoReconnect",
	"emitReady",
];

/// Keys with a dedicated side effect at write time.
pub const VALUE_OPTIONS: &[&str] = &["pauseLog", "logLevel", "logRecordSize", "pageID", "userAgent", "proxy"];

/// Returns `true` when `key` is recognized by the option validator.
pub fn is_known_option(key: &str) -> bool {
	BOOLEAN_OPTIONS.contains(&key) || VALUE_OPTIONS.contains(&key)
}
