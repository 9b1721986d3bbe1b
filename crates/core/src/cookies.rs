//! Session cookie store.
//!
//! [`SessionCookies`] is attached to the HTTP client as its cookie provider, so
//! `Set-Cookie` headers from every response, redirects included, are persisted
//! before the next request goes out. Entries are only ever added or overwritten
//! in place (same name, domain and path); nothing expires them. A cookie is
//! only accepted for the responding host or a domain it belongs to, and
//! `Secure` cookies are only sent over https.

use msgr_protocol::{AppStateCookie, CookieExpiry};
use parking_lot::RwLock;
use reqwest::header::HeaderValue;
use tracing::trace;
use url::Url;

/// Primary identity cookie.
pub const IDENTITY_COOKIE: &str = "c_user";
/// Alternate identity cookie, preferred when present.
pub const ALT_IDENTITY_COOKIE: &str = "i_user";

#[derive(Debug, Clone, PartialEq)]
struct StoredCookie {
	name: String,
	value: String,
	domain: String,
	path: String,
	expires: Option<CookieExpiry>,
	/// Only sent over https.
	secure: bool,
}

impl StoredCookie {
	fn matches(&self, url: &Url) -> bool {
		let Some(host) = url.host_str() else {
			return false;
		};
		if self.secure && url.scheme() != "https" {
			return false;
		}
		domain_matches(host, &self.domain) && path_matches(url.path(), &self.path)
	}

	fn same_slot(&self, other: &StoredCookie) -> bool {
		self.name == other.name && self.domain == other.domain && self.path == other.path
	}
}

/// Ordered, thread-safe cookie set for one session.
#[derive(Debug, Default)]
pub struct SessionCookies {
	cookies: RwLock<Vec<StoredCookie>>,
}

impl SessionCookies {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a store from serialized session state, one entry per record.
	pub fn from_app_state(records: &[AppStateCookie]) -> Self {
		let store = Self::new();
		for record in records {
			store.install(record);
		}
		store
	}

	/// Installs a serialized cookie under its own domain and path.
	pub fn install(&self, record: &AppStateCookie) {
		self.upsert(StoredCookie {
			name: record.key.clone(),
			value: record.value.clone(),
			domain: normalize_domain(&record.domain),
			path: if record.path.is_empty() { "/".to_string() } else { record.path.clone() },
			expires: record.expires.clone(),
			secure: false,
		});
	}

	/// Value of the first cookie named `name`, regardless of domain.
	pub fn get(&self, name: &str) -> Option<String> {
		self.cookies.read().iter().find(|c| c.name == name).map(|c| c.value.clone())
	}

	pub fn len(&self) -> usize {
		self.cookies.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.cookies.read().is_empty()
	}

	/// Identity derived from the identity cookies, preferring the alternate one.
	pub fn identity(&self) -> Option<String> {
		self.get(ALT_IDENTITY_COOKIE).or_else(|| self.get(IDENTITY_COOKIE))
	}

	/// All cookies in insertion order, as serialized session state.
	pub fn to_app_state(&self) -> Vec<AppStateCookie> {
		self.cookies
			.read()
			.iter()
			.map(|c| AppStateCookie {
				key: c.name.clone(),
				value: c.value.clone(),
				expires: c.expires.clone(),
				domain: c.domain.clone(),
				path: c.path.clone(),
			})
			.collect()
	}

	/// Session state with one entry per cookie key; the first occurrence wins.
	pub fn deduplicated_app_state(&self) -> Vec<AppStateCookie> {
		let mut seen = std::collections::HashSet::new();
		self.to_app_state().into_iter().filter(|c| seen.insert(c.key.clone())).collect()
	}

	/// `Cookie` header value for a request to `url`.
	pub fn header_for(&self, url: &Url) -> Option<String> {
		let cookies = self.cookies.read();
		let pairs: Vec<String> = cookies
			.iter()
			.filter(|c| c.matches(url))
			.map(|c| format!("{}={}", c.name, c.value))
			.collect();
		(!pairs.is_empty()).then(|| pairs.join("; "))
	}

	/// Persists one `Set-Cookie` header received from `url`.
	pub fn store_set_cookie(&self, header: &str, url: &Url) {
		match parse_set_cookie(header, url) {
			Some(cookie) => {
				trace!(target = "msgr.cookies", name = %cookie.name, domain = %cookie.domain, "cookie stored");
				self.upsert(cookie);
			}
			None => trace!(target = "msgr.cookies", %header, "ignoring unparsable Set-Cookie"),
		}
	}

	fn upsert(&self, cookie: StoredCookie) {
		let mut cookies = self.cookies.write();
		match cookies.iter_mut().find(|existing| existing.same_slot(&cookie)) {
			Some(existing) => *existing = cookie,
			None => cookies.push(cookie),
		}
	}
}

impl reqwest::cookie::CookieStore for SessionCookies {
	fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
		for header in cookie_headers {
			if let Ok(raw) = header.to_str() {
				self.store_set_cookie(raw, url);
			}
		}
	}

	fn cookies(&self, url: &Url) -> Option<HeaderValue> {
		self.header_for(url).and_then(|value| HeaderValue::from_str(&value).ok())
	}
}

fn normalize_domain(domain: &str) -> String {
	domain.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn domain_matches(host: &str, domain: &str) -> bool {
	let host = host.to_ascii_lowercase();
	host == domain || host.strip_suffix(domain).is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
	if cookie_path == "/" || request_path == cookie_path {
		return true;
	}
	request_path.starts_with(cookie_path)
		&& (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Parses the subset of `Set-Cookie` the session needs: name, value, domain,
/// path, expiry and the secure flag. Domains default to the responding host;
/// a `Domain` attribute the host does not domain-match rejects the cookie.
fn parse_set_cookie(header: &str, url: &Url) -> Option<StoredCookie> {
	let mut parts = header.split(';');
	let (name, value) = parts.next()?.split_once('=')?;
	let name = name.trim();
	if name.is_empty() {
		return None;
	}

	let host = url.host_str()?.to_ascii_lowercase();
	let mut cookie = StoredCookie {
		name: name.to_string(),
		value: value.trim().trim_matches('"').to_string(),
		domain: host.clone(),
		path: default_cookie_path(url),
		expires: None,
		secure: false,
	};

	for attr in parts {
		let (key, val) = attr.split_once('=').map_or((attr.trim(), ""), |(k, v)| (k.trim(), v.trim()));
		match key.to_ascii_lowercase().as_str() {
			"domain" if !val.is_empty() => {
				let domain = normalize_domain(val);
				if !domain_matches(&host, &domain) {
					trace!(target = "msgr.cookies", name = %cookie.name, %domain, %host, "rejecting cookie for foreign domain");
					return None;
				}
				cookie.domain = domain;
			}
			"secure" => cookie.secure = true,
			"path" if val.starts_with('/') => cookie.path = val.to_string(),
			"expires" if cookie.expires.is_none() => cookie.expires = Some(CookieExpiry::Date(val.to_string())),
			"max-age" => {
				if let Ok(secs) = val.parse::<i64>() {
					cookie.expires = Some(CookieExpiry::Timestamp(unix_now().saturating_add(secs) as f64));
				}
			}
			_ => {}
		}
	}

	Some(cookie)
}

fn default_cookie_path(url: &Url) -> String {
	match url.path().rfind('/') {
		Some(0) | None => "/".to_string(),
		Some(idx) => url.path()[..idx].to_string(),
	}
}

fn unix_now() -> i64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0)
}
