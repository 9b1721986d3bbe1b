//! Capability modules and the registry they are installed into.
//!
//! Capabilities are listed in a static [`CATALOG`]; each entry's factory
//! receives the base request helper, the registry as built so far, and the
//! shared context. A factory may look up siblings installed before it, never
//! after: [`CapabilityRegistry::require`] turns a reverse dependency into a
//! [`CapabilityError::MissingSibling`] instead of resolving it.

mod delivery;
mod listen;
mod send;
mod token;
mod user;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

pub use delivery::MarkAsDelivered;
pub use listen::ListenMqtt;
pub use send::SendMessage;
pub use token::RefreshToken;
pub use user::GetCurrentUserId;

use crate::context::SessionContext;
use crate::error::CapabilityError;
use crate::request::RequestHelper;

/// Canonical name of the listen capability.
pub const LISTEN: &str = "listenMqtt";
/// Legacy alias resolving to [`LISTEN`].
pub const LISTEN_ALIAS: &str = "listen";
/// Capability invoked by the periodic token refresh.
pub const REFRESH_TOKEN: &str = "refreshToken";

/// One feature bound to a logged-in session.
#[async_trait]
pub trait Capability: Send + Sync {
	fn name(&self) -> &'static str;

	async fn call(&self, args: Value) -> Result<Value, CapabilityError>;
}

/// Builds a capability from the helper, the partial registry, and the context.
pub type CapabilityFactory = fn(&RequestHelper, &CapabilityRegistry, &Arc<SessionContext>) -> Result<Arc<dyn Capability>, CapabilityError>;

/// A catalog entry.
#[derive(Clone, Copy)]
pub struct CapabilitySpec {
	pub name: &'static str,
	pub build: CapabilityFactory,
}

impl fmt::Debug for CapabilitySpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CapabilitySpec").field("name", &self.name).finish_non_exhaustive()
	}
}

/// Every capability shipped with the crate, in installation order.
pub const CATALOG: &[CapabilitySpec] = &[
	CapabilitySpec {
		name: user::NAME,
		build: user::build,
	},
	CapabilitySpec {
		name: delivery::NAME,
		build: delivery::build,
	},
	CapabilitySpec {
		name: LISTEN,
		build: listen::build,
	},
	CapabilitySpec {
		name: REFRESH_TOKEN,
		build: token::build,
	},
	CapabilitySpec {
		name: send::NAME,
		build: send::build,
	},
];

/// Name → capability map for one session.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
	entries: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
	/// Installs `capability` under `name`. Names are unique.
	pub fn install(&mut self, name: &str, capability: Arc<dyn Capability>) -> Result<(), CapabilityError> {
		if self.entries.contains_key(name) {
			return Err(CapabilityError::Duplicate(name.to_string()));
		}
		self.entries.insert(name.to_string(), capability);
		Ok(())
	}

	/// Points `alias` at the same capability object as `canonical`.
	pub fn alias(&mut self, alias: &str, canonical: &str) -> Result<(), CapabilityError> {
		let target = self.get(canonical).ok_or_else(|| CapabilityError::Unknown(canonical.to_string()))?;
		self.install(alias, target)
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
		self.entries.get(name).cloned()
	}

	/// Looks up a sibling that `capability` depends on.
	pub fn require(&self, capability: &'static str, sibling: &'static str) -> Result<Arc<dyn Capability>, CapabilityError> {
		self.get(sibling).ok_or(CapabilityError::MissingSibling { capability, sibling })
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Installed names, sorted.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub async fn call(&self, name: &str, args: Value) -> Result<Value, CapabilityError> {
		let capability = self.get(name).ok_or_else(|| CapabilityError::Unknown(name.to_string()))?;
		capability.call(args).await
	}
}

impl fmt::Debug for CapabilityRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CapabilityRegistry").field("names", &self.names()).finish()
	}
}

/// Instantiates every catalog entry in order and installs the listen alias.
pub fn assemble_registry(catalog: &[CapabilitySpec], helper: &RequestHelper, ctx: &Arc<SessionContext>) -> Result<CapabilityRegistry, CapabilityError> {
	let mut registry = CapabilityRegistry::default();
	for spec in catalog {
		let capability = (spec.build)(helper, &registry, ctx)?;
		registry.install(spec.name, capability)?;
		debug!(target = "msgr.capability", name = spec.name, "capability installed");
	}

	if registry.contains(LISTEN) {
		registry.alias(LISTEN_ALIAS, LISTEN)?;
	}
	Ok(registry)
}

/// Reads a required string argument.
fn str_arg<'a>(capability: &'static str, args: &'a Value, key: &str) -> Result<&'a str, CapabilityError> {
	args.get(key)
		.and_then(Value::as_str)
		.filter(|s| !s.is_empty())
		.ok_or_else(|| CapabilityError::InvalidArgs {
			capability,
			reason: format!("'{key}' must be a non-empty string"),
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Named(&'static str);

	#[async_trait]
	impl Capability for Named {
		fn name(&self) -> &'static str {
			self.0
		}

		async fn call(&self, _args: Value) -> Result<Value, CapabilityError> {
			Ok(Value::from(self.0))
		}
	}

	#[test]
	fn duplicate_names_are_rejected() {
		let mut registry = CapabilityRegistry::default();
		registry.install("a", Arc::new(Named("a"))).unwrap();
		let err = registry.install("a", Arc::new(Named("a"))).unwrap_err();
		assert!(matches!(err, CapabilityError::Duplicate(name) if name == "a"));
	}

	#[test]
	fn alias_shares_the_same_object() {
		let mut registry = CapabilityRegistry::default();
		registry.install(LISTEN, Arc::new(Named(LISTEN))).unwrap();
		registry.alias(LISTEN_ALIAS, LISTEN).unwrap();
		let canonical = registry.get(LISTEN).unwrap();
		let alias = registry.get(LISTEN_ALIAS).unwrap();
		assert!(Arc::ptr_eq(&canonical, &alias));
		assert_eq!(registry.names(), [LISTEN_ALIAS, LISTEN]);
	}

	#[test]
	fn alias_of_unknown_capability_fails() {
		let mut registry = CapabilityRegistry::default();
		assert!(matches!(registry.alias("x", "missing"), Err(CapabilityError::Unknown(_))));
	}

	#[test]
	fn require_reports_missing_sibling() {
		let registry = CapabilityRegistry::default();
		let err = registry.require("listenMqtt", "markAsDelivered").err().unwrap();
		assert!(matches!(
			err,
			CapabilityError::MissingSibling {
				capability: "listenMqtt",
				sibling: "markAsDelivered"
			}
		));
	}

	#[test]
	fn catalog_names_are_unique() {
		let mut seen = std::collections::HashSet::new();
		for spec in CATALOG {
			assert!(seen.insert(spec.name), "duplicate catalog entry {}", spec.name);
		}
		assert!(!seen.contains(LISTEN_ALIAS));
	}

	#[tokio::test]
	async fn call_dispatches_by_name() {
		let mut registry = CapabilityRegistry::default();
		registry.install("echo", Arc::new(Named("echo"))).unwrap();
		assert_eq!(registry.call("echo", Value::Null).await.unwrap(), Value::from("echo"));
		assert!(matches!(registry.call("nope", Value::Null).await, Err(CapabilityError::Unknown(_))));
	}

	#[test]
	fn str_arg_rejects_missing_and_empty() {
		let args = serde_json::json!({"body": "", "threadID": "42"});
		assert_eq!(str_arg("sendMessage", &args, "threadID").unwrap(), "42");
		assert!(str_arg("sendMessage", &args, "body").is_err());
		assert!(str_arg("sendMessage", &args, "missing").is_err());
	}
}
