//! Session bootstrap and capability registry for an unofficial messaging web client.
//!
//! [`login`] turns stored session state (or credentials) into an [`Api`]: it
//! establishes the session over HTTP, scrapes the per-session protocol
//! parameters from the landing page, builds the shared [`SessionContext`],
//! and assembles the capability registry on top of it.

pub mod api;
pub mod capability;
pub mod config;
pub mod context;
pub mod cookies;
pub mod error;
pub mod establish;
pub mod extract;
pub mod logging;
pub mod login;
pub mod options;
pub mod refresh;
pub mod request;
pub mod sync;
pub mod transport;

pub use api::Api;
pub use capability::{CATALOG, Capability, CapabilityRegistry, CapabilitySpec};
pub use config::{AppConfig, ReconnectConfig};
pub use context::SessionContext;
pub use cookies::SessionCookies;
pub use error::{CapabilityError, ConfigLoadError, LoginError, RefreshError, Result};
pub use establish::LoginInput;
pub use login::{DEFAULT_BASE_URL, LoginOptions, login};
pub use msgr_protocol::{AppStateCookie, AppStateInput, Credentials};
pub use options::Settings;
pub use sync::{JsonFileSink, SessionSink, SessionSnapshot};
