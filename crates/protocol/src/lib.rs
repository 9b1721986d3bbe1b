//! Wire types for msgr session bootstrap.
//!
//! This crate contains the serde-serializable shapes exchanged with callers
//! and persisted on disk: serialized session state ("app state"), credential
//! input, and the recognized option keys accepted by the option validator.
//!
//! Types in this crate are pure data. Behavior lives in `msgr-rs`.

pub mod app_state;
pub mod credentials;
pub mod options;

pub use app_state::*;
pub use credentials::*;
pub use options::*;
