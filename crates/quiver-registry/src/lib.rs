//! Quiver Registry - the catalog of discovered scripts.
//!
//! This crate provides:
//! - [`ScriptRegistry`]: scripts keyed by normalized path, with lazily cached
//!   screening verdicts and the run gate
//! - Discovery of script files in configured directories
//! - [`RegistryEvents`]: a broadcast bus announcing catalog changes
//! - [`ScriptWatcher`]: debounced, hash-verified filesystem watching
//!
//! The watcher only reports changes. Applying them to the registry is left
//! to the owner of both, so that updates happen in one place and in order.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod discovery;
pub mod error;
pub mod events;
pub mod registry;
pub mod watcher;

pub use discovery::{DiscoveryOptions, find_scripts};
pub use error::{RegistryError, RegistryResult, WatchError, WatchResult};
pub use events::{RegistryEvent, RegistryEventReceiver, RegistryEvents};
pub use registry::{DiscoveryReport, ScriptRegistry, ToolbarItem};
pub use watcher::{DEFAULT_DEBOUNCE, ScriptWatcher, WatchEvent, WatcherConfig};
