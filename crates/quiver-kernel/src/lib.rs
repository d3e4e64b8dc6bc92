#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

//! Quiver Kernel - the facade front ends talk to.
//!
//! [`ScriptManager`] ties the pieces together:
//!
//! ```text
//! ScriptWatcher → apply task → ScriptRegistry (RwLock) ← list / get / validate
//!                                     │
//!                                     ├── RegistryEvents → subscribers
//!                                     │
//! run(path) → gate (SessionAcknowledgments) → ExecutionEngine → RunHandle
//! ```
//!
//! Watcher events are applied by one task, in order. Each script has at most
//! one active run.

mod error;
mod example;
mod manager;
mod runs;
mod settings;
mod subscription;
mod watch;

pub use error::{KernelError, KernelResult};
pub use example::{EXAMPLE_FILE_NAME, EXAMPLE_SCRIPT};
pub use manager::ScriptManager;
pub use runs::RunHandle;
pub use settings::ManagerConfig;
pub use subscription::{ChangeCallback, SubscriptionHandle};
pub use watch::WatchHandle;
