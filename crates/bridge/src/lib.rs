//! The bridge core.
//!
//! [`StreamSupervisor`] keeps a Gotify stream open and hands every message to
//! the [`Dispatcher`], which resolves the sending application through the
//! [`ApplicationDirectory`], applies the allow-list, and delivers the
//! formatted text to every destination in the registry. [`Bridge`] owns the
//! supervisor task and exposes the host lifecycle hooks.

pub mod bridge;
pub mod command;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod store;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    bridge::{Bridge, BridgeSettings},
    command::register_origin,
    directory::ApplicationDirectory,
    dispatcher::{DispatchOutcome, Dispatcher, format_notification},
    error::{Error, Result},
    store::ConfigDestinationStore,
    supervisor::{StreamSupervisor, SupervisorState},
};
