//! Delivery side of the bridge.
//!
//! Chat transports (Telegram, ...) implement [`ChannelOutbound`]. The
//! [`DestinationRegistry`] holds the set of chats that receive every
//! forwarded notification and persists itself through a [`DestinationStore`].

pub mod error;
pub mod gating;
pub mod plugin;
pub mod registry;
pub mod store;
pub mod store_memory;

pub use {
    error::{Error, Result},
    gating::AppAllowlist,
    plugin::{ChannelHealthSnapshot, ChannelOutbound, ChannelStatus},
    registry::DestinationRegistry,
    store::DestinationStore,
    store_memory::InMemoryDestinationStore,
};
