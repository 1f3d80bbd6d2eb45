//! Gotify client for herald.
//!
//! Exposes the two server operations the bridge consumes, fetching the
//! application list and opening the live message stream, behind the
//! [`NotificationSource`] trait so the bridge can be driven by fakes in tests.

pub mod client;
pub mod error;
pub mod source;
pub mod types;

pub use {
    client::GotifyClient,
    error::{Error, Result},
    source::{EventStream, NotificationSource},
    types::{Application, Health, NotificationEvent},
};
