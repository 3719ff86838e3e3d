//! Client side of the synchronization protocol.
//!
//! A [`Mirror`] holds a local copy of the roster and replays broadcast events
//! onto it. A [`Synchronizer`] adds optimistic intents and the connection
//! lifecycle on top, and [`ApiClient`] issues the REST mutations.

mod api;
mod mirror;
mod synchronizer;

pub use api::*;
pub use mirror::*;
pub use synchronizer::*;
