//! Offline support.
//!
//! When offline mode is on, writes that fail because the network is
//! unreachable are captured as [`QueuedOperation`]s instead of being lost.
//! They live only in process memory and are replayed in order by
//! [`DocbaseClient::flush`](crate::DocbaseClient::flush).

pub mod queue;

pub use queue::{OfflineQueue, QueuedOperation, ResponseCheck};
