//! Page-side API access.
//!
//! - `client`: `ApiClient::handle_api_call` with offline fallback
//! - `error`: API error classification
//! - `offline`: Queue of calls made while offline, and their replay
//! - `transport`: The `Transport` seam and its `Network`-backed implementation

pub mod client;
pub mod error;
pub mod offline;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use offline::{OfflineQueue, PendingAction, ReplaySummary};
pub use transport::{NetworkTransport, RequestOptions, Transport};
