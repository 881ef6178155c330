//! # SegStore Core
//!
//! Segment store contract and in-process implementation for SegStore.
//!
//! This crate provides:
//! - The [`SegmentStore`] contract: create, append, read, info, seal,
//!   batch create/merge and delete, all asynchronous
//! - [`Pending`] result handles with per-operation deadlines
//! - Lazy, pull-based [`ReadResult`]s producing [`ReadResultEntry`]s
//! - [`LocalSegmentStore`], which keeps each segment in a pluggable
//!   [`segstore_storage::StorageBackend`]
//!
//! ## Key Invariants
//!
//! - Segment names are unique among existing segments
//! - Accepted append and merge ranges of a segment never overlap
//! - Sealing is irrevocable; sealed segments stay readable
//! - Only sealed batches merge, and a merged batch ceases to exist
//!
//! ## Example
//!
//! ```rust
//! use segstore_core::{LocalSegmentStore, SegmentStore, StoreConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> segstore_core::SegmentResult<()> {
//! let store = LocalSegmentStore::new(StoreConfig::default())?;
//! let timeout = Duration::from_secs(5);
//!
//! store.create_segment("orders", timeout)?.await?;
//! let offset = store.append("orders", "hello".into(), timeout)?.await?;
//! assert_eq!(offset, 0);
//!
//! let length = store.seal_segment("orders", timeout)?.await?;
//! assert_eq!(length, 5);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod pending;
mod read;
mod stats;
mod store;
mod types;

pub use config::StoreConfig;
pub use error::{ErrorKind, SegmentError, SegmentResult};
pub use pending::Pending;
pub use read::{DataEntry, EndOfSegmentEntry, ReadResult, ReadResultEntry, ReadSource, SegmentTail};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{default_backend_factory, BackendFactory, LocalSegmentStore, SegmentStore};
pub use types::SegmentInfo;
