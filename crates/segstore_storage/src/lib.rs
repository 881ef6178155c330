//! # SegStore Storage
//!
//! Storage backend trait and implementations for SegStore.
//!
//! Each segment owned by a segment store keeps its bytes in one storage
//! backend. Backends never interpret the bytes and know nothing about
//! batches or read results.
//!
//! ## Backends
//!
//! - append-only; bytes never move once written and there is no truncation
//! - sealing is final and refuses later appends
//! - reads and appends move [`bytes::Bytes`], so an in-memory backend serves
//!   reads as slices of what was appended
//! - `Send + Sync`, so a store can drive them from its blocking pool
//!
//! [`InMemoryBackend`] is the only backend shipped here.
//!
//! ```rust
//! use bytes::Bytes;
//! use segstore_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(Bytes::from_static(b"hello world")).unwrap();
//! backend.seal().unwrap();
//! assert_eq!(&backend.read(offset + 6, 5).unwrap()[..], b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
