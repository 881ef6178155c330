//! # SegStore Client
//!
//! Client-side reading for SegStore.
//!
//! This crate provides:
//! - The [`Orderer`], which picks the next segment a reader should read
//!   from, preferring segments with buffered data while guaranteeing every
//!   segment is serviced
//! - The [`SegmentReader`] capability trait the orderer works against
//! - [`SegmentInputStream`], a buffered, prefetching reader over one segment
//! - [`EventReader`], which multiplexes several input streams
//! - [`StreamConfiguration`], the passive settings record of a stream
//!
//! ## Read Flow
//!
//! ```text
//! EventReader::read_next()
//!     ↓
//! Orderer::next_index()      ← ready streams first, prefetch the rest
//!     ↓
//! SegmentInputStream::read() ← buffered bytes, or wait for the fill task
//!     ↓
//! SegmentStore::read()       ← ReadResult entries → content
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod input_stream;
mod orderer;
mod reader;

pub use config::{NotedTime, ReaderConfig, RetentionPolicy, ScaleType, ScalingPolicy, StreamConfiguration};
pub use error::{ClientError, ClientResult};
pub use input_stream::{SegmentChunk, SegmentInputStream};
pub use orderer::{Orderer, SegmentReader};
pub use reader::EventReader;
