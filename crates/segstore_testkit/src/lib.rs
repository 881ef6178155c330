//! # SegStore Testkit
//!
//! Test utilities for SegStore.
//!
//! This crate provides:
//! - Test fixtures: store helpers, failing backends and tracing setup
//! - Property-based test generators using proptest
//! - A harness that checks store contents against a model
//! - Concurrency stress utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use segstore_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_store() {
//!     let store = TestStore::new();
//!     store.create("orders").await;
//!     store.append("orders", b"event").await;
//!     assert_eq!(store.read_all("orders").await, b"event");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
