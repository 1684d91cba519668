//! Remote store adapters.
//!
//! The [`RemoteStore`] trait translates domain operations into calls against
//! the trip service. Two implementations are provided:
//!
//! - [`HttpStore`]: JSON over HTTP via reqwest
//! - [`MemoryStore`]: in-process fixtures, injected per test or demo
//!
//! Adapters own no cache state; caching is the job of
//! [`EntityCache`](crate::cache::EntityCache).

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::HttpStore;
pub use error::StoreError;
pub use memory::{MemoryStore, StoreOp};
pub use store::{RemoteStore, StoreResult};
