//! Import cycle engine.
//!
//! This module provides the `ImportCycle` which coordinates:
//! - Fetching: pulling `(payload, count)` batches from a `Getter`
//! - Storing: persisting each payload through a `Storer`, at most
//!   `concurrent_count` at a time
//! - Finishing: deciding the final status, notifying a `Notifier` once and
//!   persisting the status document
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fetchcycle_core::cycle::{CycleConfig, ImportCycle};
//! use fetchcycle_core::{HttpGetter, HttpStorer, NoopNotifier, SqliteStatusStore};
//!
//! let cycle = ImportCycle::new(
//!     "vehicle",
//!     tenant_id,
//!     CycleConfig::default(),
//!     Arc::new(HttpGetter::new(source_config, tenant_id)?),
//!     Arc::new(HttpStorer::new(sink_config)?),
//!     Arc::new(NoopNotifier),
//!     Arc::new(SqliteStatusStore::in_memory()?),
//! );
//!
//! println!("started run {}", cycle.fetch_id());
//! let document = cycle.run().await;
//! println!("finished with {}", document.status);
//! ```

mod config;
mod error;
mod pool;
mod runner;
mod traits;

pub use config::CycleConfig;
pub use error::{error_chain, FetchError, NotifyError, StoreError};
pub use pool::BoundedTaskPool;
pub use runner::ImportCycle;
pub use traits::{FetchBatch, FetchStream, Getter, Notifier, Storer};
