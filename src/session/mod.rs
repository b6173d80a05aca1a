//! Session Cache
//!
//! In-memory working copy of recent days, flushed to a `DayStore` in the
//! background:
//!
//! - **cache**: `SessionCache`, per-date flush state and retry policy
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use embermate::session::{SessionCache, SessionConfig};
//! use embermate::snapshot::Sleep;
//! use embermate::storage::{RecordStore, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::open(StoreConfig::new("./data")).await?;
//!     let cache = Arc::new(SessionCache::new(Arc::new(store), SessionConfig::default()));
//!     let flusher = cache.start_background_flush();
//!
//!     let date = "2025-01-01".parse()?;
//!     cache.set_sleep(date, Sleep { hours: Some(7.5), quality: Some(8) }).await?;
//!     assert!(cache.get(date).await?.is_some());
//!
//!     cache.shutdown().await?;
//!     flusher.await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;

pub use cache::{FlushEvent, FlushOutcome, FlushReport, FlushState, SessionCache, SessionConfig};
pub use error::{SessionError, SessionResult};
