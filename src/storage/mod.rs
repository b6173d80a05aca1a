//! EmberMate Record Store
//!
//! This module provides durable per-day persistence:
//!
//! - **codec**: per-field-group payload encoding with CRC32 checksums
//! - **store**: SQLite-backed `RecordStore` and the `DayStore` trait
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   DaySnapshot → validate → encode present groups → one transaction (fsync)
//!
//! Read Path:
//!   Date range → rows → verify checksum → decode group → DaySnapshot
//!                                    └─ failure → CorruptRecord for that day only
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use embermate::snapshot::{DaySnapshot, DoseStatus, MedicationDose};
//! use embermate::storage::{RecordStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::open(StoreConfig::new("./data")).await?;
//!     let date = "2025-01-01".parse()?;
//!
//!     store
//!         .upsert(&DaySnapshot::new(date).with_medications(vec![
//!             MedicationDose::new("morning", DoseStatus::Taken),
//!         ]))
//!         .await?;
//!
//!     let day = store.get(date).await?;
//!     assert!(day.is_some());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod store;

pub use codec::{checksum, EncodedGroup};
pub use error::{StoreError, StoreResult};
pub use store::{DayGroups, DayStore, History, RecordStore, StoreConfig, StoreStats};
