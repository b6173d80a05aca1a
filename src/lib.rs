//! # EmberMate
//!
//! Daily health record store and derived insights engine. One durable,
//! structured snapshot per calendar day (medication doses, mood, vitals,
//! symptoms, sleep, check-in sliders) and explainable metrics computed from
//! that history.
//!
//! ## Features
//!
//! - **Per-day identity**: exactly one snapshot per date, created lazily
//! - **Partial updates**: field groups merge independently, last writer wins per group
//! - **Durability**: SQLite with WAL and full sync, CRC32 per stored group
//! - **Session cache**: read-your-writes in memory, background flush with retry
//! - **Insights**: adherence, day score, correlation ranking, weekly summary
//!
//! ## Modules
//!
//! - [`snapshot`]: The day snapshot model and validation
//! - [`storage`]: Durable record store
//! - [`session`]: In-memory write-through cache
//! - [`insights`]: Derived metrics
//! - [`config`]: Configuration loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use embermate::insights::{InsightSettings, InsightsMemo};
//! use embermate::session::{SessionCache, SessionConfig};
//! use embermate::snapshot::{CheckIn, DoseStatus, MedicationDose};
//! use embermate::storage::{RecordStore, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::open(StoreConfig::new("./data")).await?;
//!     let cache = Arc::new(SessionCache::new(Arc::new(store), SessionConfig::default()));
//!
//!     let today = chrono::Local::now().date_naive();
//!     cache
//!         .set_medications(today, vec![MedicationDose::new("morning", DoseStatus::Planned)])
//!         .await?;
//!     cache.set_dose_status(today, "morning", DoseStatus::Taken).await?;
//!     cache
//!         .set_check_in(today, CheckIn { mood: Some(7), energy: Some(6), pain: Some(2) })
//!         .await?;
//!
//!     let mut memo = InsightsMemo::new(InsightSettings::default());
//!     let report = memo.report(&*cache, today).await?;
//!     println!("Day score: {}", report.day_score);
//!     println!("Adherence: {}", report.adherence);
//!
//!     cache.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dates;
pub mod export;
pub mod insights;
pub mod session;
pub mod snapshot;
pub mod storage;

// Re-export top-level types for convenience
pub use snapshot::{
    CheckIn, DaySnapshot, DoseStatus, FieldGroup, MedicationDose, MoodEntry, Sleep, Symptoms,
    ValidationError, Vitals,
};

pub use storage::{DayGroups, DayStore, History, RecordStore, StoreConfig, StoreError, StoreResult, StoreStats};

pub use session::{FlushState, SessionCache, SessionConfig, SessionError, SessionResult};

pub use insights::{
    Adherence, CorrelationRanking, DayScore, InsightReport, InsightSettings, InsightsMemo,
    RoundingRule, WeeklySummary,
};

pub use config::{Config, ConfigError, LoggingConfig};
