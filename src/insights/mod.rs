//! Aggregation Engine
//!
//! Pure, deterministic metrics derived from day snapshots:
//!
//! - **adherence**: taken / total doses, with a no-doses sentinel
//! - **signals**: per-day signal extraction (mood, energy, pain, sleep, ...)
//! - **score**: composite 0-100 day score
//! - **correlation**: signal-pair co-movement ranking
//! - **summary**: weekly summary numbers
//! - **report**: the combined insight report and its memo
//!
//! Nothing here is persisted. Every number is recomputed from snapshots so two
//! screens reading the same history always show the same values.

pub mod adherence;
pub mod correlation;
pub mod report;
pub mod score;
pub mod signals;
pub mod summary;

pub use adherence::{adherence, adherence_over, Adherence};
pub use correlation::{rank_correlations, CorrelationRanking, Direction, SignalPair, DISCLAIMER};
pub use report::{build_report, window_bounds, InsightReport, InsightSettings, InsightsMemo};
pub use score::{day_score, score_inputs, DayScore, RoundingRule, ScoreInputs};
pub use signals::{mood_level, Signal};
pub use summary::{summarize, Bounds, SummaryOptions, VitalRanges, WeeklySummary};
