//! Insight report and memoization
//!
//! A report bundles everything the insights screen shows for one date. It is
//! recomputed from snapshots, never persisted. `InsightsMemo` keeps the last
//! report and drops it when a write lands inside its window.

use crate::insights::adherence::{adherence, Adherence};
use crate::insights::correlation::{rank_correlations, CorrelationRanking, DISCLAIMER};
use crate::insights::score::{day_score, DayScore, RoundingRule};
use crate::insights::summary::{summarize, SummaryOptions, VitalRanges, WeeklySummary};
use crate::snapshot::DaySnapshot;
use crate::storage::{DayStore, History, StoreResult};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Tunables for the aggregation engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightSettings {
    /// Days considered by the correlation ranking
    #[serde(default = "default_correlation_window")]
    pub correlation_window_days: u32,

    /// Days covered by the weekly summary
    #[serde(default = "default_summary_window")]
    pub summary_window_days: u32,

    #[serde(default)]
    pub rounding: RoundingRule,

    /// Day scores below this count as tough days
    #[serde(default = "default_tough_day_threshold")]
    pub tough_day_threshold: u8,

    #[serde(default)]
    pub vital_ranges: VitalRanges,
}

fn default_correlation_window() -> u32 {
    14
}

fn default_summary_window() -> u32 {
    7
}

fn default_tough_day_threshold() -> u8 {
    40
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            correlation_window_days: default_correlation_window(),
            summary_window_days: default_summary_window(),
            rounding: RoundingRule::default(),
            tough_day_threshold: default_tough_day_threshold(),
            vital_ranges: VitalRanges::default(),
        }
    }
}

impl InsightSettings {
    /// Window large enough for every part of the report
    pub fn report_window(&self, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        window_bounds(
            end,
            self.correlation_window_days.max(self.summary_window_days),
        )
    }
}

/// Inclusive `[start, end]` covering `days` calendar days ending at `end`
pub fn window_bounds(end: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let back = u64::from(days.max(1) - 1);
    let start = end.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Everything derived for one date
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InsightReport {
    pub date: NaiveDate,
    pub day_score: DayScore,
    pub adherence: Adherence,
    pub correlations: CorrelationRanking,
    pub summary: WeeklySummary,
    /// Days in the window left out because their record was corrupt
    pub skipped_days: Vec<NaiveDate>,
    pub disclaimer: &'static str,
}

/// Build a report for `date` from a history covering its window
pub fn build_report(history: &History, date: NaiveDate, settings: &InsightSettings) -> InsightReport {
    let today = history.day(date);

    let (day_score, adherence) = match today {
        Some(snapshot) => (day_score(snapshot, settings.rounding), adherence(snapshot)),
        None => (DayScore::NotEnoughData, Adherence::NoDosesConfigured),
    };

    let correlations = rank_correlations(&in_window(
        &history.days,
        window_bounds(date, settings.correlation_window_days),
    ));

    let (start, end) = window_bounds(date, settings.summary_window_days);
    let summary = summarize(
        &history.days,
        start,
        end,
        &SummaryOptions {
            rounding: settings.rounding,
            tough_day_threshold: settings.tough_day_threshold,
            vital_ranges: &settings.vital_ranges,
        },
    );

    InsightReport {
        date,
        day_score,
        adherence,
        correlations,
        summary,
        skipped_days: history.skipped_dates(),
        disclaimer: DISCLAIMER,
    }
}

fn in_window(days: &[DaySnapshot], (start, end): (NaiveDate, NaiveDate)) -> Vec<DaySnapshot> {
    days.iter()
        .filter(|d| d.date >= start && d.date <= end)
        .cloned()
        .collect()
}

/// Memoized report for the active window
#[derive(Debug)]
pub struct InsightsMemo {
    settings: InsightSettings,
    cached: Option<InsightReport>,
    window: Option<(NaiveDate, NaiveDate)>,
    computations: u64,
}

impl InsightsMemo {
    pub fn new(settings: InsightSettings) -> Self {
        Self {
            settings,
            cached: None,
            window: None,
            computations: 0,
        }
    }

    /// Report for `date`, recomputed only when the date moved or the window
    /// was invalidated
    pub async fn report<S: DayStore + ?Sized>(
        &mut self,
        store: &S,
        date: NaiveDate,
    ) -> StoreResult<&InsightReport> {
        let window = self.settings.report_window(date);

        let report = match self.cached.take() {
            Some(report) if self.window == Some(window) && report.date == date => report,
            _ => {
                let history = store.range(window.0, window.1).await?;
                self.computations += 1;
                tracing::debug!(date = %date, days = history.len(), "Recomputed insight report");
                build_report(&history, date, &self.settings)
            }
        };

        self.window = Some(window);
        Ok(self.cached.insert(report))
    }

    /// Drop the cached report if `date` falls inside its window.
    ///
    /// Returns whether anything was invalidated.
    pub fn invalidate(&mut self, date: NaiveDate) -> bool {
        match self.window {
            Some((start, end)) if date >= start && date <= end && self.cached.is_some() => {
                self.cached = None;
                true
            }
            _ => false,
        }
    }

    /// How many times a report was actually computed
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn settings(&self) -> &InsightSettings {
        &self.settings
    }
}
