//! Correlation Ranking
//!
//! Ranks signal pairs by how strongly they move together from one logged day
//! to the next. For each pair, the days where both signals were recorded are
//! taken in date order and their day-over-day deltas compared:
//!
//! ```text
//! strength = |Σ Δa·Δb| / sqrt(Σ Δa² · Σ Δb²)      ∈ [0, 1]
//! ```
//!
//! This is a heuristic. The output is directional evidence from the user's
//! own log and is always presented with [`DISCLAIMER`].

use crate::insights::signals::Signal;
use crate::snapshot::DaySnapshot;
use serde::Serialize;

/// Shown alongside every ranking
pub const DISCLAIMER: &str =
    "These patterns are directional evidence from your own logs, not a diagnosis.";

/// Minimum days needed before any pair can be compared
pub const MIN_DAYS: usize = 2;

/// Whether the two signals tend to rise together or move apart
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
    /// At least one signal never changed
    Flat,
}

/// Co-movement strength for one signal pair
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignalPair {
    pub a: Signal,
    pub b: Signal,
    /// 0 to 1, rounded to two decimals
    pub strength: f64,
    pub direction: Direction,
    /// Number of day-over-day deltas used
    pub sample_size: usize,
}

impl SignalPair {
    /// Human-readable strength: "strong", "moderate", "weak", "negligible"
    pub fn strength_label(&self) -> &'static str {
        strength_label(self.strength)
    }

    /// Display label ("Pain & Sleep hours")
    pub fn label(&self) -> String {
        format!("{} & {}", self.a.label(), self.b.label())
    }
}

/// Result of ranking a window of days
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationRanking {
    /// Fewer than two days to compare
    InsufficientData { days_available: usize },
    /// Pairs ranked strongest first
    Ranked { pairs: Vec<SignalPair>, days_used: usize },
}

impl CorrelationRanking {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, CorrelationRanking::InsufficientData { .. })
    }

    /// Ranked pairs, empty when there was not enough data
    pub fn pairs(&self) -> &[SignalPair] {
        match self {
            CorrelationRanking::InsufficientData { .. } => &[],
            CorrelationRanking::Ranked { pairs, .. } => pairs,
        }
    }

    pub fn strongest(&self) -> Option<&SignalPair> {
        self.pairs().first()
    }
}

/// Rank every signal pair over the given days.
///
/// Input order does not matter; days are compared in date order. Ties in
/// strength put the pair computed later first, so the ranking is fully
/// deterministic.
pub fn rank_correlations(history: &[DaySnapshot]) -> CorrelationRanking {
    let mut days: Vec<&DaySnapshot> = history.iter().collect();
    days.sort_by_key(|d| d.date);

    if days.len() < MIN_DAYS {
        return CorrelationRanking::InsufficientData {
            days_available: days.len(),
        };
    }

    let signals = Signal::all();
    let series: Vec<Vec<Option<f64>>> = signals
        .iter()
        .map(|s| days.iter().map(|d| s.value(d)).collect())
        .collect();

    // Computation order is the canonical pair order
    let mut computed: Vec<SignalPair> = Vec::new();
    for i in 0..signals.len() {
        for j in (i + 1)..signals.len() {
            let (da, db) = paired_deltas(&series[i], &series[j]);
            if da.is_empty() {
                continue;
            }

            let r = co_movement(&da, &db);
            let direction = if r > 0.0 {
                Direction::Positive
            } else if r < 0.0 {
                Direction::Negative
            } else {
                Direction::Flat
            };

            computed.push(SignalPair {
                a: signals[i],
                b: signals[j],
                strength: (r.abs() * 100.0).round() / 100.0,
                direction,
                sample_size: da.len(),
            });
        }
    }

    let mut ranked: Vec<(usize, SignalPair)> = computed.into_iter().enumerate().collect();
    ranked.sort_by(|(ia, a), (ib, b)| b.strength.total_cmp(&a.strength).then(ib.cmp(ia)));

    CorrelationRanking::Ranked {
        pairs: ranked.into_iter().map(|(_, p)| p).collect(),
        days_used: days.len(),
    }
}

/// Day-over-day deltas over the days where both signals are present
fn paired_deltas(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    let joint: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    joint
        .windows(2)
        .map(|w| (w[1].0 - w[0].0, w[1].1 - w[0].1))
        .unzip()
}

/// Signed co-movement of two delta series in [-1, 1].
///
/// Returns 0 when either series never moves.
pub fn co_movement(da: &[f64], db: &[f64]) -> f64 {
    if da.len() != db.len() || da.is_empty() {
        return 0.0;
    }

    let dot: f64 = da.iter().zip(db.iter()).map(|(x, y)| x * y).sum();
    let ss_a: f64 = da.iter().map(|x| x * x).sum();
    let ss_b: f64 = db.iter().map(|y| y * y).sum();

    let denominator = (ss_a * ss_b).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (dot / denominator).clamp(-1.0, 1.0)
    }
}

fn strength_label(strength: f64) -> &'static str {
    if strength > 0.7 {
        "strong"
    } else if strength > 0.5 {
        "moderate"
    } else if strength > 0.3 {
        "weak"
    } else {
        "negligible"
    }
}
