//! Composite day score
//!
//! Signals are normalized to 0-10 (pain inverted), averaged over the ones
//! present, scaled ×10 and rounded onto 0-100.

use crate::insights::signals::{mood_level, Signal};
use crate::snapshot::DaySnapshot;
use serde::{Deserialize, Serialize};

/// How the scaled average is rounded to an integer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// 40.5 → 41, 41.5 → 42
    HalfAwayFromZero,
    /// 40.5 → 40, 41.5 → 42
    HalfToEven,
    /// 40.9 → 40
    Floor,
}

impl Default for RoundingRule {
    fn default() -> Self {
        RoundingRule::HalfAwayFromZero
    }
}

impl RoundingRule {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            RoundingRule::HalfAwayFromZero => x.round(),
            RoundingRule::HalfToEven => {
                if (x - x.trunc()).abs() == 0.5 {
                    2.0 * (x / 2.0).round()
                } else {
                    x.round()
                }
            }
            RoundingRule::Floor => x.floor(),
        }
    }
}

/// The normalized inputs to a day score, each on 0-10
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub mood: Option<f64>,
    pub energy: Option<f64>,
    /// Raw pain; inverted when scored
    pub pain: Option<f64>,
    pub sleep_quality: Option<f64>,
}

impl ScoreInputs {
    pub fn from_snapshot(snapshot: &DaySnapshot) -> Self {
        Self {
            mood: mood_level(snapshot),
            energy: Signal::Energy.value(snapshot),
            pain: Signal::Pain.value(snapshot),
            sleep_quality: Signal::SleepQuality.value(snapshot),
        }
    }

    /// Present signals, higher is better
    pub fn normalized(&self) -> Vec<f64> {
        [
            self.mood,
            self.energy,
            self.pain.map(|p| 10.0 - p),
            self.sleep_quality,
        ]
        .into_iter()
        .flatten()
        .map(|v| v.clamp(0.0, 10.0))
        .collect()
    }
}

/// A day's composite score
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayScore {
    /// No signal recorded; show "not enough data", never zero
    NotEnoughData,
    Score { value: u8, signals_used: usize },
}

impl DayScore {
    pub fn value(&self) -> Option<u8> {
        match self {
            DayScore::NotEnoughData => None,
            DayScore::Score { value, .. } => Some(*value),
        }
    }
}

impl std::fmt::Display for DayScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayScore::NotEnoughData => write!(f, "not enough data"),
            DayScore::Score { value, signals_used } => {
                write!(f, "{}/100 (from {} of 4 signals)", value, signals_used)
            }
        }
    }
}

/// Score from explicit inputs
pub fn score_inputs(inputs: &ScoreInputs, rule: RoundingRule) -> DayScore {
    let values = inputs.normalized();
    if values.is_empty() {
        return DayScore::NotEnoughData;
    }

    let average = values.iter().sum::<f64>() / values.len() as f64;
    let value = rule.apply(average * 10.0).clamp(0.0, 100.0) as u8;
    DayScore::Score {
        value,
        signals_used: values.len(),
    }
}

/// Score for one day
pub fn day_score(snapshot: &DaySnapshot, rule: RoundingRule) -> DayScore {
    score_inputs(&ScoreInputs::from_snapshot(snapshot), rule)
}
