//! Per-day signal extraction
//!
//! Every signal is read from one snapshot and is `None` when the day did not
//! record it. Missing is never treated as zero.

use crate::insights::adherence::adherence;
use crate::snapshot::DaySnapshot;
use serde::Serialize;

/// A wellness signal that can be read from a day
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Mood,
    Energy,
    Pain,
    SleepHours,
    SleepQuality,
    SymptomIntensity,
    Adherence,
}

impl Signal {
    /// All signals in the order pairs are computed
    pub fn all() -> &'static [Signal] {
        &[
            Signal::Mood,
            Signal::Energy,
            Signal::Pain,
            Signal::SleepHours,
            Signal::SleepQuality,
            Signal::SymptomIntensity,
            Signal::Adherence,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::Mood => "Mood",
            Signal::Energy => "Energy",
            Signal::Pain => "Pain",
            Signal::SleepHours => "Sleep hours",
            Signal::SleepQuality => "Sleep quality",
            Signal::SymptomIntensity => "Symptom intensity",
            Signal::Adherence => "Medication adherence",
        }
    }

    /// Raw value of this signal for a day
    pub fn value(&self, snapshot: &DaySnapshot) -> Option<f64> {
        match self {
            Signal::Mood => mood_level(snapshot),
            Signal::Energy => snapshot
                .check_in
                .as_ref()
                .and_then(|c| c.energy)
                .map(f64::from),
            Signal::Pain => snapshot
                .check_in
                .as_ref()
                .and_then(|c| c.pain)
                .map(f64::from),
            Signal::SleepHours => snapshot.sleep.as_ref().and_then(|s| s.hours),
            Signal::SleepQuality => snapshot
                .sleep
                .as_ref()
                .and_then(|s| s.quality)
                .map(f64::from),
            Signal::SymptomIntensity => snapshot
                .symptoms
                .as_ref()
                .and_then(|s| s.intensity)
                .map(f64::from),
            Signal::Adherence => adherence(snapshot).fraction(),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Mood on a 0-10 scale: the check-in slider when set, otherwise the mean of
/// the day's mood entries.
pub fn mood_level(snapshot: &DaySnapshot) -> Option<f64> {
    if let Some(mood) = snapshot.check_in.as_ref().and_then(|c| c.mood) {
        return Some(f64::from(mood));
    }

    let moods = snapshot.moods();
    if moods.is_empty() {
        return None;
    }
    let sum: f64 = moods.iter().map(|m| f64::from(m.score)).sum();
    Some(sum / moods.len() as f64)
}
