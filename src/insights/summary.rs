//! Weekly summary
//!
//! The headline numbers of the insights screen: check-in consistency,
//! stable-vitals days, average sleep, pooled adherence and tough days.

use crate::insights::adherence::{adherence_over, Adherence};
use crate::insights::score::{day_score, RoundingRule};
use crate::snapshot::{DaySnapshot, Vitals};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive normal range for one vital
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The "usual range" for each vital
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalRanges {
    #[serde(default = "default_systolic")]
    pub systolic: Bounds,
    #[serde(default = "default_diastolic")]
    pub diastolic: Bounds,
    #[serde(default = "default_heart_rate")]
    pub heart_rate: Bounds,
    #[serde(default = "default_spo2")]
    pub spo2: Bounds,
    #[serde(default = "default_temperature")]
    pub temperature_c: Bounds,
    #[serde(default = "default_glucose")]
    pub blood_glucose: Bounds,
}

fn default_systolic() -> Bounds {
    Bounds::new(90.0, 140.0)
}

fn default_diastolic() -> Bounds {
    Bounds::new(60.0, 90.0)
}

fn default_heart_rate() -> Bounds {
    Bounds::new(50.0, 100.0)
}

fn default_spo2() -> Bounds {
    Bounds::new(94.0, 100.0)
}

fn default_temperature() -> Bounds {
    Bounds::new(36.0, 37.8)
}

fn default_glucose() -> Bounds {
    Bounds::new(70.0, 180.0)
}

impl Default for VitalRanges {
    fn default() -> Self {
        Self {
            systolic: default_systolic(),
            diastolic: default_diastolic(),
            heart_rate: default_heart_rate(),
            spo2: default_spo2(),
            temperature_c: default_temperature(),
            blood_glucose: default_glucose(),
        }
    }
}

impl VitalRanges {
    /// Whether every measured vital is in range; `None` when nothing was measured
    pub fn is_stable(&self, vitals: &Vitals) -> Option<bool> {
        if vitals.is_empty() {
            return None;
        }

        let checks = [
            (vitals.systolic.map(f64::from), self.systolic),
            (vitals.diastolic.map(f64::from), self.diastolic),
            (vitals.heart_rate.map(f64::from), self.heart_rate),
            (vitals.spo2, self.spo2),
            (vitals.temperature_c, self.temperature_c),
            (vitals.blood_glucose, self.blood_glucose),
        ];

        Some(
            checks
                .iter()
                .all(|(value, bounds)| value.map(|v| bounds.contains(v)).unwrap_or(true)),
        )
    }
}

/// Knobs for the summary
#[derive(Debug, Clone)]
pub struct SummaryOptions<'a> {
    pub rounding: RoundingRule,
    /// Day scores below this count as tough days
    pub tough_day_threshold: u8,
    pub vital_ranges: &'a VitalRanges,
}

/// Summary of a window of days
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_in_window: u32,
    /// Days with any snapshot
    pub active_days: usize,
    /// active_days / days_in_window, whole percent
    pub consistency_percent: u8,
    pub stable_vitals_days: usize,
    pub days_with_vitals: usize,
    /// One decimal; `None` when no sleep hours were logged
    pub average_sleep_hours: Option<f64>,
    pub adherence: Adherence,
    pub tough_days: usize,
    /// Days that had enough data for a score
    pub scored_days: usize,
}

/// Summarize the days of `history` that fall in `[start, end]`
pub fn summarize(
    history: &[DaySnapshot],
    start: NaiveDate,
    end: NaiveDate,
    options: &SummaryOptions<'_>,
) -> WeeklySummary {
    let days: Vec<DaySnapshot> = history
        .iter()
        .filter(|d| d.date >= start && d.date <= end)
        .cloned()
        .collect();

    let days_in_window = if end >= start {
        (end - start).num_days() as u32 + 1
    } else {
        0
    };

    let consistency_percent = if days_in_window == 0 {
        0
    } else {
        ((days.len() as f64 / f64::from(days_in_window)) * 100.0).round() as u8
    };

    let mut stable_vitals_days = 0;
    let mut days_with_vitals = 0;
    for vitals in days.iter().filter_map(|d| d.vitals.as_ref()) {
        if let Some(stable) = options.vital_ranges.is_stable(vitals) {
            days_with_vitals += 1;
            if stable {
                stable_vitals_days += 1;
            }
        }
    }

    let sleep: Vec<f64> = days
        .iter()
        .filter_map(|d| d.sleep.as_ref().and_then(|s| s.hours))
        .collect();
    let average_sleep_hours = if sleep.is_empty() {
        None
    } else {
        let avg = sleep.iter().sum::<f64>() / sleep.len() as f64;
        Some((avg * 10.0).round() / 10.0)
    };

    let scores: Vec<u8> = days
        .iter()
        .filter_map(|d| day_score(d, options.rounding).value())
        .collect();
    let tough_days = scores
        .iter()
        .filter(|s| **s < options.tough_day_threshold)
        .count();

    WeeklySummary {
        start,
        end,
        days_in_window,
        active_days: days.len(),
        consistency_percent,
        stable_vitals_days,
        days_with_vitals,
        average_sleep_hours,
        adherence: adherence_over(&days),
        tough_days,
        scored_days: scores.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{CheckIn, DoseStatus, MedicationDose, Sleep};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn options(ranges: &VitalRanges) -> SummaryOptions<'_> {
        SummaryOptions {
            rounding: RoundingRule::default(),
            tough_day_threshold: 40,
            vital_ranges: ranges,
        }
    }

    #[test]
    fn test_vital_stability() {
        let ranges = VitalRanges::default();
        assert_eq!(ranges.is_stable(&Vitals::default()), None);

        let ok = Vitals {
            systolic: Some(118),
            diastolic: Some(76),
            heart_rate: Some(68),
            ..Default::default()
        };
        assert_eq!(ranges.is_stable(&ok), Some(true));

        let high = Vitals {
            systolic: Some(165),
            ..Default::default()
        };
        assert_eq!(ranges.is_stable(&high), Some(false));
    }

    #[test]
    fn test_weekly_summary() {
        let ranges = VitalRanges::default();
        let history = vec![
            DaySnapshot::new(date(1))
                .with_sleep(Sleep {
                    hours: Some(6.0),
                    quality: Some(2),
                })
                .with_medications(vec![
                    MedicationDose::new("a", DoseStatus::Taken),
                    MedicationDose::new("b", DoseStatus::Missed),
                ]),
            DaySnapshot::new(date(3))
                .with_sleep(Sleep {
                    hours: Some(7.5),
                    quality: Some(8),
                })
                .with_vitals(Vitals {
                    heart_rate: Some(72),
                    ..Default::default()
                }),
            DaySnapshot::new(date(5)).with_vitals(Vitals {
                spo2: Some(91.0),
                ..Default::default()
            }),
            // Outside the window
            DaySnapshot::new(date(9)).with_check_in(CheckIn {
                mood: Some(1),
                ..Default::default()
            }),
        ];

        let summary = summarize(&history, date(1), date(7), &options(&ranges));
        assert_eq!(summary.days_in_window, 7);
        assert_eq!(summary.active_days, 3);
        assert_eq!(serde_json::to_value(&summary).unwrap()["active_days"], 3);
        assert_eq!(summary.consistency_percent, 43);
        assert_eq!(summary.days_with_vitals, 2);
        assert_eq!(summary.stable_vitals_days, 1);
        assert_eq!(summary.average_sleep_hours, Some(6.8));
        assert_eq!(summary.adherence, Adherence::Ratio { taken: 1, total: 2 });
        // Day 1 scores 20, day 3 scores 80, day 5 has no score
        assert_eq!(summary.scored_days, 2);
        assert_eq!(summary.tough_days, 1);
    }

    #[test]
    fn test_empty_window() {
        let ranges = VitalRanges::default();
        let summary = summarize(&[], date(1), date(7), &options(&ranges));
        assert_eq!(summary.active_days, 0);
        assert_eq!(summary.consistency_percent, 0);
        assert_eq!(summary.average_sleep_hours, None);
        assert_eq!(summary.adherence, Adherence::NoDosesConfigured);
        assert_eq!(summary.scored_days, 0);
    }
}
