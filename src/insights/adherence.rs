//! Medication adherence

use crate::snapshot::{DaySnapshot, DoseStatus};
use serde::Serialize;

/// Fraction of scheduled doses marked taken.
///
/// `NoDosesConfigured` is a distinct case, not 0%: callers must branch on it
/// and show a "not enough data" state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Adherence {
    NoDosesConfigured,
    Ratio { taken: usize, total: usize },
}

impl Adherence {
    fn from_counts(taken: usize, total: usize) -> Self {
        if total == 0 {
            Adherence::NoDosesConfigured
        } else {
            Adherence::Ratio { taken, total }
        }
    }

    /// Taken / total, `None` when no doses are configured
    pub fn fraction(&self) -> Option<f64> {
        match *self {
            Adherence::NoDosesConfigured => None,
            Adherence::Ratio { taken, total } => Some(taken as f64 / total as f64),
        }
    }

    /// Whole percent, rounded half away from zero
    pub fn percent(&self) -> Option<u8> {
        self.fraction().map(|f| (f * 100.0).round() as u8)
    }
}

impl std::fmt::Display for Adherence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Adherence::NoDosesConfigured => write!(f, "no doses configured"),
            Adherence::Ratio { taken, total } => {
                write!(f, "{}/{} taken ({}%)", taken, total, self.percent().unwrap_or(0))
            }
        }
    }
}

fn count(doses: &[crate::snapshot::MedicationDose]) -> (usize, usize) {
    let taken = doses.iter().filter(|d| d.status == DoseStatus::Taken).count();
    (taken, doses.len())
}

/// Adherence for one day
pub fn adherence(snapshot: &DaySnapshot) -> Adherence {
    let (taken, total) = count(snapshot.doses());
    Adherence::from_counts(taken, total)
}

/// Adherence pooled over every dose in a window
pub fn adherence_over(days: &[DaySnapshot]) -> Adherence {
    let (taken, total) = days
        .iter()
        .map(|d| count(d.doses()))
        .fold((0, 0), |(t, n), (dt, dn)| (t + dt, n + dn));
    Adherence::from_counts(taken, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MedicationDose;
    use chrono::NaiveDate;

    fn day(d: u32) -> DaySnapshot {
        DaySnapshot::new(NaiveDate::from_ymd_opt(2025, 1, d).unwrap())
    }

    #[test]
    fn test_no_doses_is_sentinel() {
        let a = adherence(&day(1));
        assert_eq!(a, Adherence::NoDosesConfigured);
        assert_eq!(a.fraction(), None);
        assert_eq!(a.percent(), None);

        // An explicitly empty schedule is still "no doses"
        let a = adherence(&day(1).with_medications(vec![]));
        assert_eq!(a, Adherence::NoDosesConfigured);
    }

    #[test]
    fn test_ratio() {
        let snap = day(1).with_medications(vec![
            MedicationDose::new("morning", DoseStatus::Taken),
            MedicationDose::new("afternoon", DoseStatus::Planned),
            MedicationDose::new("evening", DoseStatus::Missed),
        ]);
        let a = adherence(&snap);
        assert_eq!(a, Adherence::Ratio { taken: 1, total: 3 });
        assert_eq!(a.percent(), Some(33));
        assert_eq!(a.to_string(), "1/3 taken (33%)");
    }

    #[test]
    fn test_pooled_over_window() {
        let days = vec![
            day(1).with_medications(vec![
                MedicationDose::new("a", DoseStatus::Taken),
                MedicationDose::new("b", DoseStatus::Taken),
            ]),
            day(2),
            day(3).with_medications(vec![
                MedicationDose::new("a", DoseStatus::Missed),
                MedicationDose::new("b", DoseStatus::Taken),
            ]),
        ];
        let a = adherence_over(&days);
        assert_eq!(a, Adherence::Ratio { taken: 3, total: 4 });
        assert_eq!(a.percent(), Some(75));
        assert_eq!(adherence_over(&[]), Adherence::NoDosesConfigured);
    }
}
