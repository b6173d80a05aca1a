//! Write-boundary validation
//!
//! Every snapshot is checked before it is merged anywhere. A rejected write
//! leaves both the cached and the stored value untouched.

use crate::snapshot::types::{CheckIn, DaySnapshot, MedicationDose, MoodEntry, Sleep, Symptoms, Vitals};
use std::collections::HashSet;
use thiserror::Error;

/// A field value outside its allowed domain
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid field {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

type Checked = Result<(), ValidationError>;

fn in_range_u(field: &str, value: Option<impl Into<u32> + Copy>, min: u32, max: u32) -> Checked {
    if let Some(v) = value {
        let v: u32 = v.into();
        if v < min || v > max {
            return Err(ValidationError::new(
                field,
                format!("{} is outside {}..={}", v, min, max),
            ));
        }
    }
    Ok(())
}

fn in_range_f(field: &str, value: Option<f64>, min: f64, max: f64) -> Checked {
    if let Some(v) = value {
        if !v.is_finite() || v < min || v > max {
            return Err(ValidationError::new(
                field,
                format!("{} is outside {}..={}", v, min, max),
            ));
        }
    }
    Ok(())
}

/// Validate every group present on a snapshot
pub fn validate_snapshot(snapshot: &DaySnapshot) -> Checked {
    if let Some(doses) = &snapshot.medications {
        validate_doses(doses)?;
    }
    if let Some(entries) = &snapshot.mood_entries {
        validate_moods(entries)?;
    }
    if let Some(vitals) = &snapshot.vitals {
        validate_vitals(vitals)?;
    }
    if let Some(symptoms) = &snapshot.symptoms {
        validate_symptoms(symptoms)?;
    }
    if let Some(sleep) = &snapshot.sleep {
        validate_sleep(sleep)?;
    }
    if let Some(check_in) = &snapshot.check_in {
        validate_check_in(check_in)?;
    }
    Ok(())
}

pub fn validate_doses(doses: &[MedicationDose]) -> Checked {
    let mut seen = HashSet::new();
    for dose in doses {
        if dose.id.trim().is_empty() {
            return Err(ValidationError::new("medications.id", "dose id is empty"));
        }
        if !seen.insert(dose.id.as_str()) {
            return Err(ValidationError::new(
                "medications.id",
                format!("duplicate dose id '{}'", dose.id),
            ));
        }
    }
    Ok(())
}

pub fn validate_moods(entries: &[MoodEntry]) -> Checked {
    let mut seen = HashSet::new();
    for entry in entries {
        in_range_u("mood_entries.score", Some(entry.score), 1, 10)?;
        if !seen.insert(entry.id.as_str()) {
            return Err(ValidationError::new(
                "mood_entries.id",
                format!("duplicate mood entry id '{}'", entry.id),
            ));
        }
    }
    Ok(())
}

pub fn validate_vitals(vitals: &Vitals) -> Checked {
    in_range_u("vitals.systolic", vitals.systolic, 50, 260)?;
    in_range_u("vitals.diastolic", vitals.diastolic, 30, 160)?;
    in_range_u("vitals.heart_rate", vitals.heart_rate, 20, 250)?;
    in_range_f("vitals.spo2", vitals.spo2, 50.0, 100.0)?;
    in_range_f("vitals.temperature_c", vitals.temperature_c, 30.0, 45.0)?;
    in_range_f("vitals.blood_glucose", vitals.blood_glucose, 20.0, 600.0)?;

    if let (Some(sys), Some(dia)) = (vitals.systolic, vitals.diastolic) {
        if dia >= sys {
            return Err(ValidationError::new(
                "vitals.diastolic",
                format!("diastolic {} must be below systolic {}", dia, sys),
            ));
        }
    }
    Ok(())
}

pub fn validate_symptoms(symptoms: &Symptoms) -> Checked {
    in_range_u("symptoms.intensity", symptoms.intensity, 1, 5)?;
    if symptoms.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::new("symptoms.tags", "empty symptom tag"));
    }
    Ok(())
}

pub fn validate_sleep(sleep: &Sleep) -> Checked {
    in_range_f("sleep.hours", sleep.hours, 0.0, 24.0)?;
    in_range_u("sleep.quality", sleep.quality, 0, 10)
}

pub fn validate_check_in(check_in: &CheckIn) -> Checked {
    in_range_u("check_in.mood", check_in.mood, 0, 10)?;
    in_range_u("check_in.energy", check_in.energy, 0, 10)?;
    in_range_u("check_in.pain", check_in.pain, 0, 10)
}
