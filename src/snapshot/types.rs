//! Core data types for the day log
//!
//! This module defines the per-day record and its field groups:
//! - `DaySnapshot`: the single structured record for one calendar day
//! - `MedicationDose`, `MoodEntry`: sequence entries
//! - `Vitals`, `Symptoms`, `Sleep`, `CheckIn`: independently optional groups
//! - `FieldGroup`: the unit of merging and persistence

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An independently mergeable section of a day snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Medications,
    Mood,
    Vitals,
    Symptoms,
    Sleep,
    CheckIn,
}

impl FieldGroup {
    /// All groups, in storage order
    pub fn all() -> &'static [FieldGroup] {
        &[
            FieldGroup::Medications,
            FieldGroup::Mood,
            FieldGroup::Vitals,
            FieldGroup::Symptoms,
            FieldGroup::Sleep,
            FieldGroup::CheckIn,
        ]
    }

    /// Stable name used as the storage tag
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Medications => "medications",
            FieldGroup::Mood => "mood",
            FieldGroup::Vitals => "vitals",
            FieldGroup::Symptoms => "symptoms",
            FieldGroup::Sleep => "sleep",
            FieldGroup::CheckIn => "check_in",
        }
    }

    /// Parse a storage tag back into a group
    pub fn from_tag(tag: &str) -> Option<Self> {
        FieldGroup::all().iter().copied().find(|g| g.as_str() == tag)
    }
}

impl std::fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a scheduled dose. Any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Planned,
    Taken,
    Missed,
}

impl std::fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoseStatus::Planned => write!(f, "planned"),
            DoseStatus::Taken => write!(f, "taken"),
            DoseStatus::Missed => write!(f, "missed"),
        }
    }
}

impl std::str::FromStr for DoseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(DoseStatus::Planned),
            "taken" => Ok(DoseStatus::Taken),
            "missed" => Ok(DoseStatus::Missed),
            other => Err(format!("unknown dose status '{}'", other)),
        }
    }
}

/// One scheduled medication dose
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationDose {
    /// Stable id, unique within the day
    pub id: String,
    /// Scheduled label ("Morning meds")
    #[serde(default)]
    pub label: String,
    /// Scheduled time as shown to the user ("8:10 AM")
    #[serde(default)]
    pub time: String,
    pub status: DoseStatus,
}

impl MedicationDose {
    pub fn new(id: impl Into<String>, status: DoseStatus) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            time: String::new(),
            status,
        }
    }

    /// Builder method: set label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builder method: set scheduled time
    pub fn at(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }
}

/// A mood check-in. Score is 1-10.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    pub id: String,
    pub score: u8,
    #[serde(default)]
    pub label: String,
    /// Free-form time-of-day tag ("Morning", "Now")
    #[serde(default)]
    pub time_of_day: String,
}

impl MoodEntry {
    /// Create an entry with a fresh id
    pub fn new(score: u8, label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            score,
            label: label.into(),
            time_of_day: String::new(),
        }
    }

    /// Builder method: set the time-of-day tag
    pub fn time_of_day(mut self, tag: impl Into<String>) -> Self {
        self.time_of_day = tag.into();
        self
    }

    /// Builder method: set an explicit id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Vital signs. Absence means "not measured", never zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vitals {
    /// Systolic pressure in mmHg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<u16>,
    /// Diastolic pressure in mmHg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<u16>,
    /// Heart rate in bpm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u16>,
    /// Blood oxygen saturation in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    /// Body temperature in degrees Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    /// Blood glucose in mg/dL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_glucose: Option<f64>,
}

impl Vitals {
    /// True when no field was measured
    pub fn is_empty(&self) -> bool {
        self.systolic.is_none()
            && self.diastolic.is_none()
            && self.heart_rate.is_none()
            && self.spo2.is_none()
            && self.temperature_c.is_none()
            && self.blood_glucose.is_none()
    }
}

/// Symptom tags with an overall intensity (1-5)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Symptoms {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(default)]
    pub notes: String,
}

impl Symptoms {
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            intensity: None,
            notes: String::new(),
        }
    }

    /// Builder method: set intensity
    pub fn intensity(mut self, intensity: u8) -> Self {
        self.intensity = Some(intensity);
        self
    }

    /// Builder method: set notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Last night's sleep
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sleep {
    /// Hours slept (0-24)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    /// Self-rated quality (0-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

/// Daily slider check-in, each on a 0-10 scale
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckIn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain: Option<u8>,
}

/// The structured health record for one calendar day
///
/// Every field group is optional: `None` means the group was never written
/// for this day, which is different from an empty value. An upsert carrying
/// a snapshot merges only the groups that are `Some`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<MedicationDose>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_entries: Option<Vec<MoodEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Vitals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Symptoms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<Sleep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<CheckIn>,
}

impl DaySnapshot {
    /// Create a snapshot with no field groups
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            medications: None,
            mood_entries: None,
            vitals: None,
            symptoms: None,
            sleep: None,
            check_in: None,
        }
    }

    pub fn with_medications(mut self, doses: Vec<MedicationDose>) -> Self {
        self.medications = Some(doses);
        self
    }

    pub fn with_mood_entries(mut self, entries: Vec<MoodEntry>) -> Self {
        self.mood_entries = Some(entries);
        self
    }

    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = Some(vitals);
        self
    }

    pub fn with_symptoms(mut self, symptoms: Symptoms) -> Self {
        self.symptoms = Some(symptoms);
        self
    }

    pub fn with_sleep(mut self, sleep: Sleep) -> Self {
        self.sleep = Some(sleep);
        self
    }

    pub fn with_check_in(mut self, check_in: CheckIn) -> Self {
        self.check_in = Some(check_in);
        self
    }

    /// Doses for the day, empty when never written
    pub fn doses(&self) -> &[MedicationDose] {
        self.medications.as_deref().unwrap_or(&[])
    }

    /// Mood entries in insertion order, empty when never written
    pub fn moods(&self) -> &[MoodEntry] {
        self.mood_entries.as_deref().unwrap_or(&[])
    }

    /// Mood entries newest first, the way they are displayed
    pub fn moods_newest_first(&self) -> impl Iterator<Item = &MoodEntry> {
        self.moods().iter().rev()
    }

    /// Find a dose by id
    pub fn dose(&self, id: &str) -> Option<&MedicationDose> {
        self.doses().iter().find(|d| d.id == id)
    }

    /// Whether a group has been written
    pub fn has_group(&self, group: FieldGroup) -> bool {
        match group {
            FieldGroup::Medications => self.medications.is_some(),
            FieldGroup::Mood => self.mood_entries.is_some(),
            FieldGroup::Vitals => self.vitals.is_some(),
            FieldGroup::Symptoms => self.symptoms.is_some(),
            FieldGroup::Sleep => self.sleep.is_some(),
            FieldGroup::CheckIn => self.check_in.is_some(),
        }
    }

    /// Groups present on this snapshot, in storage order
    pub fn groups(&self) -> Vec<FieldGroup> {
        FieldGroup::all()
            .iter()
            .copied()
            .filter(|g| self.has_group(*g))
            .collect()
    }

    /// True when no group has been written
    pub fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }

    /// Copy one group from `other`, replacing ours (absent stays absent)
    pub fn copy_group(&mut self, other: &DaySnapshot, group: FieldGroup) {
        match group {
            FieldGroup::Medications => self.medications = other.medications.clone(),
            FieldGroup::Mood => self.mood_entries = other.mood_entries.clone(),
            FieldGroup::Vitals => self.vitals = other.vitals.clone(),
            FieldGroup::Symptoms => self.symptoms = other.symptoms.clone(),
            FieldGroup::Sleep => self.sleep = other.sleep.clone(),
            FieldGroup::CheckIn => self.check_in = other.check_in.clone(),
        }
    }

    /// Merge every group present on `patch` into this snapshot.
    ///
    /// Last writer wins per group: groups the patch does not carry are left
    /// untouched.
    pub fn merge(&mut self, patch: &DaySnapshot) {
        for group in patch.groups() {
            self.copy_group(patch, group);
        }
    }

    /// A snapshot carrying only the listed groups of this one
    pub fn project(&self, groups: impl IntoIterator<Item = FieldGroup>) -> DaySnapshot {
        let mut out = DaySnapshot::new(self.date);
        for group in groups {
            out.copy_group(self, group);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_group_tags_round_trip() {
        for group in FieldGroup::all() {
            assert_eq!(FieldGroup::from_tag(group.as_str()), Some(*group));
        }
        assert_eq!(FieldGroup::from_tag("appointments"), None);
    }

    #[test]
    fn test_merge_replaces_only_present_groups() {
        let mut stored = DaySnapshot::new(day("2025-01-01"))
            .with_medications(vec![MedicationDose::new("m1", DoseStatus::Taken)])
            .with_sleep(Sleep {
                hours: Some(7.5),
                quality: Some(6),
            });

        let patch = DaySnapshot::new(day("2025-01-01"))
            .with_mood_entries(vec![MoodEntry::new(7, "better")])
            .with_sleep(Sleep {
                hours: None,
                quality: Some(8),
            });

        stored.merge(&patch);

        assert_eq!(stored.doses().len(), 1);
        assert_eq!(stored.moods().len(), 1);
        // The sleep group is replaced as a whole
        assert_eq!(stored.sleep.as_ref().unwrap().hours, None);
        assert_eq!(stored.sleep.as_ref().unwrap().quality, Some(8));
    }

    #[test]
    fn test_snapshot_serialization_skips_absent_groups() {
        let snap = DaySnapshot::new(day("2025-01-03"))
            .with_vitals(Vitals {
                heart_rate: Some(72),
                ..Default::default()
            });

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"date\":\"2025-01-03\""));
        assert!(json.contains("\"heart_rate\":72"));
        assert!(!json.contains("medications"));
        assert!(!json.contains("systolic"));

        let back: DaySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_moods_keep_insertion_order() {
        let snap = DaySnapshot::new(day("2025-01-01")).with_mood_entries(vec![
            MoodEntry::new(3, "rough").with_id("a"),
            MoodEntry::new(9, "great").with_id("b"),
            MoodEntry::new(5, "ok").with_id("c"),
        ]);

        let stored: Vec<&str> = snap.moods().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(stored, vec!["a", "b", "c"]);

        let shown: Vec<&str> = snap.moods_newest_first().map(|m| m.id.as_str()).collect();
        assert_eq!(shown, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_project_and_groups() {
        let snap = DaySnapshot::new(day("2025-01-01"))
            .with_check_in(CheckIn {
                mood: Some(6),
                energy: None,
                pain: Some(3),
            })
            .with_symptoms(Symptoms::new(["headache"]).intensity(2));

        assert_eq!(snap.groups(), vec![FieldGroup::Symptoms, FieldGroup::CheckIn]);

        let only = snap.project([FieldGroup::CheckIn]);
        assert_eq!(only.groups(), vec![FieldGroup::CheckIn]);
        assert!(DaySnapshot::new(snap.date).is_empty());
    }

    #[test]
    fn test_dose_status_parse() {
        assert_eq!("Taken".parse::<DoseStatus>().unwrap(), DoseStatus::Taken);
        assert!("skipped".parse::<DoseStatus>().is_err());
        assert_eq!(DoseStatus::Missed.to_string(), "missed");
    }
}
