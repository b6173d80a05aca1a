//! CSV export of a history window
//!
//! One row per logged day. Values a day did not record are left blank.

use crate::insights::{adherence, day_score, mood_level, RoundingRule};
use crate::snapshot::{DaySnapshot, DoseStatus};
use crate::storage::History;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct DayRow {
    date: String,
    doses_taken: Option<usize>,
    doses_total: Option<usize>,
    adherence_percent: Option<u8>,
    mood: Option<f64>,
    mood_entries: usize,
    energy: Option<u8>,
    pain: Option<u8>,
    sleep_hours: Option<f64>,
    sleep_quality: Option<u8>,
    systolic: Option<u16>,
    diastolic: Option<u16>,
    heart_rate: Option<u16>,
    spo2: Option<f64>,
    temperature_c: Option<f64>,
    blood_glucose: Option<f64>,
    symptoms: String,
    symptom_intensity: Option<u8>,
    day_score: Option<u8>,
}

impl DayRow {
    fn from_snapshot(day: &DaySnapshot, rounding: RoundingRule) -> Self {
        let doses = day.medications.as_ref();
        let check_in = day.check_in.clone().unwrap_or_default();
        let sleep = day.sleep.clone().unwrap_or_default();
        let vitals = day.vitals.clone().unwrap_or_default();

        Self {
            date: day.date.to_string(),
            doses_taken: doses.map(|d| d.iter().filter(|d| d.status == DoseStatus::Taken).count()),
            doses_total: doses.map(|d| d.len()),
            adherence_percent: adherence(day).percent(),
            mood: mood_level(day).map(|m| (m * 10.0).round() / 10.0),
            mood_entries: day.moods().len(),
            energy: check_in.energy,
            pain: check_in.pain,
            sleep_hours: sleep.hours,
            sleep_quality: sleep.quality,
            systolic: vitals.systolic,
            diastolic: vitals.diastolic,
            heart_rate: vitals.heart_rate,
            spo2: vitals.spo2,
            temperature_c: vitals.temperature_c,
            blood_glucose: vitals.blood_glucose,
            symptoms: day
                .symptoms
                .as_ref()
                .map(|s| s.tags.iter().cloned().collect::<Vec<_>>().join(";"))
                .unwrap_or_default(),
            symptom_intensity: day.symptoms.as_ref().and_then(|s| s.intensity),
            day_score: day_score(day, rounding).value(),
        }
    }
}

/// Write `history` as CSV with a header row
pub fn write_csv<W: Write>(history: &History, rounding: RoundingRule, out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for day in &history.days {
        writer.serialize(DayRow::from_snapshot(day, rounding))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{CheckIn, MedicationDose, Symptoms};
    use chrono::NaiveDate;

    #[test]
    fn test_csv_rows() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let history = History {
            days: vec![DaySnapshot::new(date)
                .with_medications(vec![
                    MedicationDose::new("a", DoseStatus::Taken),
                    MedicationDose::new("b", DoseStatus::Planned),
                ])
                .with_check_in(CheckIn {
                    mood: Some(6),
                    energy: Some(4),
                    pain: Some(8),
                })
                .with_symptoms(Symptoms::new(["nausea", "headache"]).intensity(2))],
            skipped: vec![],
        };

        let mut buf = Vec::new();
        write_csv(&history, RoundingRule::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert!(lines.next().unwrap().starts_with("date,doses_taken,doses_total,adherence_percent"));
        assert_eq!(
            lines.next().unwrap(),
            "2025-01-01,1,2,50,6.0,0,4,8,,,,,,,,,headache;nausea,2,40"
        );
        assert!(lines.next().is_none());
    }
}
