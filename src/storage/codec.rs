//! Field-group payload codec
//!
//! Each field group of a day is persisted as its own row:
//! - payload: JSON of that group only
//! - checksum: CRC32 of the payload bytes
//!
//! Decoding one group never touches the others, so a damaged group can be
//! reported without reading the rest of the day.

use crate::snapshot::{DaySnapshot, FieldGroup, ValidationError};
use crate::storage::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;

/// One encoded field group, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedGroup {
    pub group: FieldGroup,
    pub payload: String,
    pub checksum: u32,
}

/// CRC32 of a payload
pub fn checksum(payload: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload.as_bytes());
    hasher.finalize()
}

fn encode<T: serde::Serialize>(group: FieldGroup, value: &T) -> StoreResult<EncodedGroup> {
    let payload = serde_json::to_string(value).map_err(|e| {
        StoreError::InvalidField(ValidationError::new(group.as_str(), e.to_string()))
    })?;
    Ok(EncodedGroup {
        group,
        checksum: checksum(&payload),
        payload,
    })
}

/// Encode every group present on a snapshot
pub fn encode_groups(snapshot: &DaySnapshot) -> StoreResult<Vec<EncodedGroup>> {
    let mut out = Vec::new();
    if let Some(v) = &snapshot.medications {
        out.push(encode(FieldGroup::Medications, v)?);
    }
    if let Some(v) = &snapshot.mood_entries {
        out.push(encode(FieldGroup::Mood, v)?);
    }
    if let Some(v) = &snapshot.vitals {
        out.push(encode(FieldGroup::Vitals, v)?);
    }
    if let Some(v) = &snapshot.symptoms {
        out.push(encode(FieldGroup::Symptoms, v)?);
    }
    if let Some(v) = &snapshot.sleep {
        out.push(encode(FieldGroup::Sleep, v)?);
    }
    if let Some(v) = &snapshot.check_in {
        out.push(encode(FieldGroup::CheckIn, v)?);
    }
    Ok(out)
}

fn decode<T: DeserializeOwned>(payload: &str) -> Result<T, String> {
    serde_json::from_str(payload).map_err(|e| format!("decode failed: {}", e))
}

/// Verify and decode one stored group into `snapshot`.
///
/// Returns the reason on failure; the caller attaches the date.
pub fn apply_group(
    snapshot: &mut DaySnapshot,
    group: FieldGroup,
    payload: &str,
    stored_checksum: u32,
) -> Result<(), String> {
    let computed = checksum(payload);
    if computed != stored_checksum {
        return Err(format!(
            "checksum mismatch: stored={}, computed={}",
            stored_checksum, computed
        ));
    }

    match group {
        FieldGroup::Medications => snapshot.medications = Some(decode(payload)?),
        FieldGroup::Mood => snapshot.mood_entries = Some(decode(payload)?),
        FieldGroup::Vitals => snapshot.vitals = Some(decode(payload)?),
        FieldGroup::Symptoms => snapshot.symptoms = Some(decode(payload)?),
        FieldGroup::Sleep => snapshot.sleep = Some(decode(payload)?),
        FieldGroup::CheckIn => snapshot.check_in = Some(decode(payload)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{DoseStatus, MedicationDose, Sleep};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_encode_only_present_groups() {
        let snap = DaySnapshot::new(date())
            .with_medications(vec![MedicationDose::new("m1", DoseStatus::Taken)])
            .with_sleep(Sleep {
                hours: Some(6.5),
                quality: None,
            });

        let encoded = encode_groups(&snap).unwrap();
        let groups: Vec<FieldGroup> = encoded.iter().map(|e| e.group).collect();
        assert_eq!(groups, vec![FieldGroup::Medications, FieldGroup::Sleep]);
        assert_eq!(encoded[1].payload, r#"{"hours":6.5}"#);
        assert_eq!(encoded[1].checksum, checksum(&encoded[1].payload));
    }

    #[test]
    fn test_apply_group_decodes() {
        let snap = DaySnapshot::new(date())
            .with_medications(vec![MedicationDose::new("m1", DoseStatus::Missed).label("Evening meds")]);
        let encoded = encode_groups(&snap).unwrap().remove(0);

        let mut out = DaySnapshot::new(date());
        apply_group(&mut out, encoded.group, &encoded.payload, encoded.checksum).unwrap();
        assert_eq!(out, snap);
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mut out = DaySnapshot::new(date());
        let payload = r#"{"hours":6.5}"#;
        let reason = apply_group(&mut out, FieldGroup::Sleep, payload, checksum(payload) ^ 1).unwrap_err();
        assert!(reason.contains("checksum mismatch"));
        assert!(out.sleep.is_none());
    }

    #[test]
    fn test_malformed_payload_detected() {
        let mut out = DaySnapshot::new(date());
        let payload = r#"{"hours":"#;
        let reason = apply_group(&mut out, FieldGroup::Sleep, payload, checksum(payload)).unwrap_err();
        assert!(reason.starts_with("decode failed"));
    }
}
