//! Day snapshot model
//!
//! - **types**: `DaySnapshot` and its field groups
//! - **validate**: write-boundary checks (`InvalidField`)
//!
//! A day is identified by its calendar date. Field groups are independently
//! optional so that different input surfaces can write the same day without
//! clobbering each other.

pub mod types;
pub mod validate;

pub use types::{
    CheckIn, DaySnapshot, DoseStatus, FieldGroup, MedicationDose, MoodEntry, Sleep, Symptoms,
    Vitals,
};
pub use validate::{validate_snapshot, ValidationError};
