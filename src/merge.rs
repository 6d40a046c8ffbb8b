//! Merge a day's form inputs into the entry collection
//!
//! Each time slot is merged on its own. A slot with no content is skipped.
//! Otherwise the (date, slot) entry is created or updated in place, so the
//! collection never holds two entries for the same pair.
//!
//! Missing values are filled with fixed defaults so every stored slot has a
//! plottable value. The auto-flags record which values are placeholders.
//! Glucose has its own flag; systolic and diastolic share one.

use log::debug;
use uuid::Uuid;

use crate::dates::{is_valid_date, sort_entries};
use crate::error::VitalLogError;
use crate::models::{DailyInputs, HealthEntry, SlotInput, TimeSlot};
use crate::units::GlucoseUnit;

pub const DEFAULT_GLUCOSE: &str = "100";
pub const DEFAULT_SYSTOLIC: &str = "120";
pub const DEFAULT_DIASTOLIC: &str = "80";
pub const DEFAULT_PULSE: &str = "72";

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The new authoritative collection, sorted chronologically
    pub entries: Vec<HealthEntry>,
    pub created: Vec<TimeSlot>,
    pub updated: Vec<TimeSlot>,
}

/// Trimmed slot values with glucose already in mg/dL
struct Submitted<'a> {
    glucose: String,
    systolic: &'a str,
    diastolic: &'a str,
    pulse: &'a str,
}

impl<'a> Submitted<'a> {
    fn from_input(input: &'a SlotInput, unit: GlucoseUnit) -> Option<Self> {
        if input.is_blank() {
            return None;
        }
        let glucose = input.glucose.trim();
        let glucose = if glucose.is_empty() {
            String::new()
        } else {
            unit.to_canonical(glucose)
        };

        Some(Self {
            glucose,
            systolic: input.systolic.trim(),
            diastolic: input.diastolic.trim(),
            pulse: input.pulse.trim(),
        })
    }

    fn has_pressure(&self) -> bool {
        !self.systolic.is_empty() || !self.diastolic.is_empty()
    }
}

/// Merge `inputs` for `date` into a copy of `entries`.
///
/// Fails with `InvalidDate` if the date is not a strict `DD.MM.YYYY`
/// calendar date, and with `EmptyInput` if no slot has any content. On
/// failure the caller's collection is untouched.
pub fn merge_daily_inputs(
    entries: &[HealthEntry],
    date: &str,
    inputs: &DailyInputs,
    unit: GlucoseUnit,
    now_millis: i64,
) -> Result<MergeOutcome, VitalLogError> {
    if !is_valid_date(date) {
        return Err(VitalLogError::InvalidDate(date.to_string()));
    }
    if !inputs.has_any_input() {
        return Err(VitalLogError::EmptyInput);
    }

    let mut merged = entries.to_vec();
    let mut created = Vec::new();
    let mut updated = Vec::new();

    for (slot, input) in inputs.iter() {
        let Some(submitted) = Submitted::from_input(input, unit) else {
            continue;
        };

        match merged.iter_mut().find(|e| e.is_for(date, slot)) {
            Some(existing) => {
                update_entry(existing, &submitted);
                updated.push(slot);
            }
            None => {
                merged.push(create_entry(date, slot, &submitted, now_millis));
                created.push(slot);
            }
        }
    }

    sort_entries(&mut merged);
    debug!(
        "Merged {}: {} created, {} updated, {} entries total",
        date,
        created.len(),
        updated.len(),
        merged.len()
    );

    Ok(MergeOutcome { entries: merged, created, updated })
}

/// Fresh opaque entry id
pub fn new_entry_id(now_millis: i64) -> String {
    format!("E-{}-{}", now_millis, Uuid::new_v4().simple())
}

fn create_entry(date: &str, slot: TimeSlot, submitted: &Submitted<'_>, now_millis: i64) -> HealthEntry {
    HealthEntry {
        id: new_entry_id(now_millis),
        date: date.to_string(),
        time_slot: slot,
        glucose: or_default(&submitted.glucose, DEFAULT_GLUCOSE),
        systolic: or_default(submitted.systolic, DEFAULT_SYSTOLIC),
        diastolic: or_default(submitted.diastolic, DEFAULT_DIASTOLIC),
        pulse: or_default(submitted.pulse, DEFAULT_PULSE),
        glucose_is_estimated: submitted.glucose.is_empty(),
        pressure_is_estimated: !submitted.has_pressure(),
        created_at: now_millis,
    }
}

fn update_entry(entry: &mut HealthEntry, submitted: &Submitted<'_>) {
    entry.glucose = overwrite(&submitted.glucose, &entry.glucose, DEFAULT_GLUCOSE);
    entry.systolic = overwrite(submitted.systolic, &entry.systolic, DEFAULT_SYSTOLIC);
    entry.diastolic = overwrite(submitted.diastolic, &entry.diastolic, DEFAULT_DIASTOLIC);
    entry.pulse = overwrite(submitted.pulse, &entry.pulse, DEFAULT_PULSE);

    if !submitted.glucose.is_empty() {
        entry.glucose_is_estimated = false;
    }
    if submitted.has_pressure() {
        entry.pressure_is_estimated = false;
    }
}

fn or_default(value: &str, default: &str) -> String {
    let chosen = if value.is_empty() { default } else { value };
    chosen.to_string()
}

/// Submitted value, else the stored one, else the default
fn overwrite(submitted: &str, stored: &str, default: &str) -> String {
    if !submitted.is_empty() {
        submitted.to_string()
    } else {
        or_default(stored, default)
    }
}
