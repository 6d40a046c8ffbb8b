//! Core data model: entries, time slots, per-day form inputs and the user profile

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VitalLogError;
use crate::units::GlucoseUnit;

/// One of the four daily measurement slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(alias = "Morgens")]
    Morning,
    #[serde(alias = "Mittags")]
    Noon,
    #[serde(alias = "Abends")]
    Evening,
    #[serde(alias = "Nacht")]
    Night,
}

impl TimeSlot {
    /// All slots in chronological order
    pub const ALL: [TimeSlot; 4] = [TimeSlot::Morning, TimeSlot::Noon, TimeSlot::Evening, TimeSlot::Night];

    /// Fixed time-of-day rank, Morning = 1 through Night = 4
    pub fn rank(self) -> u8 {
        match self {
            TimeSlot::Morning => 1,
            TimeSlot::Noon => 2,
            TimeSlot::Evening => 3,
            TimeSlot::Night => 4,
        }
    }

    fn index(self) -> usize {
        self.rank() as usize - 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning",
            TimeSlot::Noon => "Noon",
            TimeSlot::Evening => "Evening",
            TimeSlot::Night => "Night",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = VitalLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" | "morgens" => Ok(TimeSlot::Morning),
            "noon" | "mittags" => Ok(TimeSlot::Noon),
            "evening" | "abends" => Ok(TimeSlot::Evening),
            "night" | "nacht" => Ok(TimeSlot::Night),
            _ => Err(VitalLogError::UnknownTimeSlot(s.to_string())),
        }
    }
}

/// One canonical reading for a (date, time slot) pair.
///
/// Readings are kept as text exactly as entered; glucose is always mg/dL.
/// Older backups used German field names, which are still accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntry {
    pub id: String,
    #[serde(alias = "datum")]
    pub date: String,
    #[serde(alias = "zeitpunkt")]
    pub time_slot: TimeSlot,
    #[serde(alias = "bz", default)]
    pub glucose: String,
    #[serde(alias = "rrSys", default)]
    pub systolic: String,
    #[serde(alias = "rrDia", default)]
    pub diastolic: String,
    #[serde(alias = "puls", default)]
    pub pulse: String,
    #[serde(alias = "bzAuto", default)]
    pub glucose_is_estimated: bool,
    /// Shared by systolic and diastolic
    #[serde(alias = "rrAuto", default)]
    pub pressure_is_estimated: bool,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: i64,
}

impl HealthEntry {
    /// True if any value of this entry is a placeholder
    pub fn is_estimated(&self) -> bool {
        self.glucose_is_estimated || self.pressure_is_estimated
    }

    /// Natural key of the entry
    pub fn is_for(&self, date: &str, slot: TimeSlot) -> bool {
        self.date == date && self.time_slot == slot
    }
}

/// Raw, untrimmed form fields for one time slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInput {
    pub glucose: String,
    pub systolic: String,
    pub diastolic: String,
    pub pulse: String,
}

impl SlotInput {
    pub fn new(glucose: &str, systolic: &str, diastolic: &str, pulse: &str) -> Self {
        Self {
            glucose: glucose.to_string(),
            systolic: systolic.to_string(),
            diastolic: diastolic.to_string(),
            pulse: pulse.to_string(),
        }
    }

    /// True when every field is blank after trimming
    pub fn is_blank(&self) -> bool {
        [&self.glucose, &self.systolic, &self.diastolic, &self.pulse]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// The in-progress form for one day: one `SlotInput` per time slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyInputs {
    slots: [SlotInput; 4],
}

impl DailyInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, slot: TimeSlot) -> &SlotInput {
        &self.slots[slot.index()]
    }

    pub fn set(&mut self, slot: TimeSlot, input: SlotInput) {
        self.slots[slot.index()] = input;
    }

    /// True if at least one field of any slot has content
    pub fn has_any_input(&self) -> bool {
        self.slots.iter().any(|input| !input.is_blank())
    }

    /// Reset all fields after a successful save
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    /// Iterate slots in time-of-day order
    pub fn iter(&self) -> impl Iterator<Item = (TimeSlot, &SlotInput)> {
        TimeSlot::ALL.into_iter().map(move |slot| (slot, self.slot(slot)))
    }
}

/// Patient details shown on reports, and the display unit preference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(alias = "preferredBzUnit", default)]
    pub preferred_unit: GlucoseUnit,
}

impl UserProfile {
    /// True when neither name nor birthday is set
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() && self.birthday.is_empty()
    }

    /// Name for file names and report headers
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Patient"
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_slot_order() {
        let ranks: Vec<u8> = TimeSlot::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(TimeSlot::Morning < TimeSlot::Night);
    }

    #[test]
    fn test_time_slot_parse() {
        assert_eq!("Evening".parse::<TimeSlot>().unwrap(), TimeSlot::Evening);
        assert_eq!("mittags".parse::<TimeSlot>().unwrap(), TimeSlot::Noon);
        assert!("brunch".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_entry_accepts_legacy_field_names() {
        let json = r#"{
            "id": "E-1",
            "datum": "01.02.2024",
            "zeitpunkt": "Abends",
            "bz": "120",
            "rrSys": "130",
            "rrDia": "85",
            "puls": "70",
            "createdAt": 1706745600000,
            "bzAuto": true
        }"#;
        let entry: HealthEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date, "01.02.2024");
        assert_eq!(entry.time_slot, TimeSlot::Evening);
        assert_eq!(entry.glucose, "120");
        assert!(entry.glucose_is_estimated);
        assert!(!entry.pressure_is_estimated);
        assert!(entry.is_estimated());
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = HealthEntry {
            id: "x".to_string(),
            date: "01.01.2024".to_string(),
            time_slot: TimeSlot::Morning,
            glucose: "100".to_string(),
            systolic: "120".to_string(),
            diastolic: "80".to_string(),
            pulse: "72".to_string(),
            glucose_is_estimated: false,
            pressure_is_estimated: true,
            created_at: 5,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["timeSlot"], "Morning");
        assert_eq!(value["pressureIsEstimated"], true);
        assert_eq!(value["createdAt"], 5);
    }

    #[test]
    fn test_daily_inputs() {
        let mut inputs = DailyInputs::new();
        assert!(!inputs.has_any_input());

        inputs.set(TimeSlot::Noon, SlotInput::new("", "", "", "  "));
        assert!(!inputs.has_any_input());

        inputs.set(TimeSlot::Night, SlotInput::new("", "", "", "66"));
        assert!(inputs.has_any_input());
        assert_eq!(inputs.slot(TimeSlot::Night).pulse, "66");

        inputs.clear();
        assert!(!inputs.has_any_input());
    }

    #[test]
    fn test_profile_legacy_unit_field() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"name":"Ada","birthday":"","preferredBzUnit":"mmol/l"}"#).unwrap();
        assert_eq!(profile.preferred_unit, GlucoseUnit::MmolL);
        assert_eq!(profile.display_name(), "Ada");
        assert_eq!(UserProfile::default().display_name(), "Patient");
    }
}
