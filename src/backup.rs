//! JSON backup files
//!
//! A backup holds the entry collection, the user profile, the preferred
//! glucose unit and the time it was written:
//!
//! ```json
//! { "entries": [...], "userProfile": {...}, "bzUnit": "mg/dL", "date": "2024-03-15T08:30:00.000Z" }
//! ```
//!
//! On import only `entries` is required. A missing profile or unit leaves
//! the current value alone.

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::VitalLogError;
use crate::models::{HealthEntry, UserProfile};
use crate::units::GlucoseUnit;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub entries: Vec<HealthEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bz_unit: Option<GlucoseUnit>,
    /// ISO 8601 timestamp of the export
    #[serde(rename = "date", skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
}

/// Loose shape used for reading, so a missing `entries` can be told apart
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBackup {
    entries: Option<Vec<HealthEntry>>,
    #[serde(default)]
    user_profile: Option<UserProfile>,
    #[serde(default)]
    bz_unit: Option<GlucoseUnit>,
    #[serde(rename = "date", default)]
    exported_at: Option<String>,
}

impl Backup {
    /// Snapshot of the current state
    pub fn new(entries: &[HealthEntry], profile: &UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            entries: entries.to_vec(),
            user_profile: Some(profile.clone()),
            bz_unit: Some(profile.preferred_unit),
            exported_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    pub fn to_json(&self) -> Result<String, VitalLogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse backup text; malformed JSON, a missing `entries` field or two
    /// entries for the same date and slot is an `ImportFormat` error
    pub fn parse(json: &str) -> Result<Self, VitalLogError> {
        let raw: RawBackup = serde_json::from_str(json)
            .map_err(|e| VitalLogError::ImportFormat(e.to_string()))?;

        let entries = raw.entries
            .ok_or_else(|| VitalLogError::ImportFormat("missing \"entries\" field".to_string()))?;

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert((entry.date.as_str(), entry.time_slot)) {
                return Err(VitalLogError::ImportFormat(format!(
                    "more than one entry for {} {}",
                    entry.date, entry.time_slot
                )));
            }
        }

        Ok(Self {
            entries,
            user_profile: raw.user_profile,
            bz_unit: raw.bz_unit,
            exported_at: raw.exported_at,
        })
    }

    /// Write the backup as pretty-printed JSON
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), VitalLogError> {
        if self.entries.is_empty() {
            return Err(VitalLogError::NothingToExport);
        }
        fs::write(path.as_ref(), self.to_json()?)?;
        info!("Wrote backup with {} entries to {}", self.entries.len(), path.as_ref().display());
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, VitalLogError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }
}

/// `VitalLog_Backup_<DD.MM.YYYY>.json`
pub fn default_backup_file_name(date: &str) -> String {
    format!("VitalLog_Backup_{}.json", date)
}
