//! The journal: in-memory state plus its persistence commit points
//!
//! Every mutation builds a complete new entry collection, writes it to the
//! store, and only then swaps it in. A failed write leaves the journal
//! exactly as it was, so readers never observe a partial collection.
//! Commits touching both entries and profile write the profile first and put
//! it back if the entry write then fails.

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::backup::Backup;
use crate::dates::sort_entries;
use crate::error::VitalLogError;
use crate::i18n::Language;
use crate::merge::merge_daily_inputs;
use crate::models::{DailyInputs, HealthEntry, TimeSlot, UserProfile};
use crate::stats::{day_summaries, DaySummary, GlucoseSummary, OutOfRangeCounts};
use crate::storage::StateStore;
use crate::units::GlucoseUnit;

/// Slots touched by a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub created: Vec<TimeSlot>,
    pub updated: Vec<TimeSlot>,
}

pub struct Journal<S: StateStore> {
    store: S,
    entries: Vec<HealthEntry>,
    profile: UserProfile,
    language: Language,
}

impl<S: StateStore> Journal<S> {
    /// Load all state from the store
    pub fn open(store: S) -> Result<Self, VitalLogError> {
        let mut entries = store.load_entries()?;
        sort_entries(&mut entries);
        let profile = store.load_profile()?.unwrap_or_default();
        let language = store.load_language()?.unwrap_or_default();

        info!(
            "Loaded {} entries (unit {}, language {})",
            entries.len(),
            profile.preferred_unit,
            language
        );
        Ok(Self { store, entries, profile, language })
    }

    pub fn entries(&self) -> &[HealthEntry] {
        &self.entries
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn unit(&self) -> GlucoseUnit {
        self.profile.preferred_unit
    }

    pub fn language(&self) -> Language {
        self.language
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge the day's form into the journal and clear the form.
    ///
    /// Glucose values are read in the preferred unit. On error neither the
    /// journal nor the form changes.
    pub fn save_day(
        &mut self,
        date: &str,
        inputs: &mut DailyInputs,
        now_millis: i64,
    ) -> Result<SaveReport, VitalLogError> {
        let outcome = merge_daily_inputs(&self.entries, date, inputs, self.unit(), now_millis)?;
        self.commit_entries(outcome.entries)?;
        inputs.clear();

        info!(
            "Saved {}: created {:?}, updated {:?}",
            date, outcome.created, outcome.updated
        );
        Ok(SaveReport { created: outcome.created, updated: outcome.updated })
    }

    /// Delete one entry by id; returns the number removed
    pub fn delete_entry(&mut self, id: &str) -> Result<usize, VitalLogError> {
        self.retain(|e| e.id != id)
    }

    pub fn delete_entries(&mut self, ids: &[String]) -> Result<usize, VitalLogError> {
        self.retain(|e| !ids.contains(&e.id))
    }

    /// Delete every entry of a date
    pub fn delete_day(&mut self, date: &str) -> Result<usize, VitalLogError> {
        self.retain(|e| e.date != date)
    }

    pub fn delete_days(&mut self, dates: &[String]) -> Result<usize, VitalLogError> {
        self.retain(|e| !dates.contains(&e.date))
    }

    /// Remove all entries and the patient's name and birthday.
    /// The unit and language preferences are kept.
    pub fn reset(&mut self) -> Result<(), VitalLogError> {
        let profile = UserProfile {
            preferred_unit: self.profile.preferred_unit,
            ..UserProfile::default()
        };
        self.commit_all(Vec::new(), profile)?;
        info!("All data reset");
        Ok(())
    }

    /// Update name and/or birthday
    pub fn set_profile(&mut self, name: Option<&str>, birthday: Option<&str>) -> Result<(), VitalLogError> {
        let mut profile = self.profile.clone();
        if let Some(name) = name {
            profile.name = name.trim().to_string();
        }
        if let Some(birthday) = birthday {
            profile.birthday = birthday.trim().to_string();
        }
        self.commit_profile(profile)
    }

    pub fn set_unit(&mut self, unit: GlucoseUnit) -> Result<(), VitalLogError> {
        let profile = UserProfile { preferred_unit: unit, ..self.profile.clone() };
        self.commit_profile(profile)
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), VitalLogError> {
        self.store.save_language(language)?;
        self.language = language;
        Ok(())
    }

    /// Snapshot for a backup file
    pub fn backup(&self, now: DateTime<Utc>) -> Backup {
        Backup::new(&self.entries, &self.profile, now)
    }

    /// Replace the entries with the backup's; profile and unit only if present
    pub fn restore(&mut self, backup: Backup) -> Result<(), VitalLogError> {
        let mut entries = backup.entries;
        sort_entries(&mut entries);
        let count = entries.len();

        if backup.user_profile.is_some() || backup.bz_unit.is_some() {
            let mut profile = self.profile.clone();
            if let Some(imported) = backup.user_profile {
                profile.name = imported.name;
                profile.birthday = imported.birthday;
            }
            if let Some(unit) = backup.bz_unit {
                profile.preferred_unit = unit;
            }
            self.commit_all(entries, profile)?;
        } else {
            self.commit_entries(entries)?;
        }

        info!("Restored {} entries from backup", count);
        Ok(())
    }

    pub fn glucose_summary(&self) -> Option<GlucoseSummary> {
        GlucoseSummary::from_entries(&self.entries)
    }

    pub fn out_of_range(&self) -> OutOfRangeCounts {
        OutOfRangeCounts::from_entries(&self.entries)
    }

    pub fn day_summaries(&self) -> Vec<DaySummary> {
        day_summaries(&self.entries)
    }

    fn retain<F>(&mut self, keep: F) -> Result<usize, VitalLogError>
    where
        F: Fn(&HealthEntry) -> bool,
    {
        let remaining: Vec<HealthEntry> = self.entries.iter().filter(|e| keep(e)).cloned().collect();
        let removed = self.entries.len() - remaining.len();
        if removed > 0 {
            self.commit_entries(remaining)?;
            info!("Deleted {} entries", removed);
        }
        Ok(removed)
    }

    fn commit_entries(&mut self, entries: Vec<HealthEntry>) -> Result<(), VitalLogError> {
        self.store.save_entries(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn commit_profile(&mut self, profile: UserProfile) -> Result<(), VitalLogError> {
        self.store.save_profile(&profile)?;
        self.profile = profile;
        Ok(())
    }

    /// Write profile then entries; memory changes only if both succeed
    fn commit_all(&mut self, entries: Vec<HealthEntry>, profile: UserProfile) -> Result<(), VitalLogError> {
        self.store.save_profile(&profile)?;
        if let Err(e) = self.store.save_entries(&entries) {
            if let Err(rollback) = self.store.save_profile(&self.profile) {
                warn!("Could not restore previous profile: {}", rollback);
            }
            return Err(e);
        }
        self.entries = entries;
        self.profile = profile;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotInput;
    use crate::storage::{MemoryStore, SqliteStore};

    const NOW: i64 = 1_710_489_600_000;

    /// Memory store with switchable write failures
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_entries: bool,
        fail_profile: bool,
    }

    fn disk_full() -> VitalLogError {
        VitalLogError::Io(std::io::Error::other("disk full"))
    }

    impl StateStore for FlakyStore {
        fn load_entries(&self) -> Result<Vec<HealthEntry>, VitalLogError> {
            self.inner.load_entries()
        }
        fn save_entries(&mut self, entries: &[HealthEntry]) -> Result<(), VitalLogError> {
            if self.fail_entries {
                return Err(disk_full());
            }
            self.inner.save_entries(entries)
        }
        fn load_profile(&self) -> Result<Option<UserProfile>, VitalLogError> {
            self.inner.load_profile()
        }
        fn save_profile(&mut self, profile: &UserProfile) -> Result<(), VitalLogError> {
            if self.fail_profile {
                return Err(disk_full());
            }
            self.inner.save_profile(profile)
        }
        fn load_language(&self) -> Result<Option<Language>, VitalLogError> {
            self.inner.load_language()
        }
        fn save_language(&mut self, language: Language) -> Result<(), VitalLogError> {
            self.inner.save_language(language)
        }
    }

    /// One stored entry and a named profile
    fn flaky_journal() -> Journal<FlakyStore> {
        let mut journal = Journal::open(FlakyStore::default()).unwrap();
        let mut inputs = form(TimeSlot::Morning, SlotInput::new("120", "130", "85", "70"));
        journal.save_day("05.03.2024", &mut inputs, NOW).unwrap();
        journal.set_profile(Some("Erika"), Some("12.08.1964")).unwrap();
        journal
    }

    fn form(slot: TimeSlot, input: SlotInput) -> DailyInputs {
        let mut inputs = DailyInputs::new();
        inputs.set(slot, input);
        inputs
    }

    fn journal_with_two_days() -> Journal<MemoryStore> {
        let mut journal = Journal::open(MemoryStore::default()).unwrap();
        let mut day1 = DailyInputs::new();
        day1.set(TimeSlot::Morning, SlotInput::new("110", "125", "82", "70"));
        day1.set(TimeSlot::Evening, SlotInput::new("150", "", "", ""));
        journal.save_day("10.03.2024", &mut day1, NOW).unwrap();

        let mut day2 = form(TimeSlot::Noon, SlotInput::new("95", "118", "76", "64"));
        journal.save_day("11.03.2024", &mut day2, NOW + 1).unwrap();
        journal
    }

    #[test]
    fn test_save_day_commits_and_clears_form() {
        let mut journal = Journal::open(MemoryStore::default()).unwrap();
        let mut inputs = form(TimeSlot::Morning, SlotInput::new("180", "", "", "75"));

        let report = journal.save_day("15.03.2024", &mut inputs, NOW).unwrap();
        assert_eq!(report.created, vec![TimeSlot::Morning]);
        assert!(!inputs.has_any_input());
        assert_eq!(journal.entries().len(), 1);
        assert_eq!(journal.store().entries, journal.entries());
    }

    #[test]
    fn test_failed_save_keeps_form_and_state() {
        let mut journal = Journal::open(MemoryStore::default()).unwrap();
        let mut inputs = form(TimeSlot::Morning, SlotInput::new("180", "", "", ""));

        let err = journal.save_day("32.01.2024", &mut inputs, NOW).unwrap_err();
        assert!(matches!(err, VitalLogError::InvalidDate(_)));
        assert!(inputs.has_any_input());
        assert!(journal.entries().is_empty());
        assert_eq!(journal.store().writes, 0);

        let err = journal.save_day("01.01.2024", &mut DailyInputs::new(), NOW).unwrap_err();
        assert!(matches!(err, VitalLogError::EmptyInput));
    }

    #[test]
    fn test_store_failure_leaves_memory_untouched() {
        let store = FlakyStore { fail_entries: true, ..FlakyStore::default() };
        let mut journal = Journal::open(store).unwrap();
        let mut inputs = form(TimeSlot::Noon, SlotInput::new("100", "", "", ""));
        assert!(journal.save_day("01.01.2024", &mut inputs, NOW).is_err());
        assert!(journal.entries().is_empty());
        assert!(inputs.has_any_input());
    }

    #[test]
    fn test_mmol_preference_applies_to_input() {
        let mut journal = Journal::open(MemoryStore::default()).unwrap();
        journal.set_unit(GlucoseUnit::MmolL).unwrap();

        let mut inputs = form(TimeSlot::Night, SlotInput::new("10", "", "", ""));
        journal.save_day("01.01.2024", &mut inputs, NOW).unwrap();
        assert_eq!(journal.entries()[0].glucose, "180");
    }

    #[test]
    fn test_deletions() {
        let mut journal = journal_with_two_days();
        assert_eq!(journal.entries().len(), 3);

        let id = journal.entries()[0].id.clone();
        assert_eq!(journal.delete_entry(&id).unwrap(), 1);
        assert_eq!(journal.delete_entry(&id).unwrap(), 0);
        assert_eq!(journal.entries().len(), 2);

        assert_eq!(journal.delete_day("11.03.2024").unwrap(), 1);
        assert_eq!(journal.entries().len(), 1);
        assert_eq!(journal.store().entries.len(), 1);
    }

    #[test]
    fn test_bulk_deletions() {
        let mut journal = journal_with_two_days();
        let ids: Vec<String> = journal.entries().iter().take(2).map(|e| e.id.clone()).collect();
        assert_eq!(journal.delete_entries(&ids).unwrap(), 2);

        let mut journal = journal_with_two_days();
        let dates = vec!["10.03.2024".to_string(), "11.03.2024".to_string()];
        assert_eq!(journal.delete_days(&dates).unwrap(), 3);
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_reset_keeps_unit() {
        let mut journal = journal_with_two_days();
        journal.set_profile(Some(" Max Muster "), Some("01.02.1960")).unwrap();
        journal.set_unit(GlucoseUnit::MmolL).unwrap();
        assert_eq!(journal.profile().name, "Max Muster");

        journal.reset().unwrap();
        assert!(journal.entries().is_empty());
        assert!(journal.profile().is_anonymous());
        assert_eq!(journal.unit(), GlucoseUnit::MmolL);
    }

    #[test]
    fn test_backup_and_restore() {
        let source = journal_with_two_days();
        let backup = source.backup(Utc::now());

        let mut target = Journal::open(MemoryStore::default()).unwrap();
        target.set_profile(Some("Someone"), None).unwrap();
        target.restore(Backup::parse(&backup.to_json().unwrap()).unwrap()).unwrap();
        assert_eq!(target.entries(), source.entries());
        assert_eq!(target.profile().name, "");
    }

    #[test]
    fn test_restore_without_profile_keeps_current() {
        let mut journal = Journal::open(MemoryStore::default()).unwrap();
        journal.set_profile(Some("Ada"), Some("10.12.1815")).unwrap();
        journal.set_unit(GlucoseUnit::MmolL).unwrap();

        let backup = Backup::parse(
            r#"{"entries": [{"id": "b", "date": "02.01.2024", "timeSlot": "Night", "glucose": "90",
                              "systolic": "120", "diastolic": "80", "pulse": "60", "createdAt": 2},
                             {"id": "a", "date": "01.01.2024", "timeSlot": "Noon", "glucose": "95",
                              "systolic": "120", "diastolic": "80", "pulse": "60", "createdAt": 1}]}"#,
        ).unwrap();
        journal.restore(backup).unwrap();

        assert_eq!(journal.profile().name, "Ada");
        assert_eq!(journal.unit(), GlucoseUnit::MmolL);
        // re-sorted on import
        assert_eq!(journal.entries()[0].id, "a");
    }

    #[test]
    fn test_reset_profile_failure_keeps_entries() {
        let mut journal = flaky_journal();
        journal.store.fail_profile = true;

        assert!(journal.reset().is_err());
        assert_eq!(journal.entries().len(), 1);
        assert_eq!(journal.store().inner.entries.len(), 1);
        assert_eq!(journal.profile().name, "Erika");
    }

    #[test]
    fn test_restore_profile_failure_keeps_entries() {
        let mut journal = flaky_journal();
        journal.store.fail_profile = true;

        let backup = Backup::parse(r#"{"entries": [], "userProfile": {"name": "Other", "birthday": ""}}"#).unwrap();
        assert!(journal.restore(backup).is_err());
        assert_eq!(journal.entries().len(), 1);
        assert_eq!(journal.store().inner.entries.len(), 1);
        assert_eq!(journal.profile().name, "Erika");
    }

    #[test]
    fn test_entry_failure_rolls_back_stored_profile() {
        let mut journal = flaky_journal();
        journal.store.fail_entries = true;

        let backup = Backup::parse(r#"{"entries": [], "userProfile": {"name": "Other", "birthday": ""}, "bzUnit": "mmol/L"}"#).unwrap();
        assert!(journal.restore(backup).is_err());
        assert!(journal.reset().is_err());

        assert_eq!(journal.entries().len(), 1);
        assert_eq!(journal.profile().name, "Erika");
        let stored = journal.store().inner.profile.clone().unwrap();
        assert_eq!(stored.name, "Erika");
        assert_eq!(stored.preferred_unit, GlucoseUnit::MgDl);
    }

    #[test]
    fn test_reopen_from_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        {
            let mut journal = Journal::open(SqliteStore::new(&path).unwrap()).unwrap();
            let mut inputs = form(TimeSlot::Evening, SlotInput::new("140", "130", "85", "77"));
            journal.save_day("20.03.2024", &mut inputs, NOW).unwrap();
            journal.set_language(Language::En).unwrap();
            journal.set_profile(Some("Jo"), None).unwrap();
        }
        let journal = Journal::open(SqliteStore::new(&path).unwrap()).unwrap();
        assert_eq!(journal.entries().len(), 1);
        assert_eq!(journal.entries()[0].pulse, "77");
        assert_eq!(journal.language(), Language::En);
        assert_eq!(journal.profile().name, "Jo");
    }

    #[test]
    fn test_derived_views() {
        let journal = journal_with_two_days();
        let summary = journal.glucose_summary().unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(journal.out_of_range().glucose, 1);
        assert_eq!(journal.day_summaries()[0].date, "11.03.2024");
    }
}
