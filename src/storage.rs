//! Persistence of the journal state
//!
//! Three independent values are persisted: the entry collection, the user
//! profile and the interface language. They are read once at startup and
//! written whenever the corresponding piece of state changes.

use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::VitalLogError;
use crate::i18n::Language;
use crate::models::{HealthEntry, TimeSlot, UserProfile};

/// Storage collaborator injected into the journal
pub trait StateStore {
    fn load_entries(&self) -> Result<Vec<HealthEntry>, VitalLogError>;

    /// Replace the whole stored collection
    fn save_entries(&mut self, entries: &[HealthEntry]) -> Result<(), VitalLogError>;

    fn load_profile(&self) -> Result<Option<UserProfile>, VitalLogError>;

    fn save_profile(&mut self, profile: &UserProfile) -> Result<(), VitalLogError>;

    fn load_language(&self) -> Result<Option<Language>, VitalLogError>;

    fn save_language(&mut self, language: Language) -> Result<(), VitalLogError>;
}

const PROFILE_KEY: &str = "profile";
const LANGUAGE_KEY: &str = "language";

/// SQLite database holding entries and settings
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create or open a database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, VitalLogError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, VitalLogError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, VitalLogError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                time_slot TEXT NOT NULL,
                glucose TEXT NOT NULL,
                systolic TEXT NOT NULL,
                diastolic TEXT NOT NULL,
                pulse TEXT NOT NULL,
                glucose_estimated INTEGER NOT NULL DEFAULT 0,
                pressure_estimated INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                UNIQUE (date, time_slot)
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );"
        )?;

        Ok(Self { conn })
    }

    /// Get total entry count
    #[cfg(test)]
    pub fn count(&self) -> Result<i64, VitalLogError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?)
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>, VitalLogError> {
        let value = self.conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), VitalLogError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Entry row before the slot text is parsed
struct EntryRow {
    id: String,
    date: String,
    time_slot: String,
    glucose: String,
    systolic: String,
    diastolic: String,
    pulse: String,
    glucose_estimated: bool,
    pressure_estimated: bool,
    created_at: i64,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            time_slot: row.get(2)?,
            glucose: row.get(3)?,
            systolic: row.get(4)?,
            diastolic: row.get(5)?,
            pulse: row.get(6)?,
            glucose_estimated: row.get(7)?,
            pressure_estimated: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_entry(self) -> Result<HealthEntry, VitalLogError> {
        Ok(HealthEntry {
            id: self.id,
            date: self.date,
            time_slot: self.time_slot.parse::<TimeSlot>()?,
            glucose: self.glucose,
            systolic: self.systolic,
            diastolic: self.diastolic,
            pulse: self.pulse,
            glucose_is_estimated: self.glucose_estimated,
            pressure_is_estimated: self.pressure_estimated,
            created_at: self.created_at,
        })
    }
}

impl StateStore for SqliteStore {
    fn load_entries(&self) -> Result<Vec<HealthEntry>, VitalLogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, time_slot, glucose, systolic, diastolic, pulse,
                    glucose_estimated, pressure_estimated, created_at
             FROM entries ORDER BY created_at"
        )?;

        let rows = stmt.query_map([], |row| EntryRow::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    fn save_entries(&mut self, entries: &[HealthEntry]) -> Result<(), VitalLogError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (id, date, time_slot, glucose, systolic, diastolic, pulse,
                                      glucose_estimated, pressure_estimated, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.id,
                    entry.date,
                    entry.time_slot.as_str(),
                    entry.glucose,
                    entry.systolic,
                    entry.diastolic,
                    entry.pulse,
                    entry.glucose_is_estimated,
                    entry.pressure_is_estimated,
                    entry.created_at,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Stored {} entries", entries.len());
        Ok(())
    }

    fn load_profile(&self) -> Result<Option<UserProfile>, VitalLogError> {
        match self.get_setting(PROFILE_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(profile) => Ok(Some(profile)),
                Err(e) => {
                    warn!("Ignoring unreadable stored profile: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save_profile(&mut self, profile: &UserProfile) -> Result<(), VitalLogError> {
        let json = serde_json::to_string(profile)?;
        self.set_setting(PROFILE_KEY, &json)
    }

    fn load_language(&self) -> Result<Option<Language>, VitalLogError> {
        match self.get_setting(LANGUAGE_KEY)? {
            Some(code) => match code.parse::<Language>() {
                Ok(language) => Ok(Some(language)),
                Err(e) => {
                    warn!("Ignoring stored language: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save_language(&mut self, language: Language) -> Result<(), VitalLogError> {
        self.set_setting(LANGUAGE_KEY, language.code())
    }
}

/// Non-persistent store for tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub entries: Vec<HealthEntry>,
    pub profile: Option<UserProfile>,
    pub language: Option<Language>,
    /// Number of writes of any kind
    pub writes: usize,
}

#[cfg(test)]
impl StateStore for MemoryStore {
    fn load_entries(&self) -> Result<Vec<HealthEntry>, VitalLogError> {
        Ok(self.entries.clone())
    }

    fn save_entries(&mut self, entries: &[HealthEntry]) -> Result<(), VitalLogError> {
        self.entries = entries.to_vec();
        self.writes += 1;
        Ok(())
    }

    fn load_profile(&self) -> Result<Option<UserProfile>, VitalLogError> {
        Ok(self.profile.clone())
    }

    fn save_profile(&mut self, profile: &UserProfile) -> Result<(), VitalLogError> {
        self.profile = Some(profile.clone());
        self.writes += 1;
        Ok(())
    }

    fn load_language(&self) -> Result<Option<Language>, VitalLogError> {
        Ok(self.language)
    }

    fn save_language(&mut self, language: Language) -> Result<(), VitalLogError> {
        self.language = Some(language);
        self.writes += 1;
        Ok(())
    }
}
