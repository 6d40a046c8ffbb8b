//! `DD.MM.YYYY` date handling and the chronological order of entries
//!
//! Dates are local wall-clock calendar dates without a timezone. A date
//! that cannot be read becomes [`EntryDate::Invalid`], which orders after
//! every valid date so sorting never fails.

use chrono::{Datelike, Local, NaiveDate};
use std::cmp::Ordering;

use crate::i18n::Language;
use crate::models::HealthEntry;

/// Parsed entry date; `Invalid` sorts after all valid dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryDate {
    Valid(NaiveDate),
    Invalid,
}

impl EntryDate {
    pub fn is_valid(self) -> bool {
        matches!(self, EntryDate::Valid(_))
    }

    pub fn as_date(self) -> Option<NaiveDate> {
        match self {
            EntryDate::Valid(date) => Some(date),
            EntryDate::Invalid => None,
        }
    }
}

/// Parse `D.M.YYYY` style text into a calendar date.
///
/// Field widths are not checked here (see [`is_valid_date`]), but the
/// date must exist in the calendar.
pub fn parse_date(text: &str) -> EntryDate {
    let mut parts = text.trim().split('.');
    let (Some(day), Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return EntryDate::Invalid;
    };

    let (Ok(day), Ok(month), Ok(year)) = (day.parse::<u32>(), month.parse::<u32>(), year.parse::<i32>()) else {
        return EntryDate::Invalid;
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .map(EntryDate::Valid)
        .unwrap_or(EntryDate::Invalid)
}

/// Strict validation: exactly `DD.MM.YYYY` digits and a real calendar date
pub fn is_valid_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'.' || bytes[5] != b'.' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 2 && *i != 5)
        .all(|(_, b)| b.is_ascii_digit());

    digits_ok && parse_date(text).is_valid()
}

/// Format a calendar date as `DD.MM.YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Today's local date as `DD.MM.YYYY`
pub fn today() -> String {
    format_date(Local::now().date_naive())
}

/// Localized full weekday name; empty for an unreadable date
pub fn weekday_name(text: &str, language: Language) -> String {
    match parse_date(text) {
        EntryDate::Valid(date) => language.weekday(date.weekday()).to_string(),
        EntryDate::Invalid => String::new(),
    }
}

/// Total order of entries: date, then time slot, then creation time.
///
/// The last two keys only matter for malformed data (unreadable dates or
/// duplicate keys) and keep the order deterministic.
pub fn compare_entries(a: &HealthEntry, b: &HealthEntry) -> Ordering {
    parse_date(&a.date)
        .cmp(&parse_date(&b.date))
        .then_with(|| a.time_slot.rank().cmp(&b.time_slot.rank()))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort entries in place into chronological order
pub fn sort_entries(entries: &mut [HealthEntry]) {
    entries.sort_by(compare_entries);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;

    fn entry(date: &str, slot: TimeSlot) -> HealthEntry {
        HealthEntry {
            id: format!("{}-{}", date, slot),
            date: date.to_string(),
            time_slot: slot,
            glucose: "100".to_string(),
            systolic: "120".to_string(),
            diastolic: "80".to_string(),
            pulse: "72".to_string(),
            glucose_is_estimated: false,
            pressure_is_estimated: false,
            created_at: 0,
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("15.03.2024"),
            EntryDate::Valid(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        assert_eq!(parse_date("31.02.2024"), EntryDate::Invalid);
        assert_eq!(parse_date(""), EntryDate::Invalid);
        assert_eq!(parse_date("2024-03-15"), EntryDate::Invalid);
        assert_eq!(parse_date("1.2.3.4"), EntryDate::Invalid);
    }

    #[test]
    fn test_is_valid_date() {
        assert!(is_valid_date("29.02.2024"));
        assert!(!is_valid_date("29.02.2023"));
        assert!(!is_valid_date("1.03.2024"));
        assert!(!is_valid_date("01.3.2024"));
        assert!(!is_valid_date("01.03.24"));
        assert!(!is_valid_date("aa.bb.cccc"));
        assert!(!is_valid_date("00.01.2024"));
        assert!(!is_valid_date(" 01.01.2024"));
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "05.01.2024");
        assert!(is_valid_date(&today()));
    }

    #[test]
    fn test_ordering_date_then_slot() {
        let mut entries = vec![
            entry("01.01.2024", TimeSlot::Night),
            entry("02.01.2024", TimeSlot::Morning),
            entry("01.01.2024", TimeSlot::Morning),
        ];
        sort_entries(&mut entries);

        let keys: Vec<(&str, TimeSlot)> = entries.iter().map(|e| (e.date.as_str(), e.time_slot)).collect();
        assert_eq!(
            keys,
            vec![
                ("01.01.2024", TimeSlot::Morning),
                ("01.01.2024", TimeSlot::Night),
                ("02.01.2024", TimeSlot::Morning),
            ]
        );
    }

    #[test]
    fn test_invalid_dates_sort_last_deterministically() {
        let mut entries = vec![
            entry("garbage", TimeSlot::Night),
            entry("05.05.2020", TimeSlot::Evening),
            entry("", TimeSlot::Morning),
            entry("01.01.2030", TimeSlot::Noon),
        ];
        sort_entries(&mut entries);

        assert_eq!(entries[0].date, "05.05.2020");
        assert_eq!(entries[1].date, "01.01.2030");
        assert_eq!(entries[2].time_slot, TimeSlot::Morning);
        assert_eq!(entries[3].time_slot, TimeSlot::Night);

        // Same result regardless of input order
        let mut reversed: Vec<HealthEntry> = entries.iter().rev().cloned().collect();
        sort_entries(&mut reversed);
        assert_eq!(reversed, entries);
    }

    #[test]
    fn test_weekday_name() {
        // 15.03.2024 was a Friday
        assert_eq!(weekday_name("15.03.2024", Language::En), "Friday");
        assert_eq!(weekday_name("15.03.2024", Language::De), "Freitag");
        assert_eq!(weekday_name("nope", Language::En), "");
    }
}
