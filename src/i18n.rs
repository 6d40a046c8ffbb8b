//! Interface language and localized labels used in exports

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VitalLogError;
use crate::models::TimeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
    Fr,
    Es,
    Tr,
    Ar,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::De,
        Language::En,
        Language::Fr,
        Language::Es,
        Language::Tr,
        Language::Ar,
    ];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::Tr => "tr",
            Language::Ar => "ar",
        }
    }

    pub fn slot_label(self, slot: TimeSlot) -> &'static str {
        let labels = match self {
            Language::De => ["Früh", "Mittag", "Abend", "Nacht"],
            Language::En => ["Morning", "Noon", "Evening", "Night"],
            Language::Fr => ["Matin", "Midi", "Soir", "Nuit"],
            Language::Es => ["Mañana", "Mediodía", "Tarde", "Noche"],
            Language::Tr => ["Sabah", "Öğle", "Akşam", "Gece"],
            Language::Ar => ["صباح", "ظهر", "مساء", "ليل"],
        };
        labels[slot.rank() as usize - 1]
    }

    /// Row status: placeholder values vs. values typed by the user
    pub fn status_label(self, estimated: bool) -> &'static str {
        let (estimate, manual) = match self {
            Language::De => ("Schätzung", "Manuell"),
            Language::En => ("Estimated", "Manual"),
            Language::Fr => ("Estimation", "Manuel"),
            Language::Es => ("Estimación", "Manual"),
            Language::Tr => ("Tahmin", "Manuel"),
            Language::Ar => ("تقدير", "يدوي"),
        };
        if estimated {
            estimate
        } else {
            manual
        }
    }

    pub fn weekday(self, day: Weekday) -> &'static str {
        let names = match self {
            Language::De => ["Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag"],
            Language::En => ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"],
            Language::Fr => ["lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche"],
            Language::Es => ["lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo"],
            Language::Tr => ["Pazartesi", "Salı", "Çarşamba", "Perşembe", "Cuma", "Cumartesi", "Pazar"],
            Language::Ar => ["الاثنين", "الثلاثاء", "الأربعاء", "الخميس", "الجمعة", "السبت", "الأحد"],
        };
        names[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = VitalLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| VitalLogError::UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes_round_trip() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
        assert!("xx".parse::<Language>().is_err());
        assert_eq!(Language::default(), Language::De);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Language::En.slot_label(TimeSlot::Night), "Night");
        assert_eq!(Language::De.slot_label(TimeSlot::Morning), "Früh");
        assert_eq!(Language::En.status_label(true), "Estimated");
        assert_eq!(Language::En.status_label(false), "Manual");
        assert_eq!(Language::Fr.weekday(Weekday::Sun), "dimanche");
    }
}
