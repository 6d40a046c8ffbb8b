//! Statistics and derived views over the entry collection
//!
//! Only real measurements feed the glucose statistics: entries whose glucose
//! is a placeholder are left out so defaults never skew the average.

use serde::Serialize;
use std::cmp::Reverse;

use crate::dates::{parse_date, EntryDate};
use crate::models::{HealthEntry, TimeSlot};
use crate::ranges::{is_out_of_range, Metric};
use crate::units::{parse_integer, parse_number, to_millimolar, GlucoseUnit};

/// Average glucose and the HbA1c estimated from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucoseSummary {
    pub count: usize,
    /// Arithmetic mean in mg/dL
    pub average_glucose: f64,
    /// Statistical estimate in percent, not a lab value
    pub estimated_hba1c: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl GlucoseSummary {
    /// Summarize real glucose readings; `None` when there are none
    pub fn from_entries(entries: &[HealthEntry]) -> Option<Self> {
        let values = real_glucose_values(entries);
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let average_glucose = values.iter().sum::<f64>() / count as f64;

        Some(Self {
            count,
            average_glucose,
            estimated_hba1c: estimate_hba1c(average_glucose),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev: calculate_std_dev(&values, average_glucose),
        })
    }

    /// eHbA1c rounded to one decimal, e.g. "5.9 %"
    pub fn format_hba1c(&self) -> String {
        format!("{:.1} %", self.estimated_hba1c)
    }

    /// Average in the user's preferred unit
    pub fn format_average(&self, unit: GlucoseUnit) -> String {
        unit.format_amount(self.average_glucose)
    }
}

/// Linear estimation of HbA1c (%) from average glucose in mg/dL
pub fn estimate_hba1c(average_mg_dl: f64) -> f64 {
    (average_mg_dl + 46.7) / 28.7
}

/// Glucose values (mg/dL) that were actually measured
fn real_glucose_values(entries: &[HealthEntry]) -> Vec<f64> {
    entries
        .iter()
        .filter(|e| !e.glucose.is_empty() && !e.glucose_is_estimated)
        .filter_map(|e| parse_number(&e.glucose))
        .collect()
}

/// Sample standard deviation
fn calculate_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance: f64 = values.iter()
        .map(|&v| (v - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Out-of-range counts per metric, real measurements only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutOfRangeCounts {
    pub glucose: usize,
    pub systolic: usize,
    pub diastolic: usize,
    pub pulse: usize,
}

impl OutOfRangeCounts {
    pub fn from_entries(entries: &[HealthEntry]) -> Self {
        let mut counts = Self::default();
        let unit = GlucoseUnit::MgDl;

        for entry in entries {
            if !entry.glucose_is_estimated && is_out_of_range(Metric::Glucose, &entry.glucose, unit) {
                counts.glucose += 1;
            }
            if !entry.pressure_is_estimated {
                if is_out_of_range(Metric::Systolic, &entry.systolic, unit) {
                    counts.systolic += 1;
                }
                if is_out_of_range(Metric::Diastolic, &entry.diastolic, unit) {
                    counts.diastolic += 1;
                }
            }
            if is_out_of_range(Metric::Pulse, &entry.pulse, unit) {
                counts.pulse += 1;
            }
        }

        counts
    }

    pub fn get(&self, metric: Metric) -> usize {
        match metric {
            Metric::Glucose => self.glucose,
            Metric::Systolic => self.systolic,
            Metric::Diastolic => self.diastolic,
            Metric::Pulse => self.pulse,
        }
    }

    pub fn total(&self) -> usize {
        self.glucose + self.systolic + self.diastolic + self.pulse
    }
}

/// All entries of one date, one optional entry per slot
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: String,
    pub slots: [Option<HealthEntry>; 4],
}

impl DaySummary {
    pub fn entry(&self, slot: TimeSlot) -> Option<&HealthEntry> {
        self.slots[slot.rank() as usize - 1].as_ref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HealthEntry> {
        self.slots.iter().flatten()
    }

    /// True when every slot of the day has an entry
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

/// Group entries by date, newest date first; unreadable dates go last
pub fn day_summaries(entries: &[HealthEntry]) -> Vec<DaySummary> {
    let mut days: Vec<DaySummary> = Vec::new();

    for entry in entries {
        let index = match days.iter().position(|d| d.date == entry.date) {
            Some(index) => index,
            None => {
                days.push(DaySummary { date: entry.date.clone(), slots: Default::default() });
                days.len() - 1
            }
        };
        days[index].slots[entry.time_slot.rank() as usize - 1] = Some(entry.clone());
    }

    days.sort_by_key(|d| match parse_date(&d.date) {
        EntryDate::Valid(date) => (0, Reverse(Some(date)), d.date.clone()),
        EntryDate::Invalid => (1, Reverse(None), d.date.clone()),
    });
    days
}

/// One plotted position: a date and a slot, with whatever values exist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub time_slot: TimeSlot,
    /// In the display unit
    pub glucose: Option<f64>,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub pulse: Option<f64>,
    pub glucose_is_estimated: bool,
    pub pressure_is_estimated: bool,
}

/// Four points per distinct date, in chronological order.
///
/// Slots without an entry produce a point with no values so the chart keeps
/// a fixed spacing per day.
pub fn chart_series(entries: &[HealthEntry], unit: GlucoseUnit) -> Vec<ChartPoint> {
    let mut dates: Vec<&str> = Vec::new();
    for entry in entries {
        if !dates.contains(&entry.date.as_str()) {
            dates.push(&entry.date);
        }
    }
    dates.sort_by(|a, b| parse_date(a).cmp(&parse_date(b)).then_with(|| a.cmp(b)));

    let mut points = Vec::with_capacity(dates.len() * TimeSlot::ALL.len());
    for date in dates {
        for slot in TimeSlot::ALL {
            let entry = entries.iter().find(|e| e.is_for(date, slot));
            points.push(match entry {
                Some(e) => ChartPoint {
                    date: date.to_string(),
                    time_slot: slot,
                    glucose: glucose_for_display(&e.glucose, unit),
                    systolic: parse_integer(&e.systolic).map(|v| v as f64),
                    diastolic: parse_integer(&e.diastolic).map(|v| v as f64),
                    pulse: parse_integer(&e.pulse).map(|v| v as f64),
                    glucose_is_estimated: e.glucose_is_estimated,
                    pressure_is_estimated: e.pressure_is_estimated,
                },
                None => ChartPoint {
                    date: date.to_string(),
                    time_slot: slot,
                    glucose: None,
                    systolic: None,
                    diastolic: None,
                    pulse: None,
                    glucose_is_estimated: false,
                    pressure_is_estimated: false,
                },
            });
        }
    }
    points
}

fn glucose_for_display(mg_dl: &str, unit: GlucoseUnit) -> Option<f64> {
    match unit {
        GlucoseUnit::MgDl => parse_integer(mg_dl).map(|v| v as f64),
        GlucoseUnit::MmolL => parse_number(&to_millimolar(mg_dl)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, slot: TimeSlot, glucose: &str, glucose_auto: bool) -> HealthEntry {
        HealthEntry {
            id: format!("{}-{}", date, slot),
            date: date.to_string(),
            time_slot: slot,
            glucose: glucose.to_string(),
            systolic: "120".to_string(),
            diastolic: "80".to_string(),
            pulse: "72".to_string(),
            glucose_is_estimated: glucose_auto,
            pressure_is_estimated: false,
            created_at: 0,
        }
    }

    #[test]
    fn test_summary_excludes_estimates() {
        let entries = vec![
            entry("01.01.2024", TimeSlot::Morning, "200", true),
            entry("01.01.2024", TimeSlot::Noon, "200", true),
            entry("01.01.2024", TimeSlot::Evening, "100", false),
        ];
        let summary = GlucoseSummary::from_entries(&entries).unwrap();
        assert_eq!(summary.count, 1);
        assert!((summary.average_glucose - 100.0).abs() < 1e-9);
        assert!((summary.estimated_hba1c - 146.7 / 28.7).abs() < 1e-9);
        assert_eq!(summary.format_hba1c(), "5.1 %");
    }

    #[test]
    fn test_summary_unavailable_without_real_values() {
        assert_eq!(GlucoseSummary::from_entries(&[]), None);

        let entries = vec![
            entry("01.01.2024", TimeSlot::Morning, "100", true),
            entry("01.01.2024", TimeSlot::Noon, "", false),
        ];
        assert_eq!(GlucoseSummary::from_entries(&entries), None);
    }

    #[test]
    fn test_summary_spread() {
        let entries = vec![
            entry("01.01.2024", TimeSlot::Morning, "100", false),
            entry("01.01.2024", TimeSlot::Noon, "140", false),
            entry("01.01.2024", TimeSlot::Evening, "180", false),
        ];
        let summary = GlucoseSummary::from_entries(&entries).unwrap();
        assert!((summary.average_glucose - 140.0).abs() < 1e-9);
        assert_eq!(summary.min, 100.0);
        assert_eq!(summary.max, 180.0);
        assert!((summary.std_dev - 40.0).abs() < 1e-9);
        assert_eq!(summary.format_average(GlucoseUnit::MgDl), "140 mg/dL");
        assert_eq!(summary.format_average(GlucoseUnit::MmolL), "7.8 mmol/L");
    }

    #[test]
    fn test_out_of_range_counts() {
        let mut high = entry("01.01.2024", TimeSlot::Morning, "200", false);
        high.systolic = "150".to_string();
        high.pulse = "55".to_string();
        let mut placeholder = entry("01.01.2024", TimeSlot::Noon, "30", true);
        placeholder.pressure_is_estimated = true;
        placeholder.diastolic = "100".to_string();
        let normal = entry("01.01.2024", TimeSlot::Evening, "100", false);

        let counts = OutOfRangeCounts::from_entries(&[high, placeholder, normal]);
        assert_eq!(counts.glucose, 1);
        assert_eq!(counts.systolic, 1);
        assert_eq!(counts.diastolic, 0);
        assert_eq!(counts.get(Metric::Pulse), 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_day_summaries_newest_first() {
        let entries = vec![
            entry("31.12.2023", TimeSlot::Night, "100", false),
            entry("01.01.2024", TimeSlot::Morning, "110", false),
            entry("bad", TimeSlot::Morning, "90", false),
            entry("01.01.2024", TimeSlot::Evening, "120", false),
        ];
        let days = day_summaries(&entries);

        let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["01.01.2024", "31.12.2023", "bad"]);
        assert_eq!(days[0].entry(TimeSlot::Evening).unwrap().glucose, "120");
        assert!(days[0].entry(TimeSlot::Noon).is_none());
        assert_eq!(days[0].entries().count(), 2);
        assert!(!days[0].is_complete());
    }

    #[test]
    fn test_chart_series_fills_gaps() {
        let entries = vec![
            entry("02.01.2024", TimeSlot::Noon, "180", false),
            entry("01.01.2024", TimeSlot::Morning, "90", true),
        ];
        let points = chart_series(&entries, GlucoseUnit::MmolL);

        assert_eq!(points.len(), 8);
        assert_eq!(points[0].date, "01.01.2024");
        assert_eq!(points[0].glucose, Some(5.0));
        assert!(points[0].glucose_is_estimated);
        assert_eq!(points[1].glucose, None);
        assert_eq!(points[5].time_slot, TimeSlot::Noon);
        assert_eq!(points[5].glucose, Some(10.0));
        assert_eq!(points[5].systolic, Some(120.0));
    }
}
