//! Normal-range classification for the four logged metrics
//!
//! Thresholds are exclusive at both ends: a value exactly on a bound is in
//! range. Values that do not parse as numbers are always in range.

use crate::units::{parse_integer, parse_number, GlucoseUnit};

/// A logged metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Glucose,
    Systolic,
    Diastolic,
    Pulse,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Glucose, Metric::Systolic, Metric::Diastolic, Metric::Pulse];

    /// Normal range for this metric, in the given glucose unit where it applies
    pub fn thresholds(self, unit: GlucoseUnit) -> Thresholds {
        match (self, unit) {
            (Metric::Glucose, GlucoseUnit::MgDl) => Thresholds::new(70.0, 140.0),
            (Metric::Glucose, GlucoseUnit::MmolL) => Thresholds::new(3.9, 7.8),
            (Metric::Systolic, _) => Thresholds::new(90.0, 140.0),
            (Metric::Diastolic, _) => Thresholds::new(60.0, 90.0),
            (Metric::Pulse, _) => Thresholds::new(60.0, 100.0),
        }
    }

    /// Unit label for display
    pub fn unit_label(self, unit: GlucoseUnit) -> &'static str {
        match self {
            Metric::Glucose => unit.label(),
            Metric::Systolic | Metric::Diastolic => "mmHg",
            Metric::Pulse => "bpm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Glucose => "Glucose",
            Metric::Systolic => "Systolic",
            Metric::Diastolic => "Diastolic",
            Metric::Pulse => "Pulse",
        }
    }

    /// Parse a text field the way this metric is entered.
    ///
    /// Glucose may carry decimals (comma or dot); pressure and pulse are
    /// whole numbers, so only the leading integer counts.
    fn parse(self, value: &str) -> Option<f64> {
        match self {
            Metric::Glucose => parse_number(&value.replacen(',', ".", 1)),
            Metric::Systolic | Metric::Diastolic | Metric::Pulse => {
                parse_integer(value).map(|v| v as f64)
            }
        }
    }
}

/// Normal range bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl Thresholds {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Classify a numeric value against these bounds
    pub fn classify(&self, value: f64) -> ReadingRange {
        if value < self.low {
            ReadingRange::Low
        } else if value > self.high {
            ReadingRange::High
        } else {
            ReadingRange::InRange
        }
    }

    /// Get threshold display string, e.g. "70-140"
    pub fn format_range(&self) -> String {
        format!("{}-{}", self.low, self.high)
    }
}

/// Classification of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingRange {
    Low,
    InRange,
    High,
}

impl ReadingRange {
    pub fn is_out_of_range(self) -> bool {
        self != ReadingRange::InRange
    }
}

/// Classify a text value; `None` when it is not numeric
pub fn classify(metric: Metric, value: &str, unit: GlucoseUnit) -> Option<ReadingRange> {
    let number = metric.parse(value)?;
    Some(metric.thresholds(unit).classify(number))
}

/// True when the value is numeric and outside the metric's normal range
pub fn is_out_of_range(metric: Metric, value: &str, unit: GlucoseUnit) -> bool {
    classify(metric, value, unit).is_some_and(ReadingRange::is_out_of_range)
}

/// Glucose check in the unit the value is expressed in
pub fn is_glucose_out_of_range(value: &str, unit: GlucoseUnit) -> bool {
    is_out_of_range(Metric::Glucose, value, unit)
}

pub fn is_systolic_out_of_range(value: &str) -> bool {
    is_out_of_range(Metric::Systolic, value, GlucoseUnit::MgDl)
}

pub fn is_diastolic_out_of_range(value: &str) -> bool {
    is_out_of_range(Metric::Diastolic, value, GlucoseUnit::MgDl)
}

pub fn is_pulse_out_of_range(value: &str) -> bool {
    is_out_of_range(Metric::Pulse, value, GlucoseUnit::MgDl)
}
