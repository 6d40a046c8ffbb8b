//! Glucose unit types and conversion
//!
//! Glucose is always stored in mg/dL. The mmol/L unit only exists at the
//! edges: values typed by the user are converted to mg/dL before they are
//! merged, and stored values are converted back for display.
//!
//! Conversion never fails. A half-typed or non-numeric field converts to an
//! empty string so live input handling never has to deal with errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VitalLogError;

/// Molar conversion factor between mg/dL and mmol/L for glucose
pub const GLUCOSE_FACTOR: f64 = 18.0182;

/// User's preferred display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlucoseUnit {
    #[serde(rename = "mg/dL", alias = "mg/dl")]
    #[default]
    MgDl,
    #[serde(rename = "mmol/L", alias = "mmol/l")]
    MmolL,
}

impl GlucoseUnit {
    /// Get the unit label
    pub fn label(self) -> &'static str {
        match self {
            GlucoseUnit::MgDl => "mg/dL",
            GlucoseUnit::MmolL => "mmol/L",
        }
    }

    /// Convert a stored mg/dL value into this unit for display
    pub fn display_value(self, mg_dl: &str) -> String {
        match self {
            GlucoseUnit::MgDl => mg_dl.to_string(),
            GlucoseUnit::MmolL => to_millimolar(mg_dl),
        }
    }

    /// Convert a value typed in this unit into canonical mg/dL text
    pub fn to_canonical(self, typed: &str) -> String {
        match self {
            GlucoseUnit::MgDl => typed.to_string(),
            GlucoseUnit::MmolL => to_milligram(typed),
        }
    }

    /// Format a stored mg/dL value with unit suffix
    pub fn format(self, mg_dl: &str) -> String {
        let value = self.display_value(mg_dl);
        if value.is_empty() {
            return "-".to_string();
        }
        format!("{} {}", value, self.label())
    }

    /// Format a numeric mg/dL quantity (e.g. an average) in this unit
    pub fn format_amount(self, mg_dl: f64) -> String {
        match self {
            GlucoseUnit::MgDl => format!("{:.0} mg/dL", mg_dl),
            GlucoseUnit::MmolL => format!("{:.1} mmol/L", mg_dl / GLUCOSE_FACTOR),
        }
    }
}

impl fmt::Display for GlucoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GlucoseUnit {
    type Err = VitalLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mg/dl" | "mgdl" | "mg" => Ok(GlucoseUnit::MgDl),
            "mmol/l" | "mmoll" | "mmol" => Ok(GlucoseUnit::MmolL),
            _ => Err(VitalLogError::UnknownUnit(s.to_string())),
        }
    }
}

/// Convert mg/dL text to mmol/L text rounded to one decimal place.
///
/// Returns an empty string when the input has no numeric prefix.
pub fn to_millimolar(mg_dl: &str) -> String {
    match parse_number(mg_dl) {
        Some(value) => format!("{:.1}", value / GLUCOSE_FACTOR),
        None => String::new(),
    }
}

/// Convert mmol/L text (comma or dot decimal separator) to whole mg/dL text.
///
/// Returns an empty string when the input has no numeric prefix.
pub fn to_milligram(mmol_l: &str) -> String {
    match parse_number(&mmol_l.replacen(',', ".", 1)) {
        Some(value) => format!("{}", round_half_up(value * GLUCOSE_FACTOR) as i64),
        None => String::new(),
    }
}

/// Round to the nearest integer, ties toward positive infinity
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Parse the leading decimal number of a text field.
///
/// Leading whitespace is skipped and trailing garbage is ignored, so
/// `"7.2 mmol"` parses as `7.2`. Returns `None` if no digits are found.
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when it is complete
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Parse the leading integer of a text field (`"128/80"` parses as `128`).
pub fn parse_integer(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    s[..end].parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_millimolar() {
        assert_eq!(to_millimolar("180"), "10.0");
        assert_eq!(to_millimolar("100"), "5.5");
        assert_eq!(to_millimolar("70"), "3.9");
        assert_eq!(to_millimolar(""), "");
        assert_eq!(to_millimolar("abc"), "");
    }

    #[test]
    fn test_to_milligram_accepts_comma_and_dot() {
        assert_eq!(to_milligram("5.5"), "99");
        assert_eq!(to_milligram("5,5"), "99");
        assert_eq!(to_milligram("10"), "180");
        assert_eq!(to_milligram(""), "");
        assert_eq!(to_milligram("x"), "");
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        for v in 40..=400 {
            let back: i64 = to_milligram(&to_millimolar(&v.to_string()))
                .parse()
                .unwrap();
            assert!((back - v).abs() <= 1, "{} came back as {}", v, back);
        }
    }

    #[test]
    fn test_parse_number_prefix() {
        assert_eq!(parse_number("  7.2 mmol"), Some(7.2));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("12."), Some(12.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_integer_prefix() {
        assert_eq!(parse_integer("128/80"), Some(128));
        assert_eq!(parse_integer(" 90.9"), Some(90));
        assert_eq!(parse_integer("bpm"), None);
    }

    #[test]
    fn test_glucose_unit_display() {
        assert_eq!(GlucoseUnit::MgDl.format("180"), "180 mg/dL");
        assert_eq!(GlucoseUnit::MmolL.format("180"), "10.0 mmol/L");
        assert_eq!(GlucoseUnit::MmolL.format(""), "-");
        assert_eq!(GlucoseUnit::MmolL.format_amount(180.0), "10.0 mmol/L");
        assert_eq!(GlucoseUnit::MgDl.format_amount(166.66), "167 mg/dL");
    }

    #[test]
    fn test_glucose_unit_parse_and_serde() {
        assert_eq!("mmol/l".parse::<GlucoseUnit>().unwrap(), GlucoseUnit::MmolL);
        assert_eq!("MG/DL".parse::<GlucoseUnit>().unwrap(), GlucoseUnit::MgDl);
        assert!("stones".parse::<GlucoseUnit>().is_err());

        let unit: GlucoseUnit = serde_json::from_str("\"mmol/l\"").unwrap();
        assert_eq!(unit, GlucoseUnit::MmolL);
        assert_eq!(serde_json::to_string(&GlucoseUnit::MgDl).unwrap(), "\"mg/dL\"");
    }
}
