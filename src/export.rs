//! CSV and PDF export of the journal

use log::{debug, info};
use printpdf::*;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dates::parse_date;
use crate::error::VitalLogError;
use crate::i18n::Language;
use crate::models::{HealthEntry, TimeSlot, UserProfile};
use crate::ranges::{is_out_of_range, Metric};
use crate::stats::{chart_series, ChartPoint, GlucoseSummary, OutOfRangeCounts};
use crate::units::GlucoseUnit;

/// One spreadsheet row per entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Datum")]
    pub date: String,
    #[serde(rename = "Zeitpunkt")]
    pub time_slot: String,
    #[serde(rename = "Blutzucker (mg/dl)")]
    pub glucose: String,
    #[serde(rename = "Blutdruck Sys")]
    pub systolic: String,
    #[serde(rename = "Blutdruck Dia")]
    pub diastolic: String,
    #[serde(rename = "Puls")]
    pub pulse: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Exportiert am")]
    pub exported_on: String,
}

/// Rows in entry order; glucose stays in mg/dL
pub fn export_rows(entries: &[HealthEntry], language: Language, export_date: &str) -> Vec<ExportRow> {
    entries
        .iter()
        .map(|e| ExportRow {
            date: e.date.clone(),
            time_slot: language.slot_label(e.time_slot).to_string(),
            glucose: e.glucose.clone(),
            systolic: e.systolic.clone(),
            diastolic: e.diastolic.clone(),
            pulse: e.pulse.clone(),
            status: language.status_label(e.is_estimated()).to_string(),
            exported_on: export_date.to_string(),
        })
        .collect()
}

/// Write rows with a header line
pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[ExportRow]) -> Result<(), VitalLogError> {
    if rows.is_empty() {
        return Err(VitalLogError::NothingToExport);
    }

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Exported {} rows to {}", rows.len(), path.as_ref().display());
    Ok(())
}

/// `VitalReport_<name>_<DD.MM.YYYY>.<ext>`, "Patient" when no name is set
pub fn default_report_file_name(name: &str, date: &str, extension: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { "Patient" } else { name };
    format!("VitalReport_{}_{}.{}", name, date, extension)
}

/// PDF document dimensions (A4)
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

const ROWS_PER_PAGE: usize = 35;

/// Colors
const COLOR_RED: Color = Color::Rgb(Rgb { r: 0.9, g: 0.3, b: 0.3, icc_profile: None });
const COLOR_GREEN: Color = Color::Rgb(Rgb { r: 0.3, g: 0.7, b: 0.3, icc_profile: None });
const COLOR_AMBER: Color = Color::Rgb(Rgb { r: 0.95, g: 0.65, b: 0.1, icc_profile: None });
const COLOR_BLUE: Color = Color::Rgb(Rgb { r: 0.3, g: 0.5, b: 0.8, icc_profile: None });
const COLOR_PURPLE: Color = Color::Rgb(Rgb { r: 0.55, g: 0.35, b: 0.7, icc_profile: None });
const COLOR_BLACK: Color = Color::Rgb(Rgb { r: 0.0, g: 0.0, b: 0.0, icc_profile: None });
const COLOR_GRAY: Color = Color::Rgb(Rgb { r: 0.5, g: 0.5, b: 0.5, icc_profile: None });
const COLOR_LIGHT_GRAY: Color = Color::Rgb(Rgb { r: 0.9, g: 0.9, b: 0.9, icc_profile: None });

fn color_tuple(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb { r, g, b, icc_profile: None })
}

/// Snapshot of everything the PDF report shows
pub struct Report<'a> {
    pub entries: &'a [HealthEntry],
    pub profile: &'a UserProfile,
    pub summary: Option<GlucoseSummary>,
    pub out_of_range: OutOfRangeCounts,
    pub chart: Vec<ChartPoint>,
    /// Creation date shown in the header
    pub generated: String,
}

impl<'a> Report<'a> {
    pub fn new(entries: &'a [HealthEntry], profile: &'a UserProfile, generated: &str) -> Self {
        Self {
            entries,
            profile,
            summary: GlucoseSummary::from_entries(entries),
            out_of_range: OutOfRangeCounts::from_entries(entries),
            chart: chart_series(entries, profile.preferred_unit),
            generated: generated.to_string(),
        }
    }

    fn unit(&self) -> GlucoseUnit {
        self.profile.preferred_unit
    }

    /// First and last valid entry dates
    fn date_range(&self) -> Option<(String, String)> {
        let mut valid = self.entries
            .iter()
            .filter_map(|e| parse_date(&e.date).as_date().map(|date| (date, e.date.as_str())));
        let first = valid.next()?;
        let (min, max) = valid.fold((first, first), |(lo, hi), d| {
            (if d.0 < lo.0 { d } else { lo }, if d.0 > hi.0 { d } else { hi })
        });
        Some((min.1.to_string(), max.1.to_string()))
    }
}

/// Render the report: summary, trend charts, then the data table
pub fn export_to_pdf<P: AsRef<Path>>(path: P, report: &Report) -> Result<(), VitalLogError> {
    if report.entries.is_empty() {
        return Err(VitalLogError::NothingToExport);
    }

    let mut doc = PdfDocument::new("VitalLog Report");

    let data_pages = report.entries.len().div_ceil(ROWS_PER_PAGE);
    let total_pages = data_pages + 2;

    let summary_ops = build_summary_page(report, total_pages);
    let chart_ops = build_chart_page(report, total_pages);
    let mut pages = vec![
        PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), summary_ops),
        PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), chart_ops),
    ];

    for (page_idx, chunk) in report.entries.chunks(ROWS_PER_PAGE).enumerate() {
        let data_ops = build_data_page(chunk, report.unit(), page_idx + 3, total_pages);
        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), data_ops));
    }

    doc.with_pages(pages);

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!("PDF renderer reported {} warnings", warnings.len());
    }

    let mut file = File::create(path.as_ref())
        .map_err(|e| VitalLogError::Export(format!("Failed to create file: {}", e)))?;
    file.write_all(&bytes)
        .map_err(|e| VitalLogError::Export(format!("Failed to write PDF: {}", e)))?;

    info!("Wrote {}-page report to {}", total_pages, path.as_ref().display());
    Ok(())
}

// Helper to create text operations
fn text_ops(text: &str, size: f32, x: f32, y: f32, font: BuiltinFont, color: Color) -> Vec<Op> {
    vec![
        Op::SetFillColor { col: color },
        Op::StartTextSection,
        Op::SetFontSizeBuiltinFont { size: Pt(size), font },
        Op::SetTextCursor { pos: Point::new(Mm(x), Mm(y)) },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        },
        Op::EndTextSection,
    ]
}

fn line_ops(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) -> Vec<Op> {
    vec![
        Op::SetOutlineColor { col: color },
        Op::SetOutlineThickness { pt: Pt(width) },
        Op::DrawLine {
            line: Line {
                points: vec![
                    LinePoint { p: Point::new(Mm(x1), Mm(y1)), bezier: false },
                    LinePoint { p: Point::new(Mm(x2), Mm(y2)), bezier: false },
                ],
                is_closed: false,
            },
        },
    ]
}

fn rect_points(x: f32, y: f32, width: f32, height: f32) -> Vec<LinePoint> {
    vec![
        LinePoint { p: Point::new(Mm(x), Mm(y)), bezier: false },
        LinePoint { p: Point::new(Mm(x + width), Mm(y)), bezier: false },
        LinePoint { p: Point::new(Mm(x + width), Mm(y + height)), bezier: false },
        LinePoint { p: Point::new(Mm(x), Mm(y + height)), bezier: false },
    ]
}

fn rect_fill_ops(x: f32, y: f32, width: f32, height: f32, color: Color) -> Vec<Op> {
    vec![
        Op::SetFillColor { col: color },
        Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points: rect_points(x, y, width, height) }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        },
    ]
}

fn rect_stroke_ops(x: f32, y: f32, width: f32, height: f32, color: Color, stroke_width: f32) -> Vec<Op> {
    vec![
        Op::SetOutlineColor { col: color },
        Op::SetOutlineThickness { pt: Pt(stroke_width) },
        Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points: rect_points(x, y, width, height) }],
                mode: PaintMode::Stroke,
                winding_order: WindingOrder::NonZero,
            },
        },
    ]
}

fn point_ops(x: f32, y: f32, radius: f32, color: Color) -> Vec<Op> {
    rect_fill_ops(x - radius, y - radius, radius * 2.0, radius * 2.0, color)
}

fn footer_ops(label: &str, page: usize, total_pages: usize) -> Vec<Op> {
    text_ops(
        &format!("Page {} of {} - {}", page, total_pages, label),
        8.0,
        MARGIN_MM,
        MARGIN_MM,
        BuiltinFont::Helvetica,
        COLOR_GRAY,
    )
}

/// Amber for placeholders, red for real out-of-range values
fn value_color(metric: Metric, value: &str, estimated: bool) -> Color {
    if estimated {
        COLOR_AMBER
    } else if is_out_of_range(metric, value, GlucoseUnit::MgDl) {
        COLOR_RED
    } else {
        COLOR_BLACK
    }
}

fn build_summary_page(report: &Report, total_pages: usize) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
    let unit = report.unit();

    // Title
    ops.extend(text_ops("Health Report", 24.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 10.0;
    ops.extend(text_ops(&format!("Generated: {}", report.generated), 10.0, MARGIN_MM, y, BuiltinFont::Helvetica, COLOR_GRAY));
    y -= 15.0;

    ops.extend(line_ops(MARGIN_MM, y, PAGE_WIDTH_MM - MARGIN_MM, y, COLOR_GRAY, 0.5));
    y -= 15.0;

    // Patient
    ops.extend(text_ops("Patient", 14.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 10.0;
    ops.extend(text_ops(&format!("Name: {}", report.profile.display_name()), 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
    y -= 7.0;
    let birthday = if report.profile.birthday.is_empty() { "-" } else { report.profile.birthday.as_str() };
    ops.extend(text_ops(&format!("Date of birth: {}", birthday), 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
    y -= 15.0;

    // Overview
    ops.extend(text_ops("Overview", 14.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 10.0;
    ops.extend(text_ops(&format!("Entries: {}", report.entries.len()), 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
    y -= 7.0;
    if let Some((first, last)) = report.date_range() {
        ops.extend(text_ops(&format!("Date range: {} to {}", first, last), 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
        y -= 7.0;
    }
    let estimated = report.entries.iter().filter(|e| e.is_estimated()).count();
    ops.extend(text_ops(&format!("Entries with estimated values: {}", estimated), 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_AMBER));
    y -= 15.0;

    // Glucose
    ops.extend(text_ops("Blood Glucose", 14.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 10.0;
    match &report.summary {
        Some(summary) => {
            let lines = [
                format!("Measured readings: {}", summary.count),
                format!("Average: {}", summary.format_average(unit)),
                format!("Minimum: {}", unit.format_amount(summary.min)),
                format!("Maximum: {}", unit.format_amount(summary.max)),
                format!("Standard deviation: {:.1} mg/dL", summary.std_dev),
            ];
            for line in lines {
                ops.extend(text_ops(&line, 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
                y -= 7.0;
            }

            ops.extend(text_ops(&format!("eHbA1c: {}", summary.format_hba1c()), 11.0, MARGIN_MM + 5.0, y, BuiltinFont::HelveticaBold, COLOR_BLUE));
            y -= 5.0;
            ops.extend(text_ops(
                "Statistical estimate from the average glucose, not a laboratory value.",
                8.0,
                MARGIN_MM + 5.0,
                y,
                BuiltinFont::Helvetica,
                COLOR_GRAY,
            ));
            y -= 15.0;
        }
        None => {
            ops.extend(text_ops("No measured glucose readings", 11.0, MARGIN_MM + 5.0, y, BuiltinFont::Helvetica, COLOR_GRAY));
            y -= 15.0;
        }
    }

    // Out of range
    ops.extend(text_ops("Values Outside the Normal Range", 14.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 12.0;

    let header_y = y;
    ops.extend(rect_fill_ops(MARGIN_MM, header_y - 2.5, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, 8.0, COLOR_LIGHT_GRAY));
    ops.extend(text_ops("Metric", 9.0, MARGIN_MM + 2.0, header_y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    ops.extend(text_ops("Normal range", 9.0, MARGIN_MM + 50.0, header_y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    ops.extend(text_ops("Outside", 9.0, MARGIN_MM + 110.0, header_y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 10.0;

    for metric in Metric::ALL {
        let count = report.out_of_range.get(metric);
        let range = format!("{} {}", metric.thresholds(unit).format_range(), metric.unit_label(unit));
        let color = if count > 0 { COLOR_RED } else { COLOR_GREEN };
        ops.extend(text_ops(metric.label(), 10.0, MARGIN_MM + 2.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
        ops.extend(text_ops(&range, 10.0, MARGIN_MM + 50.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
        ops.extend(text_ops(&count.to_string(), 10.0, MARGIN_MM + 110.0, y, BuiltinFont::Helvetica, color));
        y -= 8.0;
    }
    ops.extend(rect_stroke_ops(MARGIN_MM, y + 5.5, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, header_y - y + 0.5, COLOR_GRAY, 0.3));

    ops.extend(footer_ops("Summary", 1, total_pages));
    ops
}

/// Chart frame and value scale
struct ChartArea {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    min: f32,
    max: f32,
}

impl ChartArea {
    fn y_for(&self, value: f32) -> f32 {
        let pos = self.y + ((value - self.min) / (self.max - self.min)) * self.height;
        pos.max(self.y).min(self.y + self.height)
    }

    fn x_for(&self, index: usize, count: usize) -> f32 {
        if count > 1 {
            self.x + index as f32 * self.width / (count - 1) as f32
        } else {
            self.x + self.width / 2.0
        }
    }

    fn frame_ops(&self, grid: &[f32]) -> Vec<Op> {
        let mut ops = Vec::new();
        ops.extend(rect_fill_ops(self.x, self.y, self.width, self.height, color_tuple(0.97, 0.97, 0.97)));
        ops.extend(rect_stroke_ops(self.x, self.y, self.width, self.height, COLOR_BLACK, 0.5));
        for &value in grid {
            let y_pos = self.y_for(value);
            ops.extend(line_ops(self.x, y_pos, self.x + self.width, y_pos, color_tuple(0.8, 0.8, 0.8), 0.3));
            ops.extend(text_ops(&format!("{}", value), 7.0, MARGIN_MM, y_pos - 1.5, BuiltinFont::Helvetica, COLOR_GRAY));
        }
        ops
    }

    fn band_ops(&self, low: f32, high: f32, color: Color) -> Vec<Op> {
        let mut ops = Vec::new();
        for value in [low, high] {
            let y_pos = self.y_for(value);
            ops.extend(line_ops(self.x, y_pos, self.x + self.width, y_pos, color.clone(), 0.8));
        }
        ops
    }

    /// Connect consecutive values; gaps break the line
    fn series_ops<F>(&self, points: &[ChartPoint], value: F, color: Color, estimated: fn(&ChartPoint) -> bool) -> Vec<Op>
    where
        F: Fn(&ChartPoint) -> Option<f64>,
    {
        let mut ops = Vec::new();
        let n = points.len();
        let mut previous: Option<(f32, f32)> = None;

        for (i, point) in points.iter().enumerate() {
            match value(point) {
                Some(v) => {
                    let pos = (self.x_for(i, n), self.y_for(v as f32));
                    if let Some((px, py)) = previous {
                        ops.extend(line_ops(px, py, pos.0, pos.1, color.clone(), 0.6));
                    }
                    previous = Some(pos);
                }
                None => previous = None,
            }
        }

        for (i, point) in points.iter().enumerate() {
            if let Some(v) = value(point) {
                let dot = if estimated(point) { COLOR_AMBER } else { color.clone() };
                ops.extend(point_ops(self.x_for(i, n), self.y_for(v as f32), 1.0, dot));
            }
        }
        ops
    }
}

fn build_chart_page(report: &Report, total_pages: usize) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
    let unit = report.unit();

    ops.extend(text_ops("Trend", 16.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 8.0;
    ops.extend(text_ops(
        "Four points per day (morning, noon, evening, night). Amber points are estimated values.",
        8.0,
        MARGIN_MM,
        y,
        BuiltinFont::Helvetica,
        COLOR_GRAY,
    ));
    y -= 12.0;

    let points = &report.chart;
    let chart_x = MARGIN_MM + 15.0;
    let chart_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM - 20.0;

    // Glucose
    ops.extend(text_ops(&format!("Blood glucose ({})", unit.label()), 12.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 5.0;
    let (min, max, grid): (f32, f32, Vec<f32>) = match unit {
        GlucoseUnit::MgDl => (40.0, 300.0, vec![50.0, 100.0, 150.0, 200.0, 250.0, 300.0]),
        GlucoseUnit::MmolL => (2.0, 17.0, vec![4.0, 7.0, 10.0, 13.0, 16.0]),
    };
    let glucose_area = ChartArea { x: chart_x, y: y - 90.0, width: chart_width, height: 90.0, min, max };
    let thresholds = Metric::Glucose.thresholds(unit);
    ops.extend(glucose_area.frame_ops(&grid));
    ops.extend(glucose_area.band_ops(thresholds.low as f32, thresholds.high as f32, COLOR_GREEN));
    ops.extend(glucose_area.series_ops(points, |p| p.glucose, COLOR_BLUE, |p| p.glucose_is_estimated));
    y = glucose_area.y - 15.0;

    // Blood pressure and pulse
    ops.extend(text_ops("Blood pressure (mmHg) and pulse (bpm)", 12.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 5.0;
    let pressure_area = ChartArea {
        x: chart_x,
        y: y - 90.0,
        width: chart_width,
        height: 90.0,
        min: 40.0,
        max: 200.0,
    };
    ops.extend(pressure_area.frame_ops(&[60.0, 90.0, 120.0, 150.0, 180.0]));
    let systolic = Metric::Systolic.thresholds(unit);
    ops.extend(pressure_area.band_ops(systolic.low as f32, systolic.high as f32, color_tuple(0.9, 0.75, 0.75)));
    ops.extend(pressure_area.series_ops(points, |p| p.systolic, COLOR_RED, |p| p.pressure_is_estimated));
    ops.extend(pressure_area.series_ops(points, |p| p.diastolic, COLOR_BLUE, |p| p.pressure_is_estimated));
    ops.extend(pressure_area.series_ops(points, |p| p.pulse, COLOR_PURPLE, |_| false));

    // Date labels, first and last
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        let label_y = pressure_area.y - 5.0;
        ops.extend(text_ops(&first.date, 7.0, chart_x, label_y, BuiltinFont::Helvetica, COLOR_GRAY));
        ops.extend(text_ops(&last.date, 7.0, chart_x + chart_width - 14.0, label_y, BuiltinFont::Helvetica, COLOR_GRAY));
    }
    y = pressure_area.y - 15.0;

    // Legend
    ops.extend(text_ops("Legend:", 10.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 8.0;
    let legend = [
        ("Glucose / diastolic", COLOR_BLUE),
        ("Systolic", COLOR_RED),
        ("Pulse", COLOR_PURPLE),
        ("Normal range", COLOR_GREEN),
        ("Estimated", COLOR_AMBER),
    ];
    for (i, (label, color)) in legend.into_iter().enumerate() {
        let x = MARGIN_MM + i as f32 * 34.0;
        ops.extend(line_ops(x, y + 1.5, x + 8.0, y + 1.5, color, 1.2));
        ops.extend(text_ops(label, 8.0, x + 10.0, y, BuiltinFont::Helvetica, COLOR_BLACK));
    }

    ops.extend(footer_ops("Trend", 2, total_pages));
    ops
}

fn build_data_page(entries: &[HealthEntry], unit: GlucoseUnit, page: usize, total_pages: usize) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    ops.extend(text_ops("Readings", 14.0, MARGIN_MM, y, BuiltinFont::HelveticaBold, COLOR_BLACK));
    y -= 15.0;

    let col_x = [
        MARGIN_MM,
        MARGIN_MM + 25.0,
        MARGIN_MM + 48.0,
        MARGIN_MM + 78.0,
        MARGIN_MM + 96.0,
        MARGIN_MM + 114.0,
        MARGIN_MM + 132.0,
    ];
    let glucose_header = format!("Glucose {}", unit.label());
    let headers = ["Date", "Time", glucose_header.as_str(), "Sys", "Dia", "Pulse", "Status"];

    ops.extend(rect_fill_ops(MARGIN_MM, y - 6.0, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, 8.0, COLOR_LIGHT_GRAY));
    for (x, header) in col_x.iter().zip(headers) {
        ops.extend(text_ops(header, 8.0, *x, y - 4.0, BuiltinFont::HelveticaBold, COLOR_BLACK));
    }
    y -= 10.0;

    ops.extend(line_ops(MARGIN_MM, y, PAGE_WIDTH_MM - MARGIN_MM, y, COLOR_GRAY, 0.5));
    y -= 2.0;

    for (row_idx, entry) in entries.iter().enumerate() {
        y -= 6.0;

        if row_idx % 2 == 1 {
            ops.extend(rect_fill_ops(MARGIN_MM, y - 1.5, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, 7.0, color_tuple(0.95, 0.95, 0.95)));
        }

        let glucose_color = value_color(Metric::Glucose, &entry.glucose, entry.glucose_is_estimated);
        let systolic_color = value_color(Metric::Systolic, &entry.systolic, entry.pressure_is_estimated);
        let diastolic_color = value_color(Metric::Diastolic, &entry.diastolic, entry.pressure_is_estimated);
        let pulse_color = value_color(Metric::Pulse, &entry.pulse, false);
        let (status, status_color) = if entry.is_estimated() {
            (Language::En.status_label(true), COLOR_AMBER)
        } else {
            (Language::En.status_label(false), COLOR_GREEN)
        };

        let cells = [
            (entry.date.clone(), COLOR_BLACK),
            (slot_label(entry.time_slot).to_string(), COLOR_BLACK),
            (unit.format(&entry.glucose), glucose_color),
            (dash_if_empty(&entry.systolic), systolic_color),
            (dash_if_empty(&entry.diastolic), diastolic_color),
            (dash_if_empty(&entry.pulse), pulse_color),
            (status.to_string(), status_color),
        ];
        for (x, (text, color)) in col_x.iter().zip(cells) {
            ops.extend(text_ops(&text, 7.0, *x, y, BuiltinFont::Helvetica, color));
        }
    }

    ops.extend(footer_ops("Data", page, total_pages));
    ops
}

// Built-in PDF fonts only cover Latin text
fn slot_label(slot: TimeSlot) -> &'static str {
    Language::En.slot_label(slot)
}

fn dash_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
