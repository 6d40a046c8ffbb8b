//! VitalLog: personal blood pressure, pulse and blood glucose journal
//!
//! Readings are recorded in four daily time slots (morning, noon, evening,
//! night). Slots left empty on a saved day are filled with standard values and
//! flagged as estimated so they never count as measurements.
//!
//! Usage:
//!   vitallog add --morning 110,125,82,70   - Record today's morning values
//!   vitallog list                          - Show all entries
//!   vitallog stats                         - Average glucose and eHbA1c
//!   vitallog --help                        - Show help
//!   VITALLOG_DBG=1 vitallog list           - Enable debug output

mod backup;
mod config;
mod dates;
mod error;
mod export;
mod i18n;
mod journal;
mod merge;
mod models;
mod ranges;
mod stats;
mod storage;
mod units;

use chrono::Utc;
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use crate::backup::{default_backup_file_name, Backup};
use crate::config::{config_file_path, default_database_path, ensure_data_dir, Config};
use crate::dates::{today, weekday_name};
use crate::error::VitalLogError;
use crate::export::{default_report_file_name, export_rows, export_to_pdf, write_csv, Report};
use crate::i18n::Language;
use crate::journal::Journal;
use crate::models::{DailyInputs, HealthEntry, SlotInput, TimeSlot};
use crate::ranges::{
    is_diastolic_out_of_range, is_glucose_out_of_range, is_pulse_out_of_range, is_systolic_out_of_range, Metric,
};
use crate::storage::SqliteStore;
use crate::units::GlucoseUnit;

fn main() -> Result<(), VitalLogError> {
    let args: Vec<String> = env::args().collect();

    let debug_mode = env::var("VITALLOG_DBG").is_ok();
    if debug_mode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    }

    match args.get(1).map(|s| s.as_str()) {
        None | Some("--help") | Some("-h") | Some("help") => {
            print_help();
            return Ok(());
        }
        Some("--version") | Some("-V") => {
            println!("vitallog {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("path") | Some("paths") => {
            cmd_show_paths();
            return Ok(());
        }
        _ => {}
    }

    if let Err(e) = ensure_data_dir() {
        eprintln!("Warning: Could not create data directory: {}", e);
    }

    let cfg_path = config_file_path();
    if !cfg_path.exists() {
        if let Err(e) = Config::create_default(&cfg_path) {
            warn!("Could not create default config: {}", e);
        }
    }

    // Data directory first, then current directory
    let config = Config::load(config_file_path())
        .or_else(|_| Config::load("config.txt"))
        .unwrap_or_else(|e| {
            warn!("Could not load config: {}. Using defaults.", e);
            Config::default()
        });

    let db_path = config.database_path();
    info!("Using database {}", db_path.display());
    let mut journal = Journal::open(SqliteStore::new(&db_path)?)?;

    let rest = &args[2..];
    match args[1].as_str() {
        "add" => cmd_add(&mut journal, rest),
        "list" | "ls" => {
            cmd_list(&journal);
            Ok(())
        }
        "days" => {
            cmd_days(&journal);
            Ok(())
        }
        "stats" => {
            cmd_stats(&journal);
            Ok(())
        }
        "delete" | "rm" => cmd_delete(&mut journal, rest),
        "delete-day" => cmd_delete_day(&mut journal, rest),
        "reset" => {
            journal.reset()?;
            eprintln!("All entries and profile data removed.");
            Ok(())
        }
        "profile" => cmd_profile(&mut journal, rest),
        "unit" => cmd_unit(&mut journal, rest),
        "lang" | "language" => cmd_language(&mut journal, rest),
        "export" => cmd_export(&journal, &config, rest),
        "backup" => cmd_backup(&journal, &config, rest),
        "import" | "restore" => cmd_import(&mut journal, rest),
        other => Err(VitalLogError::Usage(format!(
            "Unknown command '{}'. Run 'vitallog help' for usage.",
            other
        ))),
    }
}

type CliJournal = Journal<SqliteStore>;

/// Show data paths
fn cmd_show_paths() {
    use crate::config::{default_export_dir, get_data_dir};

    println!("VitalLog Data Paths:");
    println!("  Data directory:  {}", get_data_dir().display());
    println!("  Database:        {}", default_database_path().display());
    println!("  Config file:     {}", config_file_path().display());
    println!("  Export default:  {}", default_export_dir().display());
}

/// Value following a `--flag`
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>, VitalLogError> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| VitalLogError::Usage(format!("{} needs a value", flag))),
        None => Ok(None),
    }
}

/// "glucose,systolic,diastolic,pulse"; missing trailing parts stay empty
fn parse_slot_arg(text: &str) -> Result<SlotInput, VitalLogError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() > 4 {
        return Err(VitalLogError::Usage(format!(
            "Too many values in '{}' (expected glucose,systolic,diastolic,pulse)",
            text
        )));
    }
    let part = |i: usize| parts.get(i).copied().unwrap_or("");
    Ok(SlotInput::new(part(0), part(1), part(2), part(3)))
}

fn cmd_add(journal: &mut CliJournal, args: &[String]) -> Result<(), VitalLogError> {
    let date = flag_value(args, "--date")?.map(str::to_string).unwrap_or_else(today);

    let mut inputs = DailyInputs::new();
    for (slot, flag) in [
        (TimeSlot::Morning, "--morning"),
        (TimeSlot::Noon, "--noon"),
        (TimeSlot::Evening, "--evening"),
        (TimeSlot::Night, "--night"),
    ] {
        if let Some(value) = flag_value(args, flag)? {
            inputs.set(slot, parse_slot_arg(value)?);
        }
    }

    let report = journal.save_day(&date, &mut inputs, Utc::now().timestamp_millis())?;
    eprintln!(
        "Saved {}: {} new, {} updated",
        date,
        report.created.len(),
        report.updated.len()
    );
    Ok(())
}

fn cmd_list(journal: &CliJournal) {
    let unit = journal.unit();
    let language = journal.language();

    if journal.entries().is_empty() {
        eprintln!("No entries yet.");
        return;
    }

    println!(
        "{:<12} {:<11} {:<9} {:>10} {:>9} {:>6}  {:<10} ID",
        "Date", "Day", "Time", unit.label(), "RR", "Pulse", "Status"
    );
    for entry in journal.entries() {
        let values = MarkedValues::new(entry, unit);
        println!(
            "{:<12} {:<11} {:<9} {:>10} {:>9} {:>6}  {:<10} {}",
            entry.date,
            weekday_name(&entry.date, language),
            language.slot_label(entry.time_slot),
            values.glucose,
            values.pressure,
            values.pulse,
            language.status_label(entry.is_estimated()),
            entry.id
        );
    }
    println!();
    println!("! outside the normal range, ~ estimated");
}

/// Display texts with `!` after real out-of-range values and `~` after
/// estimated ones
struct MarkedValues {
    glucose: String,
    pressure: String,
    pulse: String,
}

impl MarkedValues {
    fn new(entry: &HealthEntry, unit: GlucoseUnit) -> Self {
        let glucose_high = is_glucose_out_of_range(&entry.glucose, GlucoseUnit::MgDl);
        let pressure_high = is_systolic_out_of_range(&entry.systolic) || is_diastolic_out_of_range(&entry.diastolic);

        Self {
            glucose: mark(unit.format(&entry.glucose), entry.glucose_is_estimated, glucose_high),
            pressure: mark(
                format!("{}/{}", entry.systolic, entry.diastolic),
                entry.pressure_is_estimated,
                pressure_high,
            ),
            pulse: mark(entry.pulse.clone(), false, is_pulse_out_of_range(&entry.pulse)),
        }
    }
}

fn mark(text: String, estimated: bool, out_of_range: bool) -> String {
    if estimated {
        format!("{}~", text)
    } else if out_of_range {
        format!("{}!", text)
    } else {
        text
    }
}

fn cmd_days(journal: &CliJournal) {
    let unit = journal.unit();
    let language = journal.language();

    for day in journal.day_summaries() {
        let filled = if day.is_complete() {
            String::new()
        } else {
            format!(" ({}/4)", day.entries().count())
        };
        println!("{} {}{}", day.date, weekday_name(&day.date, language), filled);
        for slot in TimeSlot::ALL {
            match day.entry(slot) {
                Some(e) => {
                    let values = MarkedValues::new(e, unit);
                    println!(
                        "  {:<9} {:>10} {:>9} {:>5}",
                        language.slot_label(slot),
                        values.glucose,
                        values.pressure,
                        values.pulse
                    )
                }
                None => println!("  {:<9} -", language.slot_label(slot)),
            }
        }
    }
}

fn cmd_stats(journal: &CliJournal) {
    let unit = journal.unit();

    println!("Entries: {}", journal.entries().len());
    match journal.glucose_summary() {
        Some(summary) => {
            println!("Measured glucose readings: {}", summary.count);
            println!("Average glucose: {}", summary.format_average(unit));
            println!("eHbA1c (statistical estimate): {}", summary.format_hba1c());
        }
        None => println!("No measured glucose readings."),
    }

    let counts = journal.out_of_range();
    println!("Outside normal range: {}", counts.total());
    for metric in Metric::ALL {
        println!(
            "  {:<10} {:>4}  (normal {} {})",
            metric.label(),
            counts.get(metric),
            metric.thresholds(unit).format_range(),
            metric.unit_label(unit)
        );
    }
}

fn cmd_delete(journal: &mut CliJournal, ids: &[String]) -> Result<(), VitalLogError> {
    if ids.is_empty() {
        return Err(VitalLogError::Usage("delete needs at least one entry id".to_string()));
    }
    let removed = match ids {
        [id] => journal.delete_entry(id)?,
        _ => journal.delete_entries(ids)?,
    };
    eprintln!("Deleted {} entries", removed);
    Ok(())
}

fn cmd_delete_day(journal: &mut CliJournal, dates: &[String]) -> Result<(), VitalLogError> {
    if dates.is_empty() {
        return Err(VitalLogError::Usage("delete-day needs at least one date".to_string()));
    }
    let removed = match dates {
        [date] => journal.delete_day(date)?,
        _ => journal.delete_days(dates)?,
    };
    eprintln!("Deleted {} entries", removed);
    Ok(())
}

fn cmd_profile(journal: &mut CliJournal, args: &[String]) -> Result<(), VitalLogError> {
    let name = flag_value(args, "--name")?;
    let birthday = flag_value(args, "--birthday")?;
    if name.is_some() || birthday.is_some() {
        journal.set_profile(name, birthday)?;
    }

    let profile = journal.profile();
    if profile.is_anonymous() {
        eprintln!("No patient details set; reports use \"Patient\". Set them with --name and --birthday.");
    }
    println!("Name:     {}", profile.display_name());
    println!("Birthday: {}", if profile.birthday.is_empty() { "-" } else { profile.birthday.as_str() });
    println!("Unit:     {}", profile.preferred_unit);
    Ok(())
}

fn cmd_unit(journal: &mut CliJournal, args: &[String]) -> Result<(), VitalLogError> {
    if let Some(value) = args.first() {
        journal.set_unit(value.parse::<GlucoseUnit>()?)?;
    }
    println!("{}", journal.unit());
    Ok(())
}

fn cmd_language(journal: &mut CliJournal, args: &[String]) -> Result<(), VitalLogError> {
    if let Some(value) = args.first() {
        journal.set_language(value.parse::<Language>()?)?;
    }
    println!("{}", journal.language());
    Ok(())
}

/// Explicit path, or a file name in the export directory
fn output_path(config: &Config, explicit: Option<&String>, file_name: String) -> PathBuf {
    match explicit {
        Some(path) => PathBuf::from(path),
        None => config.export_dir().join(file_name),
    }
}

fn cmd_export(journal: &CliJournal, config: &Config, args: &[String]) -> Result<(), VitalLogError> {
    let date = today();
    let name = &journal.profile().name;

    match args.first().map(|s| s.as_str()) {
        Some("csv") => {
            let path = output_path(config, args.get(1), default_report_file_name(name, &date, "csv"));
            let rows = export_rows(journal.entries(), journal.language(), &date);
            write_csv(&path, &rows)?;
            eprintln!("Exported to {}", path.display());
        }
        Some("pdf") => {
            let path = output_path(config, args.get(1), default_report_file_name(name, &date, "pdf"));
            let report = Report::new(journal.entries(), journal.profile(), &date);
            export_to_pdf(&path, &report)?;
            eprintln!("Exported to {}", path.display());
        }
        _ => {
            return Err(VitalLogError::Usage("usage: vitallog export csv|pdf [path]".to_string()));
        }
    }
    Ok(())
}

fn cmd_backup(journal: &CliJournal, config: &Config, args: &[String]) -> Result<(), VitalLogError> {
    let path = output_path(config, args.first(), default_backup_file_name(&today()));
    journal.backup(Utc::now()).write(&path)?;
    eprintln!("Backup saved to {}", path.display());
    Ok(())
}

fn cmd_import(journal: &mut CliJournal, args: &[String]) -> Result<(), VitalLogError> {
    let path = args
        .first()
        .ok_or_else(|| VitalLogError::Usage("usage: vitallog import <backup.json>".to_string()))?;
    let backup = Backup::read(path)?;
    let count = backup.entries.len();
    journal.restore(backup)?;
    eprintln!("Imported {} entries from {}", count, path);
    Ok(())
}

fn print_help() {
    eprintln!("VitalLog health journal v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  vitallog add [--date DD.MM.YYYY] [--morning G,S,D,P] [--noon G,S,D,P]");
    eprintln!("               [--evening G,S,D,P] [--night G,S,D,P]");
    eprintln!("                               Record readings (glucose,systolic,diastolic,pulse)");
    eprintln!("  vitallog list                List all entries");
    eprintln!("  vitallog days                Entries grouped by day, newest first");
    eprintln!("  vitallog stats               Average glucose, eHbA1c, out-of-range counts");
    eprintln!("  vitallog delete <id>...      Delete entries by id");
    eprintln!("  vitallog delete-day <date>...  Delete all entries of the given days");
    eprintln!("  vitallog reset               Delete all entries and profile data");
    eprintln!("  vitallog profile [--name N] [--birthday B]");
    eprintln!("  vitallog unit [mg/dl|mmol/l] Show or set the glucose unit");
    eprintln!("  vitallog lang [de|en|fr|es|tr|ar]");
    eprintln!("  vitallog export csv|pdf [path]");
    eprintln!("  vitallog backup [path]       Write a JSON backup");
    eprintln!("  vitallog import <path>       Restore a JSON backup");
    eprintln!("  vitallog path                Show data file locations");
    eprintln!("  vitallog help                Show this help");
    eprintln!();
    eprintln!("Empty slots of a saved day are filled with standard values");
    eprintln!("(glucose 100 mg/dL, 120/80 mmHg, pulse 72) and marked as estimated.");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("  VITALLOG_DBG=1               Enable debug output");
    eprintln!();
    eprintln!("DATA LOCATIONS:");
    eprintln!("  Database:  {}", default_database_path().display());
    eprintln!("  Config:    {}", config_file_path().display());
}
