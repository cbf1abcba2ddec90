use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::dates::{format_iso_date, parse_iso_date};
use crate::logs::dto::HabitValue;
use crate::trackables::dto::TrackingType;
use crate::transfer::csv::{
    column_value, defang_cell, scan_sections, write_row, Section, SectionBlock,
};

// --- export ---

#[derive(Debug, Clone)]
pub struct SymptomLogRow {
    pub logged_at: OffsetDateTime,
    pub symptom_name: String,
    pub severity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MoodLogRow {
    pub logged_at: OffsetDateTime,
    pub mood_score: i32,
    pub energy_level: Option<i32>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MedicationLogRow {
    pub created_at: OffsetDateTime,
    pub taken_at: Option<OffsetDateTime>,
    pub medication_name: String,
    pub taken: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HabitLogRow {
    pub logged_at: OffsetDateTime,
    pub habit_name: String,
    pub value_boolean: Option<bool>,
    pub value_numeric: Option<f64>,
    pub value_duration: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExportData {
    pub symptom_logs: Vec<SymptomLogRow>,
    pub mood_logs: Vec<MoodLogRow>,
    pub medication_logs: Vec<MedicationLogRow>,
    pub habit_logs: Vec<HabitLogRow>,
}

fn opt_i32(v: Option<i32>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

fn habit_value_cell(row: &HabitLogRow) -> String {
    if let Some(b) = row.value_boolean {
        yes_no(b).to_string()
    } else if let Some(n) = row.value_numeric {
        n.to_string()
    } else if let Some(d) = row.value_duration {
        d.to_string()
    } else {
        String::new()
    }
}

/// Serializes the four sections in their fixed order. This is the write side
/// of the file-format contract in `csv::Section`.
pub fn render_csv(data: &ExportData) -> String {
    let mut out = String::new();

    for section in Section::ALL {
        out.push_str(section.label());
        out.push('\n');
        write_row(&mut out, section.columns());
        match section {
            Section::SymptomLogs => {
                for row in &data.symptom_logs {
                    write_row(
                        &mut out,
                        &[
                            &format_iso_date(row.logged_at.date()),
                            &row.symptom_name,
                            &row.severity.to_string(),
                            row.notes.as_deref().unwrap_or(""),
                        ],
                    );
                }
            }
            Section::MoodLogs => {
                for row in &data.mood_logs {
                    write_row(
                        &mut out,
                        &[
                            &format_iso_date(row.logged_at.date()),
                            &row.mood_score.to_string(),
                            &opt_i32(row.energy_level),
                            &opt_i32(row.stress_level),
                            row.notes.as_deref().unwrap_or(""),
                        ],
                    );
                }
            }
            Section::MedicationLogs => {
                for row in &data.medication_logs {
                    let date = row.taken_at.unwrap_or(row.created_at).date();
                    write_row(
                        &mut out,
                        &[
                            &format_iso_date(date),
                            &row.medication_name,
                            yes_no(row.taken),
                            row.notes.as_deref().unwrap_or(""),
                        ],
                    );
                }
            }
            Section::HabitLogs => {
                for row in &data.habit_logs {
                    write_row(
                        &mut out,
                        &[
                            &format_iso_date(row.logged_at.date()),
                            &row.habit_name,
                            &habit_value_cell(row),
                            row.notes.as_deref().unwrap_or(""),
                        ],
                    );
                }
            }
        }
        out.push('\n');
    }
    out
}

// --- import ---

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub symptom_logs: u32,
    pub mood_logs: u32,
    pub medication_logs: u32,
    pub habit_logs: u32,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub imported: ImportCounts,
    pub skipped: ImportCounts,
    pub errors: Vec<String>,
}

/// Name -> id lookups for the importing user. Symptom and habit names
/// resolve against system + user rows, medications against the user's own
/// only. First case-insensitive match wins; duplicate names are not
/// disambiguated further.
#[derive(Debug, Default)]
pub struct TrackableCatalog {
    pub symptoms: Vec<(String, Uuid)>,
    pub medications: Vec<(String, Uuid)>,
    pub habits: Vec<(String, Uuid, TrackingType)>,
}

impl TrackableCatalog {
    fn symptom(&self, name: &str) -> Option<Uuid> {
        let needle = name.trim().to_lowercase();
        self.symptoms
            .iter()
            .find(|(n, _)| n.to_lowercase() == needle)
            .map(|(_, id)| *id)
    }

    fn medication(&self, name: &str) -> Option<Uuid> {
        let needle = name.trim().to_lowercase();
        self.medications
            .iter()
            .find(|(n, _)| n.to_lowercase() == needle)
            .map(|(_, id)| *id)
    }

    fn habit(&self, name: &str) -> Option<(Uuid, TrackingType)> {
        let needle = name.trim().to_lowercase();
        self.habits
            .iter()
            .find(|(n, _, _)| n.to_lowercase() == needle)
            .map(|(_, id, t)| (*id, *t))
    }
}

#[derive(Debug, Clone)]
pub struct NewSymptomLog {
    pub symptom_id: Uuid,
    pub severity: i32,
    pub notes: Option<String>,
    pub logged_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMoodLog {
    pub mood_score: i32,
    pub energy_level: Option<i32>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
    pub logged_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMedicationLog {
    pub medication_id: Uuid,
    pub taken: bool,
    pub taken_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewHabitLog {
    pub habit_id: Uuid,
    pub value: HabitValue,
    pub notes: Option<String>,
    pub logged_at: OffsetDateTime,
}

/// Rows that passed validation (tagged with their 1-based row number) plus
/// the skip counters and error strings for the rows that did not.
#[derive(Debug, Default)]
pub struct ImportPlan {
    pub symptom_logs: Vec<(usize, NewSymptomLog)>,
    pub mood_logs: Vec<(usize, NewMoodLog)>,
    pub medication_logs: Vec<(usize, NewMedicationLog)>,
    pub habit_logs: Vec<(usize, NewHabitLog)>,
    pub skipped: ImportCounts,
    pub errors: Vec<String>,
}

fn clean_notes(raw: &str) -> Option<String> {
    let cleaned = defang_cell(raw);
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn parse_date_cell(raw: &str) -> Result<OffsetDateTime, String> {
    parse_iso_date(raw.trim())
        .map(|d| d.midnight().assume_utc())
        .ok_or_else(|| format!("invalid date \"{}\"", raw.trim()))
}

fn parse_bounded_int(raw: &str, lo: i32, hi: i32, what: &str) -> Result<i32, String> {
    let value: i32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{what} must be an integer between {lo} and {hi}"))?;
    if value < lo || value > hi {
        return Err(format!("{what} must be an integer between {lo} and {hi}"));
    }
    Ok(value)
}

/// Empty cell means absent, not invalid.
fn parse_optional_int(raw: &str, lo: i32, hi: i32, what: &str) -> Result<Option<i32>, String> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_bounded_int(raw, lo, hi, what).map(Some)
}

fn parse_yes_no(raw: &str, what: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(format!("{what} must be yes or no")),
    }
}

fn parse_habit_value(raw: &str, tracking_type: TrackingType) -> Result<HabitValue, String> {
    let raw = raw.trim();
    match tracking_type {
        TrackingType::Boolean => parse_yes_no(raw, "value").map(HabitValue::Boolean),
        TrackingType::Numeric => raw
            .parse::<f64>()
            .map(HabitValue::Numeric)
            .map_err(|_| format!("invalid numeric value \"{raw}\"")),
        TrackingType::Duration => raw
            .parse::<i32>()
            .map(HabitValue::Duration)
            .map_err(|_| format!("invalid duration value \"{raw}\"")),
    }
}

fn row_error(section: Section, row_no: usize, msg: &str) -> String {
    format!("{} row {}: {}", section.label(), row_no, msg)
}

/// Validates every row of every recognized section. Pure: persistence
/// happens in `apply_import`; rows succeed or fail independently.
pub fn plan_import(text: &str, catalog: &TrackableCatalog) -> ImportPlan {
    let mut plan = ImportPlan::default();
    for block in scan_sections(text) {
        match block.section {
            Section::SymptomLogs => plan_symptom_rows(&block, catalog, &mut plan),
            Section::MoodLogs => plan_mood_rows(&block, &mut plan),
            Section::MedicationLogs => plan_medication_rows(&block, catalog, &mut plan),
            Section::HabitLogs => plan_habit_rows(&block, catalog, &mut plan),
        }
    }
    plan
}

fn plan_symptom_rows(block: &SectionBlock, catalog: &TrackableCatalog, plan: &mut ImportPlan) {
    for (i, row) in block.rows.iter().enumerate() {
        let row_no = i + 1;
        let result = (|| {
            let logged_at = parse_date_cell(column_value(&block.columns, row, "date"))?;
            let name = column_value(&block.columns, row, "symptom_name");
            let symptom_id = catalog
                .symptom(name)
                .ok_or_else(|| format!("symptom \"{}\" not found", name.trim()))?;
            let severity = parse_bounded_int(
                column_value(&block.columns, row, "severity"),
                1,
                10,
                "severity",
            )?;
            Ok::<_, String>(NewSymptomLog {
                symptom_id,
                severity,
                notes: clean_notes(column_value(&block.columns, row, "notes")),
                logged_at,
            })
        })();
        match result {
            Ok(log) => plan.symptom_logs.push((row_no, log)),
            Err(msg) => {
                plan.skipped.symptom_logs += 1;
                plan.errors.push(row_error(block.section, row_no, &msg));
            }
        }
    }
}

fn plan_mood_rows(block: &SectionBlock, plan: &mut ImportPlan) {
    for (i, row) in block.rows.iter().enumerate() {
        let row_no = i + 1;
        let result = (|| {
            let logged_at = parse_date_cell(column_value(&block.columns, row, "date"))?;
            let mood_score = parse_bounded_int(
                column_value(&block.columns, row, "mood_score"),
                1,
                5,
                "mood_score",
            )?;
            let energy_level = parse_optional_int(
                column_value(&block.columns, row, "energy_level"),
                1,
                5,
                "energy_level",
            )?;
            let stress_level = parse_optional_int(
                column_value(&block.columns, row, "stress_level"),
                1,
                5,
                "stress_level",
            )?;
            Ok::<_, String>(NewMoodLog {
                mood_score,
                energy_level,
                stress_level,
                notes: clean_notes(column_value(&block.columns, row, "notes")),
                logged_at,
            })
        })();
        match result {
            Ok(log) => plan.mood_logs.push((row_no, log)),
            Err(msg) => {
                plan.skipped.mood_logs += 1;
                plan.errors.push(row_error(block.section, row_no, &msg));
            }
        }
    }
}

fn plan_medication_rows(block: &SectionBlock, catalog: &TrackableCatalog, plan: &mut ImportPlan) {
    for (i, row) in block.rows.iter().enumerate() {
        let row_no = i + 1;
        let result = (|| {
            let date = parse_date_cell(column_value(&block.columns, row, "date"))?;
            let name = column_value(&block.columns, row, "medication_name");
            let medication_id = catalog
                .medication(name)
                .ok_or_else(|| format!("medication \"{}\" not found", name.trim()))?;
            let taken = parse_yes_no(column_value(&block.columns, row, "taken"), "taken")?;
            Ok::<_, String>(NewMedicationLog {
                medication_id,
                taken,
                taken_at: taken.then_some(date),
                notes: clean_notes(column_value(&block.columns, row, "notes")),
                created_at: date,
            })
        })();
        match result {
            Ok(log) => plan.medication_logs.push((row_no, log)),
            Err(msg) => {
                plan.skipped.medication_logs += 1;
                plan.errors.push(row_error(block.section, row_no, &msg));
            }
        }
    }
}

fn plan_habit_rows(block: &SectionBlock, catalog: &TrackableCatalog, plan: &mut ImportPlan) {
    for (i, row) in block.rows.iter().enumerate() {
        let row_no = i + 1;
        let result = (|| {
            let logged_at = parse_date_cell(column_value(&block.columns, row, "date"))?;
            let name = column_value(&block.columns, row, "habit_name");
            let (habit_id, tracking_type) = catalog
                .habit(name)
                .ok_or_else(|| format!("habit \"{}\" not found", name.trim()))?;
            let value =
                parse_habit_value(column_value(&block.columns, row, "value"), tracking_type)?;
            Ok::<_, String>(NewHabitLog {
                habit_id,
                value,
                notes: clean_notes(column_value(&block.columns, row, "notes")),
                logged_at,
            })
        })();
        match result {
            Ok(log) => plan.habit_logs.push((row_no, log)),
            Err(msg) => {
                plan.skipped.habit_logs += 1;
                plan.errors.push(row_error(block.section, row_no, &msg));
            }
        }
    }
}

/// Validates the whole buffer, then persists row by row. An insert failure
/// skips that row and is reported alongside the validation errors.
pub async fn import_csv(
    db: &PgPool,
    user_id: Uuid,
    text: &str,
) -> anyhow::Result<ImportSummary> {
    let catalog = crate::transfer::repo::load_catalog(db, user_id).await?;
    let plan = plan_import(text, &catalog);

    let mut summary = ImportSummary {
        skipped: plan.skipped,
        errors: plan.errors,
        ..Default::default()
    };

    for (row_no, log) in &plan.symptom_logs {
        match crate::transfer::repo::insert_symptom_import(db, user_id, log).await {
            Ok(()) => summary.imported.symptom_logs += 1,
            Err(err) => {
                warn!(%user_id, row_no, "symptom log import failed: {err}");
                summary.skipped.symptom_logs += 1;
                summary.errors.push(row_error(
                    Section::SymptomLogs,
                    *row_no,
                    "could not be saved",
                ));
            }
        }
    }
    for (row_no, log) in &plan.mood_logs {
        match crate::transfer::repo::insert_mood_import(db, user_id, log).await {
            Ok(()) => summary.imported.mood_logs += 1,
            Err(err) => {
                warn!(%user_id, row_no, "mood log import failed: {err}");
                summary.skipped.mood_logs += 1;
                summary
                    .errors
                    .push(row_error(Section::MoodLogs, *row_no, "could not be saved"));
            }
        }
    }
    for (row_no, log) in &plan.medication_logs {
        match crate::transfer::repo::insert_medication_import(db, user_id, log).await {
            Ok(()) => summary.imported.medication_logs += 1,
            Err(err) => {
                warn!(%user_id, row_no, "medication log import failed: {err}");
                summary.skipped.medication_logs += 1;
                summary.errors.push(row_error(
                    Section::MedicationLogs,
                    *row_no,
                    "could not be saved",
                ));
            }
        }
    }
    for (row_no, log) in &plan.habit_logs {
        match crate::transfer::repo::insert_habit_import(db, user_id, log).await {
            Ok(()) => summary.imported.habit_logs += 1,
            Err(err) => {
                warn!(%user_id, row_no, "habit log import failed: {err}");
                summary.skipped.habit_logs += 1;
                summary
                    .errors
                    .push(row_error(Section::HabitLogs, *row_no, "could not be saved"));
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn catalog() -> TrackableCatalog {
        TrackableCatalog {
            symptoms: vec![
                ("Headache".to_string(), Uuid::new_v4()),
                ("Fatigue".to_string(), Uuid::new_v4()),
            ],
            medications: vec![("Ibuprofen".to_string(), Uuid::new_v4())],
            habits: vec![
                ("Exercise".to_string(), Uuid::new_v4(), TrackingType::Duration),
                ("Water".to_string(), Uuid::new_v4(), TrackingType::Boolean),
                ("Steps".to_string(), Uuid::new_v4(), TrackingType::Numeric),
            ],
        }
    }

    #[test]
    fn export_import_round_trip_reproduces_counts() {
        let data = ExportData {
            symptom_logs: vec![SymptomLogRow {
                logged_at: datetime!(2024-03-01 08:00 UTC),
                symptom_name: "Headache".to_string(),
                severity: 6,
                notes: Some("after, a \"long\" day".to_string()),
            }],
            mood_logs: vec![MoodLogRow {
                logged_at: datetime!(2024-03-01 21:00 UTC),
                mood_score: 4,
                energy_level: None,
                stress_level: Some(2),
                notes: None,
            }],
            medication_logs: vec![MedicationLogRow {
                created_at: datetime!(2024-03-02 09:00 UTC),
                taken_at: Some(datetime!(2024-03-02 09:00 UTC)),
                medication_name: "Ibuprofen".to_string(),
                taken: true,
                notes: None,
            }],
            habit_logs: vec![
                HabitLogRow {
                    logged_at: datetime!(2024-03-02 07:00 UTC),
                    habit_name: "Exercise".to_string(),
                    value_boolean: None,
                    value_numeric: None,
                    value_duration: Some(45),
                    notes: None,
                },
                HabitLogRow {
                    logged_at: datetime!(2024-03-02 22:00 UTC),
                    habit_name: "Water".to_string(),
                    value_boolean: Some(true),
                    value_numeric: None,
                    value_duration: None,
                    notes: None,
                },
            ],
        };

        let text = render_csv(&data);
        let plan = plan_import(&text, &catalog());

        assert_eq!(plan.errors, Vec::<String>::new());
        assert_eq!(plan.skipped, ImportCounts::default());
        assert_eq!(plan.symptom_logs.len(), 1);
        assert_eq!(plan.mood_logs.len(), 1);
        assert_eq!(plan.medication_logs.len(), 1);
        assert_eq!(plan.habit_logs.len(), 2);
        assert_eq!(plan.habit_logs[0].1.value, HabitValue::Duration(45));
        assert_eq!(plan.habit_logs[1].1.value, HabitValue::Boolean(true));
        assert_eq!(
            plan.symptom_logs[0].1.notes.as_deref(),
            Some("after, a \"long\" day")
        );
    }

    #[test]
    fn mood_rows_fail_independently() {
        let text = "\
Mood Logs
date,mood_score,energy_level,stress_level,notes
2024-03-01,4,3,2,fine
not-a-date,4,,,
2024-03-03,9,,,
";
        let plan = plan_import(text, &catalog());
        assert_eq!(plan.mood_logs.len(), 1);
        assert_eq!(plan.skipped.mood_logs, 2);
        assert_eq!(plan.errors.len(), 2);
        assert!(plan.errors[0].contains("Mood Logs row 2"));
        assert!(plan.errors[0].contains("invalid date"));
        assert!(plan.errors[1].contains("Mood Logs row 3"));
        assert!(plan.errors[1].contains("mood_score"));
    }

    #[test]
    fn empty_optional_mood_levels_are_null_not_errors() {
        let text = "\
Mood Logs
date,mood_score,energy_level,stress_level,notes
2024-03-01,3,,,
";
        let plan = plan_import(text, &catalog());
        assert_eq!(plan.errors, Vec::<String>::new());
        let (_, log) = &plan.mood_logs[0];
        assert_eq!(log.energy_level, None);
        assert_eq!(log.stress_level, None);
    }

    #[test]
    fn symptom_name_resolution_is_case_insensitive() {
        let text = "\
Symptom Logs
date,symptom_name,severity,notes
2024-03-01,HEADACHE,5,
2024-03-01,Migraine,5,
";
        let plan = plan_import(text, &catalog());
        assert_eq!(plan.symptom_logs.len(), 1);
        assert_eq!(plan.skipped.symptom_logs, 1);
        assert!(plan.errors[0].contains("symptom \"Migraine\" not found"));
    }

    #[test]
    fn medication_taken_must_be_yes_or_no() {
        let text = "\
Medication Logs
date,medication_name,taken,notes
2024-03-01,ibuprofen,YES,
2024-03-02,Ibuprofen,maybe,
2024-03-03,Ibuprofen,no,
";
        let plan = plan_import(text, &catalog());
        assert_eq!(plan.medication_logs.len(), 2);
        assert_eq!(plan.skipped.medication_logs, 1);
        assert!(plan.errors[0].contains("taken must be yes or no"));
        // taken_at follows the row's date only when taken.
        assert!(plan.medication_logs[0].1.taken_at.is_some());
        assert!(plan.medication_logs[1].1.taken_at.is_none());
    }

    #[test]
    fn habit_value_shape_follows_tracking_type() {
        let text = "\
Habit Logs
date,habit_name,value,notes
2024-03-01,Exercise,30,
2024-03-01,Exercise,half an hour,
2024-03-01,Water,yes,
2024-03-01,Steps,7.5,
2024-03-01,Steps,yes,
";
        let plan = plan_import(text, &catalog());
        assert_eq!(plan.habit_logs.len(), 3);
        assert_eq!(plan.skipped.habit_logs, 2);
        assert!(plan.errors[0].contains("row 2"));
        assert!(plan.errors[0].contains("invalid duration value"));
        assert!(plan.errors[1].contains("row 5"));
        assert!(plan.errors[1].contains("invalid numeric value"));
    }

    #[test]
    fn notes_are_defanged_on_import() {
        let text = "\
Symptom Logs
date,symptom_name,severity,notes
2024-03-01,Headache,5,=HYPERLINK(evil)
";
        let plan = plan_import(text, &catalog());
        assert_eq!(
            plan.symptom_logs[0].1.notes.as_deref(),
            Some("HYPERLINK(evil)")
        );
    }
}
