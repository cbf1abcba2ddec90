//! Plain-text PDF rendering of an export: one heading per section, one line
//! per log, paginated on A4.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::dates::format_iso_date;
use crate::transfer::service::{ExportData, HabitLogRow};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const TOP_Y: f32 = 280.0;
const BOTTOM_Y: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> anyhow::Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "body");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow::anyhow!("pdf render: {e:?}"))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow::anyhow!("pdf render: {e:?}"))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(PdfWriter {
            doc,
            layer,
            regular,
            bold,
            y: TOP_Y,
        })
    }

    fn advance(&mut self, height: f32) {
        if self.y - height < BOTTOM_Y {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "body");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
        self.y -= height;
    }

    fn heading(&mut self, text: &str) {
        self.advance(LINE_HEIGHT * 2.0);
        self.layer
            .use_text(text, HEADING_SIZE, Mm(MARGIN_LEFT), Mm(self.y), &self.bold);
    }

    fn line(&mut self, text: &str) {
        self.advance(LINE_HEIGHT);
        self.layer
            .use_text(text, BODY_SIZE, Mm(MARGIN_LEFT), Mm(self.y), &self.regular);
    }
}

fn note_suffix(notes: &Option<String>) -> String {
    match notes {
        // Notes can hold newlines; the PDF keeps each log on one line.
        Some(n) => format!(" - {}", n.replace(['\n', '\r'], " ")),
        None => String::new(),
    }
}

fn habit_value_text(row: &HabitLogRow) -> String {
    if let Some(b) = row.value_boolean {
        (if b { "done" } else { "not done" }).to_string()
    } else if let Some(n) = row.value_numeric {
        n.to_string()
    } else if let Some(d) = row.value_duration {
        format!("{d} min")
    } else {
        String::new()
    }
}

pub fn render(data: &ExportData) -> anyhow::Result<Vec<u8>> {
    let mut w = PdfWriter::new("Health Export")?;

    w.heading("Symptom Logs");
    if data.symptom_logs.is_empty() {
        w.line("No entries.");
    }
    for row in &data.symptom_logs {
        w.line(&format!(
            "{}  {} (severity {}){}",
            format_iso_date(row.logged_at.date()),
            row.symptom_name,
            row.severity,
            note_suffix(&row.notes),
        ));
    }

    w.heading("Mood Logs");
    if data.mood_logs.is_empty() {
        w.line("No entries.");
    }
    for row in &data.mood_logs {
        let mut parts = format!("mood {}", row.mood_score);
        if let Some(e) = row.energy_level {
            parts.push_str(&format!(", energy {e}"));
        }
        if let Some(s) = row.stress_level {
            parts.push_str(&format!(", stress {s}"));
        }
        w.line(&format!(
            "{}  {}{}",
            format_iso_date(row.logged_at.date()),
            parts,
            note_suffix(&row.notes),
        ));
    }

    w.heading("Medication Logs");
    if data.medication_logs.is_empty() {
        w.line("No entries.");
    }
    for row in &data.medication_logs {
        let date = row.taken_at.unwrap_or(row.created_at).date();
        w.line(&format!(
            "{}  {} ({}){}",
            format_iso_date(date),
            row.medication_name,
            if row.taken { "taken" } else { "missed" },
            note_suffix(&row.notes),
        ));
    }

    w.heading("Habit Logs");
    if data.habit_logs.is_empty() {
        w.line("No entries.");
    }
    for row in &data.habit_logs {
        w.line(&format!(
            "{}  {}: {}{}",
            format_iso_date(row.logged_at.date()),
            row.habit_name,
            habit_value_text(row),
            note_suffix(&row.notes),
        ));
    }

    w.doc
        .save_to_bytes()
        .map_err(|e| anyhow::anyhow!("pdf render: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn renders_a_nonempty_pdf() {
        let data = ExportData {
            symptom_logs: vec![crate::transfer::service::SymptomLogRow {
                logged_at: datetime!(2024-03-01 08:00 UTC),
                symptom_name: "Headache".to_string(),
                severity: 6,
                notes: Some("two\nlines".to_string()),
            }],
            ..Default::default()
        };
        let bytes = render(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_empty_export() {
        let bytes = render(&ExportData::default()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn habit_values_render_by_kind() {
        let mut row = HabitLogRow {
            logged_at: datetime!(2024-03-01 08:00 UTC),
            habit_name: "Exercise".to_string(),
            value_boolean: None,
            value_numeric: None,
            value_duration: Some(45),
            notes: None,
        };
        assert_eq!(habit_value_text(&row), "45 min");
        row.value_duration = None;
        row.value_boolean = Some(false);
        assert_eq!(habit_value_text(&row), "not done");
    }
}
