//! The flat-file contract: four labelled sections, each a header row plus
//! data rows, separated by blank lines. Section labels and column names are
//! byte-stable across versions — editing them breaks round-tripping.

/// The four sections, in their fixed export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    SymptomLogs,
    MoodLogs,
    MedicationLogs,
    HabitLogs,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::SymptomLogs,
        Section::MoodLogs,
        Section::MedicationLogs,
        Section::HabitLogs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::SymptomLogs => "Symptom Logs",
            Section::MoodLogs => "Mood Logs",
            Section::MedicationLogs => "Medication Logs",
            Section::HabitLogs => "Habit Logs",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Section::SymptomLogs => &["date", "symptom_name", "severity", "notes"],
            Section::MoodLogs => &["date", "mood_score", "energy_level", "stress_level", "notes"],
            Section::MedicationLogs => &["date", "medication_name", "taken", "notes"],
            Section::HabitLogs => &["date", "habit_name", "value", "notes"],
        }
    }

    pub fn from_label(s: &str) -> Option<Section> {
        Section::ALL.iter().copied().find(|sec| sec.label() == s)
    }
}

/// RFC-4180-like quoting: wrap when the field contains a comma, quote, CR or
/// LF; embedded quotes are doubled.
pub fn escape_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn write_row(out: &mut String, fields: &[&str]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

/// Splits the buffer into logical records: newlines inside a quoted field do
/// not terminate a record. A trailing CR outside quotes is dropped so CRLF
/// input parses the same as LF.
pub fn split_records(text: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '\n' if !in_quotes => {
                if current.ends_with('\r') {
                    current.pop();
                }
                records.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if current.ends_with('\r') && !in_quotes {
        current.pop();
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

/// Parses one record into fields, honoring quoting and doubled quotes.
pub fn parse_record(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = record.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }
    fields.push(field);
    fields
}

/// Strips leading formula-injection trigger characters from free text.
/// Notes are only ever defanged, never interpreted.
pub fn defang_cell(s: &str) -> String {
    s.trim_start_matches(['=', '+', '-', '@', '\t', '\r']).to_string()
}

/// One recognized section as found in an import buffer.
#[derive(Debug)]
pub struct SectionBlock {
    pub section: Section,
    pub columns: Vec<String>,
    /// Parsed data rows, in order; row numbers reported to the user are
    /// 1-based indexes into this vector.
    pub rows: Vec<Vec<String>>,
}

enum ScanState {
    SeekingSection,
    ReadingHeader,
    ReadingRows,
}

/// Line scanner over the sectioned format. Unknown text outside a section is
/// ignored; a blank record or the next known label ends the current section.
pub fn scan_sections(text: &str) -> Vec<SectionBlock> {
    let mut blocks: Vec<SectionBlock> = Vec::new();
    let mut state = ScanState::SeekingSection;
    let mut current: Option<SectionBlock> = None;

    for record in split_records(text) {
        let trimmed = record.trim();
        match state {
            ScanState::SeekingSection => {
                if let Some(section) = Section::from_label(trimmed) {
                    current = Some(SectionBlock {
                        section,
                        columns: Vec::new(),
                        rows: Vec::new(),
                    });
                    state = ScanState::ReadingHeader;
                }
            }
            ScanState::ReadingHeader => {
                if trimmed.is_empty() {
                    // Label with no header row: empty section.
                    blocks.extend(current.take());
                    state = ScanState::SeekingSection;
                } else if let Some(block) = current.as_mut() {
                    block.columns = parse_record(&record)
                        .into_iter()
                        .map(|c| c.trim().to_string())
                        .collect();
                    state = ScanState::ReadingRows;
                }
            }
            ScanState::ReadingRows => {
                if trimmed.is_empty() {
                    blocks.extend(current.take());
                    state = ScanState::SeekingSection;
                } else if let Some(section) = Section::from_label(trimmed) {
                    blocks.extend(current.take());
                    current = Some(SectionBlock {
                        section,
                        columns: Vec::new(),
                        rows: Vec::new(),
                    });
                    state = ScanState::ReadingHeader;
                } else if let Some(block) = current.as_mut() {
                    block.rows.push(parse_record(&record));
                }
            }
        }
    }
    blocks.extend(current.take());
    blocks
}

/// Positional lookup of a named column within a section's rows.
pub fn column_value<'a>(columns: &[String], row: &'a [String], name: &str) -> &'a str {
    columns
        .iter()
        .position(|c| c == name)
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_only_when_needed() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn parse_record_handles_quotes() {
        assert_eq!(parse_record("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_record("\"a,b\",c"), vec!["a,b", "c"]);
        assert_eq!(parse_record("\"say \"\"hi\"\"\",x"), vec!["say \"hi\"", "x"]);
        assert_eq!(parse_record("a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn split_records_keeps_quoted_newlines_together() {
        let text = "a,\"line1\nline2\",b\nnext,row,here\n";
        let records = split_records(text);
        assert_eq!(records.len(), 2);
        assert_eq!(parse_record(&records[0])[1], "line1\nline2");
    }

    #[test]
    fn split_records_handles_crlf() {
        let records = split_records("a,b\r\nc,d\r\n");
        assert_eq!(records, vec!["a,b", "c,d"]);
    }

    #[test]
    fn defang_strips_leading_formula_characters() {
        assert_eq!(defang_cell("=SUM(A1)"), "SUM(A1)");
        assert_eq!(defang_cell("@@+=-cmd"), "cmd");
        assert_eq!(defang_cell("normal note"), "normal note");
        assert_eq!(defang_cell("middle=kept"), "middle=kept");
    }

    #[test]
    fn scanner_finds_sections_and_rows() {
        let text = "\
Symptom Logs
date,symptom_name,severity,notes
2024-03-01,Headache,5,
2024-03-02,Fatigue,3,tired

Mood Logs
date,mood_score,energy_level,stress_level,notes
2024-03-01,4,,2,
";
        let blocks = scan_sections(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].section, Section::SymptomLogs);
        assert_eq!(blocks[0].columns, Section::SymptomLogs.columns());
        assert_eq!(blocks[0].rows.len(), 2);
        assert_eq!(blocks[1].section, Section::MoodLogs);
        assert_eq!(blocks[1].rows.len(), 1);
    }

    #[test]
    fn scanner_ignores_unknown_text_outside_sections() {
        let text = "\
exported by healthtrack
random,line

Mood Logs
date,mood_score,energy_level,stress_level,notes
2024-03-01,4,3,2,ok
trailing garbage is a row and fails validation later
";
        let blocks = scan_sections(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].section, Section::MoodLogs);
        assert_eq!(blocks[0].rows.len(), 2);
    }

    #[test]
    fn scanner_handles_adjacent_sections_without_blank_line() {
        let text = "\
Symptom Logs
date,symptom_name,severity,notes
Habit Logs
date,habit_name,value,notes
2024-03-01,Exercise,30,
";
        let blocks = scan_sections(text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].rows.is_empty());
        assert_eq!(blocks[1].section, Section::HabitLogs);
        assert_eq!(blocks[1].rows.len(), 1);
    }

    #[test]
    fn scanner_handles_trailing_blank_section() {
        let text = "Habit Logs\ndate,habit_name,value,notes\n\n\n";
        let blocks = scan_sections(text);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].rows.is_empty());
    }

    #[test]
    fn column_value_tolerates_missing_columns() {
        let columns = vec!["date".to_string(), "notes".to_string()];
        let row = vec!["2024-03-01".to_string()];
        assert_eq!(column_value(&columns, &row, "date"), "2024-03-01");
        assert_eq!(column_value(&columns, &row, "notes"), "");
        assert_eq!(column_value(&columns, &row, "nope"), "");
    }
}
