use time::{format_description::FormatItem, macros::format_description, Date};

/// Calendar-date format used by the CSV contract and query parameters.
const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_iso_date(s: &str) -> Option<Date> {
    Date::parse(s, ISO_DATE).ok()
}

pub fn format_iso_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_and_formats_iso_dates() {
        assert_eq!(parse_iso_date("2024-03-09"), Some(date!(2024 - 03 - 09)));
        assert_eq!(format_iso_date(date!(2024 - 03 - 09)), "2024-03-09");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_iso_date("03/09/2024"), None);
        assert_eq!(parse_iso_date("2024-13-01"), None);
        assert_eq!(parse_iso_date("not-a-date"), None);
    }
}
