use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tabular::Cell;

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// Strips every non-digit character from a phone number.
/// Returns `None` when nothing remains.
pub fn clean_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Canonicalizes a numeric identifier (ICCID, MSISDN) read from a cell.
///
/// A float with an integer value is first rendered as an integer, avoiding
/// the `8.0` / scientific-notation artifacts of spreadsheet numeric cells,
/// then every non-digit character is stripped.
pub fn clean_numeric_id(cell: &Cell) -> String {
    cell.render().chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalizes a status string: trimmed and lowercased.
pub fn clean_status(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Finds a YYYY-MM-DD token in the filename and returns it verbatim;
/// falls back to today's date when the filename carries none. Callers
/// needing reproducibility must supply a filename with an embedded date.
pub fn extract_date_token(filename: &str) -> String {
    match DATE_TOKEN.find(filename) {
        Some(m) => m.as_str().to_string(),
        None => Local::now().format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_phone_strips_non_digits() {
        assert_eq!(clean_phone("555-123 4567"), Some("5551234567".to_string()));
    }

    #[test]
    fn clean_phone_empty_is_none() {
        assert_eq!(clean_phone(""), None);
        assert_eq!(clean_phone("n/a"), None);
    }

    #[test]
    fn clean_numeric_id_renders_integral_float_as_integer() {
        assert_eq!(clean_numeric_id(&Cell::Number(8.0)), "8");
    }

    #[test]
    fn clean_numeric_id_strips_non_digits_from_text() {
        assert_eq!(clean_numeric_id(&Cell::Text("  12a3".into())), "123");
        assert_eq!(clean_numeric_id(&Cell::Empty), "");
    }

    #[test]
    fn clean_status_trims_and_lowercases() {
        assert_eq!(clean_status("  ACTIVA "), "activa");
        assert_eq!(clean_status(""), "");
    }

    #[test]
    fn date_token_from_filename_is_verbatim() {
        assert_eq!(extract_date_token("report_2024-03-15.xlsx"), "2024-03-15");
    }

    #[test]
    fn date_token_falls_back_to_today() {
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(extract_date_token("report.xlsx"), today);
    }
}
