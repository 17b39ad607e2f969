use tracing::debug;

use crate::cleaners::{clean_numeric_id, clean_status};
use crate::records::{SimField, SimRecord};
use crate::resolve::SimColumnMap;
use crate::tabular::{Cell, Sheet};

/// Extracts SIM records from one workbook sheet using the resolved mapping.
///
/// No row is ever rejected here: validation is deferred entirely to the
/// store's uniqueness constraint. An absent or out-of-range column index
/// yields an empty string. Company is the sheet name.
pub fn extract_sim_sheet(sheet: &Sheet, map: &SimColumnMap) -> Vec<SimRecord> {
    sheet
        .rows
        .iter()
        .map(|row| record_from_row(row, map, &sheet.name, false))
        .collect()
}

/// Delimited-file variant: same five-field extraction, but every value is
/// additionally whitespace-trimmed. Company is the file-name stem carried
/// in the sheet name.
pub fn extract_sim_delimited(sheet: &Sheet, map: &SimColumnMap) -> Vec<SimRecord> {
    sheet
        .rows
        .iter()
        .map(|row| record_from_row(row, map, &sheet.name, true))
        .collect()
}

fn record_from_row(row: &[Cell], map: &SimColumnMap, company: &str, trim: bool) -> SimRecord {
    let value = |field: SimField| -> String {
        let raw = map
            .index(field)
            .and_then(|idx| row.get(idx))
            .map(Cell::render)
            .unwrap_or_default();
        if trim {
            raw.trim().to_string()
        } else {
            raw
        }
    };
    SimRecord {
        iccid: value(SimField::Iccid),
        phone: value(SimField::Phone),
        sim_status: value(SimField::SimStatus),
        session_status: value(SimField::SessionStatus),
        consumption_mb: value(SimField::ConsumptionMb),
        company: company.to_string(),
    }
}

/// Mandatory second pass over extracted SIM records: ICCID and phone are
/// reduced to digits, consumption is digit-stripped, statuses are trimmed
/// and lowercased. Extraction alone does not fully canonicalize these.
pub fn clean_sim_records(records: Vec<SimRecord>) -> Vec<SimRecord> {
    records
        .into_iter()
        .map(|record| {
            let cleaned = SimRecord {
                iccid: clean_numeric_id(&Cell::Text(record.iccid.clone())),
                phone: clean_numeric_id(&Cell::Text(record.phone.clone())),
                sim_status: clean_status(&record.sim_status),
                session_status: clean_status(&record.session_status),
                consumption_mb: clean_numeric_id(&Cell::Text(record.consumption_mb.clone())),
                company: record.company.clone(),
            };
            debug!(
                iccid_before = %record.iccid,
                iccid_after = %cleaned.iccid,
                phone_before = %record.phone,
                phone_after = %cleaned.phone,
                "cleaned SIM record"
            );
            cleaned
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::sim_profile;
    use crate::resolve::resolve_sim_columns;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn extracts_all_rows_without_rejection() {
        let header = vec![
            "iccid".to_string(),
            "msisdn".to_string(),
            "status".to_string(),
            "consumo en Mb".to_string(),
        ];
        let sheet = Sheet::new(
            "SIMPATIC",
            header.clone(),
            vec![
                vec![Cell::Number(8952000.0), Cell::Number(5551234.0), text("ACTIVA"), Cell::Number(120.5)],
                // all-empty row still emitted
                vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty],
            ],
        );
        let map = resolve_sim_columns("SIMPATIC", &sheet.header, sim_profile("SIMPATIC").unwrap())
            .unwrap();
        let records = extract_sim_sheet(&sheet, &map);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iccid, "8952000");
        assert_eq!(records[0].consumption_mb, "120.5");
        assert_eq!(records[0].company, "SIMPATIC");
        assert_eq!(records[1].iccid, "");
        assert_eq!(records[1].company, "SIMPATIC");
    }

    #[test]
    fn out_of_range_index_yields_empty_string() {
        let map = SimColumnMap::manual(0, 1, 2, 3, 9);
        let sheet = Sheet::new(
            "X",
            vec![],
            vec![vec![text("111"), text("222"), text("a"), text("b")]],
        );
        let records = extract_sim_sheet(&sheet, &map);
        assert_eq!(records[0].consumption_mb, "");
    }

    #[test]
    fn delimited_variant_trims_whitespace() {
        let map = SimColumnMap::manual(0, 1, 2, 3, 4);
        let sheet = Sheet::new(
            "TELCEL",
            vec![],
            vec![vec![
                text(" 8952000 "),
                text("5551234"),
                text(" Activa"),
                text("SI "),
                text("10"),
            ]],
        );
        let records = extract_sim_delimited(&sheet, &map);
        assert_eq!(records[0].iccid, "8952000");
        assert_eq!(records[0].sim_status, "Activa");
    }

    #[test]
    fn cleaning_pass_canonicalizes_ids_and_statuses() {
        let records = vec![SimRecord {
            iccid: "8952-000".to_string(),
            phone: "(555) 1234".to_string(),
            sim_status: "  ACTIVA ".to_string(),
            session_status: "En Sesión".to_string(),
            consumption_mb: "120 MB".to_string(),
            company: "MOVISTAR".to_string(),
        }];
        let cleaned = clean_sim_records(records);
        assert_eq!(cleaned[0].iccid, "8952000");
        assert_eq!(cleaned[0].phone, "5551234");
        assert_eq!(cleaned[0].sim_status, "activa");
        assert_eq!(cleaned[0].session_status, "en sesión");
        assert_eq!(cleaned[0].consumption_mb, "120");
        assert_eq!(cleaned[0].company, "MOVISTAR");
    }
}
