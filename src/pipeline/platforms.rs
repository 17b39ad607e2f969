use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::cleaners::{clean_phone, extract_date_token};
use crate::pipeline::SourceFailure;
use crate::profiles::{platform_profile, ColumnSpec, PlatformProfile};
use crate::records::{PlatformField, PlatformRecord, RowOutcome};
use crate::resolve::{resolve_platform_columns, ColumnMap};
use crate::tabular::{Cell, Sheet, Workbook};

/// Outcome of one platform extraction pass over a workbook.
///
/// Counts derive from the collections; accepted records keep input row
/// order within each sheet.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub accepted: Vec<PlatformRecord>,
    pub invalid: Vec<BTreeMap<String, String>>,
    pub total_rows: usize,
    /// Sheets whose profile failed to resolve against the header.
    pub failures: Vec<SourceFailure>,
}

/// Walks every sheet whose name is a registered platform source, applies
/// the resolved mapping plus field cleaners, and classifies each data row.
///
/// Sheets absent from the registry are skipped; the skip is logged so a
/// missing profile does not pass unnoticed. A sheet whose profile does not
/// resolve against its header is recorded as a per-source failure and its
/// rows are not processed.
pub fn extract_platform_records(workbook: &Workbook, filename: &str) -> ExtractionReport {
    let file_date = extract_date_token(filename);
    let mut report = ExtractionReport::default();

    for sheet in &workbook.sheets {
        let Some(profile) = platform_profile(&sheet.name) else {
            warn!(sheet = %sheet.name, "no platform profile registered; skipping sheet");
            continue;
        };
        let map = match resolve_platform_columns(&sheet.name, &sheet.header, profile) {
            Ok(map) => map,
            Err(e) => {
                warn!(sheet = %sheet.name, error = %e, "profile did not resolve; sheet not processed");
                report.failures.push(SourceFailure {
                    source_id: sheet.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let mut accepted_in_sheet = 0usize;
        for row in &sheet.rows {
            report.total_rows += 1;
            match classify_row(sheet, row, profile, &map, &file_date) {
                RowOutcome::Accepted(record) => {
                    debug!(sheet = %sheet.name, account = ?record.client_account, "accepted record");
                    report.accepted.push(record);
                    accepted_in_sheet += 1;
                }
                RowOutcome::Invalid(view) => {
                    warn!(sheet = %sheet.name, "row missing required client account");
                    report.invalid.push(view);
                }
            }
        }
        info!(
            sheet = %sheet.name,
            accepted = accepted_in_sheet,
            rows = sheet.rows.len(),
            "processed platform sheet"
        );
    }
    report
}

/// Classifies a single data row: a row is accepted iff its resolved
/// `ClientAccount` value is non-empty.
fn classify_row(
    sheet: &Sheet,
    row: &[Cell],
    profile: &PlatformProfile,
    map: &ColumnMap,
    file_date: &str,
) -> RowOutcome {
    let account_ok = map
        .index(PlatformField::ClientAccount)
        .and_then(|idx| row.get(idx))
        .is_some_and(|cell| !cell.is_empty());
    if !account_ok {
        return RowOutcome::Invalid(label_value_view(sheet, row));
    }

    let value = |field: PlatformField| -> Option<String> {
        match profile.spec(field) {
            ColumnSpec::Column(_) => map
                .index(field)
                .and_then(|idx| row.get(idx))
                .filter(|cell| !matches!(cell, Cell::Empty))
                .map(Cell::render),
            ColumnSpec::Fixed(_) | ColumnSpec::FileDate | ColumnSpec::Unmapped => None,
        }
    };

    RowOutcome::Accepted(PlatformRecord {
        name: value(PlatformField::Name),
        client_account: value(PlatformField::ClientAccount),
        device_type: value(PlatformField::DeviceType),
        imei: value(PlatformField::Imei),
        iccid: value(PlatformField::Iccid),
        activation_date: value(PlatformField::ActivationDate),
        deactivation_date: value(PlatformField::DeactivationDate),
        last_message_time: value(PlatformField::LastMessageTime),
        last_report: value(PlatformField::LastReport),
        vehicle: value(PlatformField::Vehicle),
        services: value(PlatformField::Services),
        group: value(PlatformField::Group),
        phone: value(PlatformField::Phone).and_then(|raw| clean_phone(&raw)),
        origin: profile.origin().to_string(),
        source_file_date: file_date.to_string(),
    })
}

/// Raw label-to-value view of a row, routed to the invalid sink.
/// Missing trailing cells render as empty strings.
fn label_value_view(sheet: &Sheet, row: &[Cell]) -> BTreeMap<String, String> {
    sheet
        .header
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let value = row.get(idx).map(Cell::render).unwrap_or_default();
            (label.clone(), value)
        })
        .collect()
}
