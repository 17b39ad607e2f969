pub mod platforms;
pub mod sims;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{HomologaError, Result};
use crate::profiles::sim_profile;
use crate::records::PlatformRecord;
use crate::report::{summarize_by, SummaryRow};
use crate::resolve::{resolve_sim_columns, SimColumnMap};
use crate::store::IngestStore;
use crate::tabular::{file_stem, Sheet, Workbook};

/// A source that failed in isolation during a run; siblings keep going.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source_id: String,
    pub reason: String,
}

/// Results of one platform ingest-and-persist pass.
#[derive(Debug)]
pub struct PlatformRunReport {
    pub total_rows: usize,
    pub inserted: usize,
    pub invalid: Vec<BTreeMap<String, String>>,
    /// Duplicate-key records rejected at insertion, kept for audit/export.
    pub rejected: Vec<PlatformRecord>,
    /// The accepted batch, pre-insert, for summaries and exports.
    pub accepted: Vec<PlatformRecord>,
    pub failures: Vec<SourceFailure>,
    /// Per-origin share of the accepted batch.
    pub summary: Vec<SummaryRow>,
}

/// Runs the full platform pipeline for one workbook: extract across all
/// registered sheets, dedup-insert, aggregate per origin.
pub fn run_platform_ingest(path: &Path, store: &IngestStore) -> Result<PlatformRunReport> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let workbook = Workbook::open(path)?;
    let extraction = platforms::extract_platform_records(&workbook, &filename);
    let insert = store.insert_platforms(&extraction.accepted)?;
    let summary = summarize_by(&extraction.accepted, |r: &PlatformRecord| r.origin.clone());
    info!(
        file = %filename,
        total = extraction.total_rows,
        inserted = insert.inserted,
        rejected = insert.rejected.len(),
        invalid = extraction.invalid.len(),
        "platform ingest complete"
    );
    Ok(PlatformRunReport {
        total_rows: extraction.total_rows,
        inserted: insert.inserted,
        invalid: extraction.invalid,
        rejected: insert.rejected,
        accepted: extraction.accepted,
        failures: extraction.failures,
        summary,
    })
}

/// Per-section statistics for a SIM run.
#[derive(Debug, Clone)]
pub struct SimSectionStats {
    pub file: String,
    pub source_id: String,
    pub submitted: usize,
    pub inserted: usize,
}

impl SimSectionStats {
    pub fn insertion_rate(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            self.inserted as f64 / self.submitted as f64 * 100.0
        }
    }
}

/// Results of one SIM ingest pass over a set of sources.
#[derive(Debug, Default)]
pub struct SimRunReport {
    pub sections: Vec<SimSectionStats>,
    pub total_submitted: usize,
    pub total_inserted: usize,
    pub failures: Vec<SourceFailure>,
}

impl SimRunReport {
    fn record_section(&mut self, file: &str, source_id: &str, submitted: usize, inserted: usize) {
        self.total_submitted += submitted;
        self.total_inserted += inserted;
        self.sections.push(SimSectionStats {
            file: file.to_string(),
            source_id: source_id.to_string(),
            submitted,
            inserted,
        });
    }

    fn record_failure(&mut self, source_id: &str, reason: impl ToString) {
        warn!(source = %source_id, reason = %reason.to_string(), "SIM source failed; continuing with remaining sources");
        self.failures.push(SourceFailure {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Runs the SIM pipeline over workbook and delimited sources.
///
/// Each file and each workbook section is processed independently; a
/// malformed source or an unresolvable mapping is recorded against its
/// identifier and never aborts the other sources. `manual` supplies
/// field-by-field mappings for sources absent from the registry, keyed by
/// sheet name or file-name stem.
pub fn run_sim_ingest(
    paths: &[PathBuf],
    manual: &HashMap<String, SimColumnMap>,
    store: &IngestStore,
) -> Result<SimRunReport> {
    let mut report = SimRunReport::default();
    for path in paths {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let is_delimited = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt"));
        if is_delimited {
            ingest_delimited_source(path, &filename, manual, store, &mut report)?;
        } else {
            ingest_workbook_source(path, &filename, manual, store, &mut report)?;
        }
    }
    Ok(report)
}

fn ingest_workbook_source(
    path: &Path,
    filename: &str,
    manual: &HashMap<String, SimColumnMap>,
    store: &IngestStore,
    report: &mut SimRunReport,
) -> Result<()> {
    let workbook = match Workbook::open(path) {
        Ok(wb) => wb,
        Err(e) => {
            report.record_failure(filename, e);
            return Ok(());
        }
    };
    for sheet in &workbook.sheets {
        let map = match section_mapping(&sheet.name, &sheet.header, manual) {
            Ok(map) => map,
            Err(e) => {
                report.record_failure(&sheet.name, e);
                continue;
            }
        };
        let records = sims::clean_sim_records(sims::extract_sim_sheet(sheet, &map));
        let insert = store.insert_sims(&records)?;
        report.record_section(filename, &sheet.name, insert.submitted, insert.inserted);
    }
    Ok(())
}

fn ingest_delimited_source(
    path: &Path,
    filename: &str,
    manual: &HashMap<String, SimColumnMap>,
    store: &IngestStore,
    report: &mut SimRunReport,
) -> Result<()> {
    let source_id = file_stem(path);
    let sheet = match File::open(path)
        .map_err(|e| HomologaError::Delimited {
            source_id: source_id.clone(),
            message: e.to_string(),
        })
        .and_then(|f| Sheet::from_delimited(f, &source_id))
    {
        Ok(sheet) => sheet,
        Err(e) => {
            report.record_failure(&source_id, e);
            return Ok(());
        }
    };
    let map = match section_mapping(&source_id, &sheet.header, manual) {
        Ok(map) => map,
        Err(e) => {
            report.record_failure(&source_id, e);
            return Ok(());
        }
    };
    let records = sims::clean_sim_records(sims::extract_sim_delimited(&sheet, &map));
    let insert = store.insert_sims(&records)?;
    report.record_section(filename, &source_id, insert.submitted, insert.inserted);
    Ok(())
}

/// Mapping for one SIM section: registry profile first, then a supplied
/// manual assignment; neither is an attributable per-source failure.
fn section_mapping(
    source_id: &str,
    header: &[String],
    manual: &HashMap<String, SimColumnMap>,
) -> Result<SimColumnMap> {
    if let Some(profile) = sim_profile(source_id) {
        match resolve_sim_columns(source_id, header, profile) {
            Ok(map) => return Ok(map),
            Err(e) => {
                // Profile exists but does not fit this header; a manual
                // mapping may still have been supplied for this source.
                if let Some(map) = manual.get(source_id) {
                    return Ok(*map);
                }
                return Err(e);
            }
        }
    }
    manual
        .get(source_id)
        .copied()
        .ok_or_else(|| HomologaError::UnknownSource(source_id.to_string()))
}
