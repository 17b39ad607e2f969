use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{HomologaError, Result};
use crate::records::{PlatformField, PlatformRecord};

/// One group's share of an in-memory batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub group: String,
    pub count: usize,
    /// Share of the batch total, rounded to one decimal place.
    pub percent: f64,
}

impl SummaryRow {
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

/// Groups a batch by the given key, counting each group and its share of
/// the total. Pure over the in-memory batch; groups come back in sorted
/// order for stable reporting.
pub fn summarize_by<T, F>(records: &[T], group_fn: F) -> Vec<SummaryRow>
where
    F: Fn(&T) -> String,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(group_fn(record)).or_default() += 1;
    }
    let total = records.len();
    counts
        .into_iter()
        .map(|(group, count)| {
            let percent = if total == 0 {
                0.0
            } else {
                (count as f64 / total as f64 * 1000.0).round() / 10.0
            };
            SummaryRow {
                group,
                count,
                percent,
            }
        })
        .collect()
}

/// Renders a platform batch as CSV, header row included, for the rejected
/// and per-origin exports.
pub fn platform_records_to_csv(records: &[PlatformRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(PlatformField::ALL.map(PlatformField::column_name))?;
    for record in records {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        writer.write_record([
            opt(&record.name),
            opt(&record.client_account),
            opt(&record.device_type),
            opt(&record.imei),
            opt(&record.iccid),
            opt(&record.activation_date),
            opt(&record.deactivation_date),
            opt(&record.last_message_time),
            opt(&record.last_report),
            opt(&record.vehicle),
            opt(&record.services),
            opt(&record.group),
            opt(&record.phone),
            record.origin.clone(),
            record.source_file_date.clone(),
        ])?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| HomologaError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_sum_to_one_hundred() {
        // 10 records split 7/3 across two origins
        let batch: Vec<&str> = std::iter::repeat("WIALON")
            .take(7)
            .chain(std::iter::repeat("ADAS").take(3))
            .collect();
        let summary = summarize_by(&batch, |o| o.to_string());

        assert_eq!(summary.len(), 2);
        let adas = &summary[0];
        let wialon = &summary[1];
        assert_eq!((adas.group.as_str(), adas.count), ("ADAS", 3));
        assert_eq!((wialon.group.as_str(), wialon.count), ("WIALON", 7));
        assert_eq!(adas.percent_label(), "30.0%");
        assert_eq!(wialon.percent_label(), "70.0%");
        assert!((adas.percent + wialon.percent - 100.0).abs() < 0.05);
    }

    #[test]
    fn summary_rows_serialize_for_json_output() {
        let batch = vec!["WIALON", "WIALON", "ADAS"];
        let summary = summarize_by(&batch, |o| o.to_string());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""group":"ADAS""#));
        assert!(json.contains(r#""count":2"#));
        assert!(json.contains(r#""percent":33.3"#));
    }

    #[test]
    fn empty_batch_summarizes_to_nothing() {
        let summary = summarize_by(&[] as &[&str], |o| o.to_string());
        assert!(summary.is_empty());
    }

    #[test]
    fn csv_export_carries_all_fifteen_columns() {
        let record = PlatformRecord {
            name: Some("Unit1".into()),
            client_account: Some("ACME".into()),
            device_type: None,
            imei: None,
            iccid: None,
            activation_date: None,
            deactivation_date: None,
            last_message_time: None,
            last_report: None,
            vehicle: None,
            services: None,
            group: None,
            phone: Some("5551234".into()),
            origin: "WIALON".into(),
            source_file_date: "2024-03-15".into(),
        };
        let csv = platform_records_to_csv(&[record]).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert_eq!(header.split(',').count(), 15);
        assert!(header.starts_with("Name,ClientAccount"));
        assert!(lines.next().unwrap().contains("WIALON"));
    }
}
