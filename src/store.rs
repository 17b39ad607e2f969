use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{ffi, params, Connection};
use tracing::info;

use crate::error::Result;
use crate::records::{PlatformRecord, SimRecord};

/// Default file name for the SIM store.
pub const SIM_DB_FILE: &str = "sims_hoy.db";

/// Per-day platform database path: `<dir>/<YYYY-MM-DD>_plataformas.db`.
pub fn platform_db_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}_plataformas.db", Local::now().format("%Y-%m-%d")))
}

/// Classification of a single platform insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An existing row already carries this (Name, ClientAccount, Phone) key.
    DuplicateRejected,
}

/// Per-batch accept/reject partition for platform inserts. The rejected
/// records themselves are kept for audit/export.
#[derive(Debug, Default)]
pub struct PlatformInsertReport {
    pub submitted: usize,
    pub inserted: usize,
    pub rejected: Vec<PlatformRecord>,
}

/// Per-batch counts for SIM inserts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimInsertReport {
    pub submitted: usize,
    pub inserted: usize,
}

/// SQLite-backed store for both canonical tables. Append-only: the core
/// never updates or deletes; the composite UNIQUE constraints are the sole
/// dedup mechanism.
pub struct IngestStore {
    conn: Connection,
}

impl IngestStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS platforms (
                Name              TEXT,
                ClientAccount     TEXT,
                DeviceType        TEXT,
                IMEI              TEXT,
                ICCID             TEXT,
                ActivationDate    TEXT,
                DeactivationDate  TEXT,
                LastMessageTime   TEXT,
                LastReport        TEXT,
                Vehicle           TEXT,
                Services          TEXT,
                "Group"           TEXT,
                Phone             TEXT,
                Origin            TEXT,
                SourceFileDate    TEXT,
                UNIQUE(Name, ClientAccount, Phone)
            );
            CREATE TABLE IF NOT EXISTS sims (
                ICCID          TEXT,
                Phone          TEXT,
                SimStatus      TEXT,
                SessionStatus  TEXT,
                ConsumptionMb  TEXT,
                Company        TEXT,
                UNIQUE(ICCID, Phone)
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Inserts platform records one at a time, classifying each uniqueness
    /// violation instead of propagating it, so the caller gets the exact
    /// accept/reject partition rather than a best-effort count.
    ///
    /// The whole batch runs in one transaction: a hard failure mid-batch
    /// rolls back everything already staged, so the call is atomic.
    pub fn insert_platforms(&self, records: &[PlatformRecord]) -> Result<PlatformInsertReport> {
        let tx = self.conn.unchecked_transaction()?;
        let mut report = PlatformInsertReport {
            submitted: records.len(),
            ..Default::default()
        };
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO platforms (
                    Name, ClientAccount, DeviceType, IMEI, ICCID,
                    ActivationDate, DeactivationDate, LastMessageTime,
                    LastReport, Vehicle, Services, "Group", Phone, Origin, SourceFileDate
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
            )?;
            for record in records {
                let result = stmt.execute(params![
                    record.name,
                    record.client_account,
                    record.device_type,
                    record.imei,
                    record.iccid,
                    record.activation_date,
                    record.deactivation_date,
                    record.last_message_time,
                    record.last_report,
                    record.vehicle,
                    record.services,
                    record.group,
                    record.phone,
                    record.origin,
                    record.source_file_date,
                ]);
                match classify(result)? {
                    InsertOutcome::Inserted => report.inserted += 1,
                    InsertOutcome::DuplicateRejected => report.rejected.push(record.clone()),
                }
            }
        }
        tx.commit()?;
        info!(
            submitted = report.submitted,
            inserted = report.inserted,
            rejected = report.rejected.len(),
            "inserted platform batch"
        );
        Ok(report)
    }

    /// Inserts SIM records with `INSERT OR IGNORE`; the change count per
    /// statement distinguishes genuinely new keys from duplicates.
    pub fn insert_sims(&self, records: &[SimRecord]) -> Result<SimInsertReport> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO sims (ICCID, Phone, SimStatus, SessionStatus, ConsumptionMb, Company)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    record.iccid,
                    record.phone,
                    record.sim_status,
                    record.session_status,
                    record.consumption_mb,
                    record.company,
                ])?;
            }
        }
        tx.commit()?;
        info!(submitted = records.len(), inserted, "inserted SIM batch");
        Ok(SimInsertReport {
            submitted: records.len(),
            inserted,
        })
    }

    pub fn platform_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM platforms", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn sim_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sims", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Full logical dump: schema statements followed by one INSERT per row,
    /// sufficient to recreate the table set elsewhere.
    pub fn dump_sql(&self) -> Result<String> {
        let mut out = String::from("BEGIN TRANSACTION;\n");
        let tables: Vec<(String, String)> = {
            let mut stmt = self.conn.prepare(
                "SELECT name, sql FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        for (table, schema_sql) in tables {
            out.push_str(&schema_sql);
            out.push_str(";\n");

            let mut stmt = self.conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
            let column_count = stmt.column_count();
            let column_list = stmt
                .column_names()
                .iter()
                .map(|c| format!("\"{c}\""))
                .collect::<Vec<_>>()
                .join(", ");
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    let value: Option<String> = row.get(idx)?;
                    values.push(match value {
                        Some(v) => format!("'{}'", v.replace('\'', "''")),
                        None => "NULL".to_string(),
                    });
                }
                out.push_str(&format!(
                    "INSERT INTO \"{table}\" ({column_list}) VALUES ({});\n",
                    values.join(", ")
                ));
            }
        }
        out.push_str("COMMIT;\n");
        Ok(out)
    }
}

// Only a UNIQUE violation is a duplicate; every other failure propagates
// and rolls the surrounding transaction back.
fn classify(result: rusqlite::Result<usize>) -> Result<InsertOutcome> {
    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(InsertOutcome::DuplicateRejected)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(name: &str, account: &str, phone: &str) -> PlatformRecord {
        PlatformRecord {
            name: Some(name.to_string()),
            client_account: Some(account.to_string()),
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
            phone: Some(phone.to_string()),
            origin: "WIALON".to_string(),
            source_file_date: "2024-03-15".to_string(),
        }
    }

    fn sim(iccid: &str, phone: &str, company: &str) -> SimRecord {
        SimRecord {
            iccid: iccid.to_string(),
            phone: phone.to_string(),
            sim_status: "activa".to_string(),
            session_status: "si".to_string(),
            consumption_mb: "10".to_string(),
            company: company.to_string(),
        }
    }

    #[test]
    fn platform_duplicates_are_partitioned_not_errors() {
        let store = IngestStore::open_in_memory().unwrap();
        let batch = vec![
            platform("Unit1", "ACME", "5551234"),
            platform("Unit1", "ACME", "5551234"),
            platform("Unit2", "ACME", "5559999"),
        ];
        let report = store.insert_platforms(&batch).unwrap();
        assert_eq!(report.submitted, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].name.as_deref(), Some("Unit1"));
        assert_eq!(store.platform_count().unwrap(), 2);
    }

    #[test]
    fn inserts_are_idempotent() {
        let store = IngestStore::open_in_memory().unwrap();
        let batch = vec![platform("Unit1", "ACME", "5551234")];
        let first = store.insert_platforms(&batch).unwrap();
        assert_eq!(first.inserted, 1);
        let second = store.insert_platforms(&batch).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.rejected.len(), 1);

        let sims = vec![sim("8952000", "5551234", "MOVISTAR")];
        assert_eq!(store.insert_sims(&sims).unwrap().inserted, 1);
        assert_eq!(store.insert_sims(&sims).unwrap().inserted, 0);
    }

    #[test]
    fn sim_key_dedups_across_companies() {
        // Same (ICCID, Phone) from two different sections: one row wins
        let store = IngestStore::open_in_memory().unwrap();
        let batch = vec![
            sim("8952000", "5551234", "MOVISTAR"),
            sim("8952000", "5551234", "TELCEL"),
        ];
        let report = store.insert_sims(&batch).unwrap();
        assert_eq!(report.submitted, 2);
        assert_eq!(report.inserted, 1);
        assert_eq!(store.sim_count().unwrap(), 1);
    }

    #[test]
    fn failed_platform_batch_rolls_back_completely() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atomic.db");
        let store = IngestStore::open(&path).unwrap();
        // A trigger abort mid-batch stands in for a hard insert failure
        let saboteur = Connection::open(&path).unwrap();
        saboteur
            .execute_batch(
                "CREATE TRIGGER platform_boom BEFORE INSERT ON platforms
                 WHEN NEW.ClientAccount = 'BOOM'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();
        drop(saboteur);

        let batch = vec![
            platform("Unit1", "ACME", "5551111"),
            platform("Unit2", "BOOM", "5552222"),
            platform("Unit3", "ACME", "5553333"),
        ];
        assert!(store.insert_platforms(&batch).is_err());
        // Nothing from the batch is observable: the call is atomic
        assert_eq!(store.platform_count().unwrap(), 0);
    }

    #[test]
    fn failed_sim_batch_is_not_half_committed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atomic_sims.db");
        let store = IngestStore::open(&path).unwrap();
        let saboteur = Connection::open(&path).unwrap();
        saboteur
            .execute_batch(
                "CREATE TRIGGER sim_boom BEFORE INSERT ON sims
                 WHEN NEW.Company = 'BOOM'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();
        drop(saboteur);

        let batch = vec![
            sim("8952000", "5551111", "MOVISTAR"),
            sim("8953000", "5552222", "BOOM"),
        ];
        assert!(store.insert_sims(&batch).is_err());
        assert_eq!(store.sim_count().unwrap(), 0);
    }

    #[test]
    fn dump_recreates_schema_and_rows() {
        let store = IngestStore::open_in_memory().unwrap();
        store
            .insert_platforms(&[platform("Unit'1", "ACME", "5551234")])
            .unwrap();
        store.insert_sims(&[sim("8952000", "5551234", "MOVISTAR")]).unwrap();
        let dump = store.dump_sql().unwrap();
        assert!(dump.contains("CREATE TABLE"));
        assert!(dump.contains("UNIQUE(Name, ClientAccount, Phone)"));
        assert!(dump.contains("INSERT INTO \"platforms\""));
        // Embedded quote escaped SQL-style
        assert!(dump.contains("'Unit''1'"));
        assert!(dump.contains("INSERT INTO \"sims\""));
    }
}
