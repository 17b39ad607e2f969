use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use homologa::pipeline::{run_platform_ingest, run_sim_ingest};
use homologa::report::platform_records_to_csv;
use homologa::resolve::SimColumnMap;
use homologa::store::{platform_db_path, IngestStore, SIM_DB_FILE};
use homologa::{logging, profiles};

#[derive(Parser)]
#[command(name = "homologa")]
#[command(about = "Homologation pipeline for GPS-platform and SIM-card usage reports")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a platform workbook into the per-day database
    Platforms {
        /// Workbook to process; an embedded YYYY-MM-DD token dates the records
        #[arg(long)]
        file: PathBuf,
        /// Directory holding the per-day databases
        #[arg(long, default_value = ".")]
        db_dir: PathBuf,
        /// Write rejected (duplicate) records to this CSV file
        #[arg(long)]
        rejected_out: Option<PathBuf>,
        /// Print the per-origin summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Ingest SIM workbooks/CSV files into the SIM database
    Sims {
        /// Files to process (xlsx or csv); may be repeated
        #[arg(long, required = true)]
        file: Vec<PathBuf>,
        /// SIM database path
        #[arg(long, default_value = SIM_DB_FILE)]
        db: PathBuf,
        /// Manual column mapping for an unregistered source:
        /// SOURCE=iccid,phone,sim_status,session_status,consumption (indices)
        #[arg(long)]
        map: Vec<String>,
    },
    /// Write a logical SQL dump of a database
    Dump {
        /// Database to dump
        #[arg(long)]
        db: PathBuf,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_manual_map(spec: &str) -> anyhow::Result<(String, SimColumnMap)> {
    let (source, indices) = spec
        .split_once('=')
        .with_context(|| format!("expected SOURCE=i,i,i,i,i in '{spec}'"))?;
    let parsed: Vec<usize> = indices
        .split(',')
        .map(|i| i.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid column index in '{spec}'"))?;
    if parsed.len() != 5 {
        bail!("manual mapping needs exactly 5 column indices, got {} in '{spec}'", parsed.len());
    }
    Ok((
        source.to_string(),
        SimColumnMap::manual(parsed[0], parsed[1], parsed[2], parsed[3], parsed[4]),
    ))
}

fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Platforms {
            file,
            db_dir,
            rejected_out,
            json,
        } => {
            println!("🔄 Running platform ingest...");
            let db_path = platform_db_path(&db_dir);
            let store = IngestStore::open(&db_path)?;
            info!(db = %db_path.display(), "opened platform store");

            let report = run_platform_ingest(&file, &store)?;
            println!("\n📊 Platform ingest results:");
            println!("   Total rows:       {}", report.total_rows);
            println!("   Inserted:         {}", report.inserted);
            println!("   Rejected (dupes): {}", report.rejected.len());
            println!("   Invalid:          {}", report.invalid.len());

            if json {
                println!("{}", serde_json::to_string_pretty(&report.summary)?);
            } else {
                println!("\n📋 Per-origin summary:");
                let origin_line = |origin: &str, count: usize, percent: &str| {
                    let mapped = profiles::platform_profile(origin)
                        .map(|p| p.mapped_field_count())
                        .unwrap_or(0);
                    println!("   {origin:<14} {count:>6}  {percent:>6}  ({mapped} mapped fields)");
                };
                for row in &report.summary {
                    origin_line(&row.group, row.count, &row.percent_label());
                }
                for source in profiles::platform_sources() {
                    if !report.summary.iter().any(|r| r.group == source) {
                        origin_line(source, 0, "0.0%");
                    }
                }
            }

            if !report.failures.is_empty() {
                println!("\n⚠️  Sources that failed:");
                for failure in &report.failures {
                    error!(source = %failure.source_id, reason = %failure.reason, "source failed");
                    println!("   - {}: {}", failure.source_id, failure.reason);
                }
            }

            if let Some(out) = rejected_out {
                let csv = platform_records_to_csv(&report.rejected)?;
                fs::write(&out, csv)?;
                println!("\n💾 Rejected records written to {}", out.display());
            }
        }
        Commands::Sims { file, db, map } => {
            println!("🔄 Running SIM ingest...");
            let mut manual = HashMap::new();
            for spec in &map {
                let (source, column_map) = parse_manual_map(spec)?;
                manual.insert(source, column_map);
            }
            let store = IngestStore::open(&db)?;
            info!(db = %db.display(), "opened SIM store");

            let report = run_sim_ingest(&file, &manual, &store)?;
            println!("\n📊 SIM ingest results:");
            println!("   Submitted: {}", report.total_submitted);
            println!("   Inserted:  {}", report.total_inserted);

            println!("\n📋 Per-source stats:");
            for section in &report.sections {
                println!(
                    "   {} / {}: submitted {}, inserted {}, rate {:.2}%",
                    section.file,
                    section.source_id,
                    section.submitted,
                    section.inserted,
                    section.insertion_rate()
                );
            }

            if !report.failures.is_empty() {
                println!("\n⚠️  Sources that failed:");
                for failure in &report.failures {
                    println!("   - {}: {}", failure.source_id, failure.reason);
                }
            }
        }
        Commands::Dump { db, out } => {
            let store = IngestStore::open(&db)?;
            let dump = store.dump_sql()?;
            match out {
                Some(path) => {
                    fs::write(&path, dump)?;
                    println!("💾 SQL dump written to {}", path.display());
                }
                None => print!("{dump}"),
            }
        }
    }
    Ok(())
}
