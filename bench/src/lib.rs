//! Database INSERT/SELECT latency benchmark
//!
//! Times single-row sequential inserts, batched inserts with periodic
//! commits, and primary-key point lookups against PostgreSQL or SQLite, and
//! reports min/max/total/average latency for each phase.
//!
//! Run the benchmark: `cargo run --release -p dbbench -- [database] [user] [password]`
//! Run tests: `cargo test`

pub mod config;
pub mod error;
pub mod insert;
pub mod populate;
pub mod report;
pub mod schema;
pub mod select;
pub mod session;

use crate::config::BenchConfig;
use crate::error::Result;
use crate::insert::{run_insert_benchmark, BenchmarkRun};
use crate::select::run_select_benchmark;
use crate::session::BenchSession;
use bench_core::latency::LatencyReport;
use std::io::Write;

/// Reports from one full run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchSummary {
    pub batched_insert: LatencyReport,
    pub sequential_insert: LatencyReport,
    pub select: LatencyReport,
}

/// Run every phase against an open session: reset the table, batched
/// inserts, recreate, sequential inserts, then point lookups.
///
/// The first failing phase stops the run. The session stays open either way.
pub fn run_benchmarks<S: BenchSession + ?Sized>(
    session: &mut S,
    cfg: &BenchConfig,
    out: &mut dyn Write,
) -> Result<BenchSummary> {
    let table = cfg.table_name.as_str();
    let batched = BenchmarkRun::batched(table, cfg.max_rows_inserted, cfg.max_rows_per_commit)?;
    let sequential =
        BenchmarkRun::sequential(table, cfg.max_rows_inserted, cfg.max_rows_per_commit)?;

    schema::reset_table(session, table)?;

    log::info!("Inserting into {table}...");
    let batched_insert = run_insert_benchmark(session, &batched, out)?;
    schema::recreate_table(session, table)?;
    let sequential_insert = run_insert_benchmark(session, &sequential, out)?;
    log::info!("Inserts finished");

    log::info!("Point lookups on {table}...");
    let select = run_select_benchmark(session, table, cfg.max_rows_inserted, out)?;
    log::info!("Select benchmark finished");

    Ok(BenchSummary {
        batched_insert,
        sequential_insert,
        select,
    })
}
