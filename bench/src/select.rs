//! Select benchmark driver: one timed point lookup per id in `1..=row_count`.
//!
//! Lookups are not checked against what was inserted. An id with no row
//! still costs a round trip and still contributes a sample.

use crate::error::{BenchError, Result};
use crate::report;
use crate::session::Session;
use bench_core::clock;
use bench_core::constants::MAX_ROWS_INSERTED;
use bench_core::latency::{LatencyReport, LatencyStats};
use std::io::Write;

/// Run the select benchmark against `table` and write its report to `out`.
pub fn run_select_benchmark<S: Session + ?Sized>(
    session: &mut S,
    table: &str,
    row_count: u32,
    out: &mut dyn Write,
) -> Result<LatencyReport> {
    if row_count > MAX_ROWS_INSERTED {
        return Err(BenchError::config(format!(
            "{row_count} lookups exceeds the limit of {MAX_ROWS_INSERTED}"
        )));
    }
    log::info!(
        "Select benchmark: {row_count} point lookups on {table} ({})",
        session.backend()
    );

    let stats = timed_lookups(session, table, row_count)
        .inspect_err(|e| log::error!("Select benchmark aborted: {e}"))?;

    let report = stats.report();
    report::write_select_report(out, row_count, &report)?;
    Ok(report)
}

fn timed_lookups<S: Session + ?Sized>(
    session: &mut S,
    table: &str,
    row_count: u32,
) -> Result<LatencyStats> {
    let mut stats = LatencyStats::new();
    let mut hits = 0usize;

    for i in 1..=row_count {
        let started = clock::start();
        let rows = session.select_by_id(table, i as i32)?;
        stats = stats.record(clock::elapsed(started));
        hits += rows.len();
    }

    log::debug!("{hits} of {row_count} lookups returned a row");
    Ok(stats)
}
