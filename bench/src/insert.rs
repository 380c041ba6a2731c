//! Insert benchmark driver.
//!
//! Writes rows `1..=row_count` through one prepared INSERT under manual
//! transaction control. Each row is timed on its own: the sample covers row
//! generation, binding and execution (or queueing), plus the batch flush and
//! commit on the rows that close a commit window.

use crate::error::{BenchError, Result};
use crate::populate::generate_row;
use crate::report;
use crate::session::{ManualCommit, Session};
use bench_core::clock;
use bench_core::constants::{MAX_ROWS_INSERTED, MAX_ROWS_PER_COMMIT};
use bench_core::latency::{LatencyReport, LatencyStats};
use std::io::Write;

/// How rows reach the database between commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    /// One execution per row.
    Sequential,
    /// Rows are queued and executed together at each commit boundary.
    Batched { batch_size: u32 },
}

impl CommitPolicy {
    pub fn label(&self) -> String {
        match self {
            CommitPolicy::Sequential => "Sequential INSERTs (one execution per row).".to_string(),
            CommitPolicy::Batched { batch_size } => {
                format!("Batched INSERTs (batch of {batch_size} INSERT statements per execution).")
            }
        }
    }
}

/// One invocation of the insert driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRun {
    table_name: String,
    row_count: u32,
    commit_every: u32,
    policy: CommitPolicy,
}

impl BenchmarkRun {
    pub fn new(
        table_name: impl Into<String>,
        row_count: u32,
        commit_every: u32,
        policy: CommitPolicy,
    ) -> Result<Self> {
        if commit_every == 0 {
            return Err(BenchError::config("commit interval must be at least 1 row"));
        }
        if commit_every > MAX_ROWS_PER_COMMIT {
            return Err(BenchError::config(format!(
                "commit interval {commit_every} exceeds the limit of {MAX_ROWS_PER_COMMIT}"
            )));
        }
        if row_count > MAX_ROWS_INSERTED {
            return Err(BenchError::config(format!(
                "{row_count} rows exceeds the limit of {MAX_ROWS_INSERTED}"
            )));
        }
        // Batches are flushed at commit boundaries, so the two must agree.
        if let CommitPolicy::Batched { batch_size } = policy {
            if batch_size != commit_every {
                return Err(BenchError::config(format!(
                    "batch size {batch_size} must equal the commit interval {commit_every}"
                )));
            }
        }

        Ok(BenchmarkRun {
            table_name: table_name.into(),
            row_count,
            commit_every,
            policy,
        })
    }

    pub fn sequential(
        table_name: impl Into<String>,
        row_count: u32,
        commit_every: u32,
    ) -> Result<Self> {
        Self::new(table_name, row_count, commit_every, CommitPolicy::Sequential)
    }

    /// Batched run whose batch size equals the commit interval.
    pub fn batched(
        table_name: impl Into<String>,
        row_count: u32,
        commit_every: u32,
    ) -> Result<Self> {
        Self::new(
            table_name,
            row_count,
            commit_every,
            CommitPolicy::Batched {
                batch_size: commit_every,
            },
        )
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn commit_every(&self) -> u32 {
        self.commit_every
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Row `i` (1-based) closes a commit window.
    pub fn is_commit_boundary(&self, i: u32) -> bool {
        i % self.commit_every == 0 || i == self.row_count
    }
}

/// Run the insert benchmark and write its report to `out`.
///
/// Auto-commit is off for the duration of the run and back on afterwards,
/// on success and on failure. Errors are logged and returned without retry;
/// no report is written for a failed run.
pub fn run_insert_benchmark<S: Session + ?Sized>(
    session: &mut S,
    run: &BenchmarkRun,
    out: &mut dyn Write,
) -> Result<LatencyReport> {
    log::info!(
        "Insert benchmark: {} rows into {} on {}, commit every {} ({:?})",
        run.row_count,
        run.table_name,
        session.backend(),
        run.commit_every,
        run.policy
    );

    let stats = timed_inserts(session, run)
        .inspect_err(|e| log::error!("Insert benchmark aborted: {e}"))?;

    let report = stats.report();
    report::write_insert_report(out, run, &report)?;
    Ok(report)
}

fn timed_inserts<S: Session + ?Sized>(
    session: &mut S,
    run: &BenchmarkRun,
) -> Result<LatencyStats> {
    let mut session = ManualCommit::begin(session)?;
    session.prepare_insert(&run.table_name)?;

    let mut stats = LatencyStats::new();
    for i in 1..=run.row_count {
        let started = clock::start();

        // ids are bounded by MAX_ROWS_INSERTED, well inside i32
        let row = generate_row(i as i32);
        match run.policy {
            CommitPolicy::Sequential => session.execute_insert(&row)?,
            CommitPolicy::Batched { .. } => session.add_batch(&row)?,
        }

        if run.is_commit_boundary(i) {
            if let CommitPolicy::Batched { .. } = run.policy {
                let flushed = session.execute_batch()?;
                log::trace!("row {i}: flushed batch of {flushed}");
            }
            session.commit()?;
        }

        stats = stats.record(clock::elapsed(started));
    }

    // Every window was already closed in the loop; this must be a no-op.
    session.commit()?;
    Ok(stats)
}
