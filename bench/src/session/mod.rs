//! Database session seam.
//!
//! The drivers only see [`Session`]: an exclusively owned, blocking
//! connection that can prepare the benchmark INSERT, run it per row or as a
//! batch, commit, toggle auto-commit and perform point lookups. Table
//! lifecycle lives behind [`SchemaManager`].
//!
//! Two implementations are provided:
//! - [`sqlite::SqliteSession`]: rusqlite, file-backed or `:memory:`
//! - [`postgres::PostgresSession`]: synchronous PostgreSQL client

pub mod postgres;
pub mod sqlite;

use crate::config::{Backend, BenchConfig};
use crate::error::Result;
use crate::populate::BenchmarkRow;
use std::ops::{Deref, DerefMut};

pub use self::postgres::PostgresSession;
pub use self::sqlite::SqliteSession;

pub trait Session {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    /// Switch between auto-commit and manual transaction control.
    ///
    /// Turning auto-commit back on while a transaction is open commits it.
    /// Rows added with [`Session::add_batch`] but never executed are dropped.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<()>;

    /// Prepare `INSERT INTO <table> (id, name, surname, created_date)` for
    /// the following insert calls. Discards any pending batch.
    fn prepare_insert(&mut self, table: &str) -> Result<()>;

    /// Bind `row` to the prepared INSERT and execute it immediately.
    fn execute_insert(&mut self, row: &BenchmarkRow) -> Result<()>;

    /// Bind `row` to the prepared INSERT and queue it without executing.
    fn add_batch(&mut self, row: &BenchmarkRow) -> Result<()>;

    /// Execute every queued row. Returns how many were executed.
    fn execute_batch(&mut self) -> Result<usize>;

    /// Commit the open transaction. A no-op in auto-commit mode or when
    /// there is nothing pending.
    fn commit(&mut self) -> Result<()>;

    /// `SELECT id, name, surname, created_date FROM <table> WHERE id = ?`,
    /// with the cursor fully drained.
    fn select_by_id(&mut self, table: &str, id: i32) -> Result<Vec<BenchmarkRow>>;
}

pub trait SchemaManager {
    fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// `DROP TABLE IF EXISTS`.
    fn drop_table(&mut self, table: &str) -> Result<()>;

    /// Create `(id INTEGER PRIMARY KEY, name VARCHAR, surname VARCHAR,
    /// created_date DATE)` if missing.
    fn create_table(&mut self, table: &str) -> Result<()>;
}

/// A session the binary can drive end to end.
pub trait BenchSession: Session + SchemaManager {
    fn close(self: Box<Self>) -> Result<()>;
}

/// Open a session for the configured backend.
pub fn connect(cfg: &BenchConfig) -> Result<Box<dyn BenchSession>> {
    match cfg.backend {
        Backend::Postgres => Ok(Box::new(PostgresSession::connect(cfg)?)),
        Backend::Sqlite => Ok(Box::new(SqliteSession::open(&cfg.database)?)),
    }
}

/// Manual transaction control for the lifetime of the guard.
///
/// Auto-commit is switched off by [`ManualCommit::begin`] and switched back
/// on when the guard drops, whichever way the scope is left.
pub struct ManualCommit<'a, S: Session + ?Sized> {
    session: &'a mut S,
}

impl<'a, S: Session + ?Sized> ManualCommit<'a, S> {
    pub fn begin(session: &'a mut S) -> Result<Self> {
        session.set_auto_commit(false)?;
        log::debug!("{}: auto-commit off", session.backend());
        Ok(ManualCommit { session })
    }
}

impl<S: Session + ?Sized> Deref for ManualCommit<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
    }
}

impl<S: Session + ?Sized> DerefMut for ManualCommit<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session
    }
}

impl<S: Session + ?Sized> Drop for ManualCommit<'_, S> {
    fn drop(&mut self) {
        match self.session.set_auto_commit(true) {
            Ok(()) => log::debug!("{}: auto-commit restored", self.session.backend()),
            Err(e) => log::error!(
                "{}: failed to restore auto-commit: {e}",
                self.session.backend()
            ),
        }
    }
}
