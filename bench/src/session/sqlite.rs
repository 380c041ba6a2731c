//! SQLite session: rusqlite connection with explicit `BEGIN`/`COMMIT`
//! standing in for auto-commit control.

use super::{BenchSession, SchemaManager, Session};
use crate::error::{BenchError, Result};
use crate::populate::BenchmarkRow;
use rusqlite::{params, Connection};

const BACKEND: &str = "sqlite";

pub struct SqliteSession {
    conn: Connection,
    insert_sql: Option<String>,
    pending: Vec<BenchmarkRow>,
}

impl SqliteSession {
    /// Open a database file, or an in-memory database for `:memory:`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| BenchError::connection(BACKEND, e))?;

        if path != ":memory:" {
            configure_connection(&conn).map_err(|e| BenchError::connection(BACKEND, e))?;
        }
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteSession {
            conn,
            insert_sql: None,
            pending: Vec::new(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn insert_one(conn: &Connection, sql: &str, row: &BenchmarkRow) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(sql)?;
        stmt.execute(params![row.id, row.name, row.surname, row.created])
    }
}

/// WAL journaling for file-backed databases.
pub fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")
}

impl Session for SqliteSession {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.pending.clear();
            if self.in_transaction() {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| BenchError::statement("set auto-commit", e))?;
            }
        } else if !self.in_transaction() {
            self.conn
                .execute_batch("BEGIN")
                .map_err(|e| BenchError::statement("set auto-commit", e))?;
        }
        Ok(())
    }

    fn prepare_insert(&mut self, table: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {table} (id, name, surname, created_date) VALUES (?1, ?2, ?3, ?4)"
        );
        self.conn
            .prepare_cached(&sql)
            .map_err(|e| BenchError::statement("prepare insert", e))?;
        self.insert_sql = Some(sql);
        self.pending.clear();
        Ok(())
    }

    fn execute_insert(&mut self, row: &BenchmarkRow) -> Result<()> {
        let sql = self
            .insert_sql
            .as_deref()
            .ok_or_else(|| BenchError::statement("execute insert", "no INSERT prepared"))?;
        Self::insert_one(&self.conn, sql, row)
            .map_err(|e| BenchError::statement("execute insert", e))?;
        Ok(())
    }

    fn add_batch(&mut self, row: &BenchmarkRow) -> Result<()> {
        if self.insert_sql.is_none() {
            return Err(BenchError::statement("add batch", "no INSERT prepared"));
        }
        self.pending.push(row.clone());
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<usize> {
        let rows = std::mem::take(&mut self.pending);
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = self
            .insert_sql
            .as_deref()
            .ok_or_else(|| BenchError::statement("execute batch", "no INSERT prepared"))?;
        for row in &rows {
            Self::insert_one(&self.conn, sql, row)
                .map_err(|e| BenchError::statement("execute batch", e))?;
        }
        Ok(rows.len())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.conn
            .execute_batch("COMMIT; BEGIN")
            .map_err(|e| BenchError::statement("commit", e))
    }

    fn select_by_id(&mut self, table: &str, id: i32) -> Result<Vec<BenchmarkRow>> {
        let sql = format!("SELECT id, name, surname, created_date FROM {table} WHERE id = ?1");
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(|e| BenchError::statement("select by id", e))?;
        let rows = stmt
            .query_map([id], |r| {
                Ok(BenchmarkRow {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    surname: r.get(2)?,
                    created: r.get(3)?,
                })
            })
            .map_err(|e| BenchError::statement("select by id", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| BenchError::statement("select by id", e))
    }
}

impl SchemaManager for SqliteSession {
    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND upper(name) = upper(?1)",
                [table],
                |r| r.get(0),
            )
            .map_err(|e| BenchError::statement("check table", e))?;
        Ok(count > 0)
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.insert_sql = None;
        self.pending.clear();
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {table};"))
            .map_err(|e| BenchError::statement("drop table", e))
    }

    fn create_table(&mut self, table: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    ID INTEGER CONSTRAINT {table}_pk PRIMARY KEY,
                    NAME VARCHAR(255) NOT NULL,
                    SURNAME VARCHAR(255) NOT NULL,
                    CREATED_DATE DATE NOT NULL
                );"
            ))
            .map_err(|e| BenchError::statement("create table", e))
    }
}

impl BenchSession for SqliteSession {
    fn close(self: Box<Self>) -> Result<()> {
        let session = *self;
        session
            .conn
            .close()
            .map_err(|(_, e)| BenchError::connection(BACKEND, e))
    }
}
