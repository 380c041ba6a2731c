//! PostgreSQL session over the synchronous `postgres` client.
//!
//! Manual transaction control is plain `BEGIN`/`COMMIT` on the simple query
//! protocol. The INSERT is prepared once per run and point lookups reuse one
//! prepared statement per table.
//!
//! A batch flush is a single `INSERT .. SELECT FROM UNNEST(..)` carrying every
//! queued row as four array parameters, so it costs one round trip however
//! many rows it holds.

use super::{BenchSession, SchemaManager, Session};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::populate::BenchmarkRow;
use chrono::NaiveDate;
use postgres::{Client, NoTls, Statement};
use std::collections::HashMap;

const BACKEND: &str = "postgres";

pub struct PostgresSession {
    client: Client,
    insert: Option<Statement>,
    insert_batch: Option<Statement>,
    selects: HashMap<String, Statement>,
    pending: Vec<BenchmarkRow>,
    in_transaction: bool,
}

impl PostgresSession {
    pub fn connect(cfg: &BenchConfig) -> Result<Self> {
        let mut pg = postgres::Config::new();
        pg.host(&cfg.host)
            .port(cfg.port)
            .dbname(&cfg.database)
            .user(&cfg.user);
        if !cfg.password.is_empty() {
            pg.password(&cfg.password);
        }

        log::info!(
            "Connecting to postgres://{}@{}:{}/{}",
            cfg.user,
            cfg.host,
            cfg.port,
            cfg.database
        );
        let client = pg
            .connect(NoTls)
            .map_err(|e| BenchError::connection(BACKEND, e))?;
        Ok(Self::from_client(client))
    }

    /// Connect with a `postgres://` URL or key/value connection string.
    pub fn connect_url(url: &str) -> Result<Self> {
        let client = Client::connect(url, NoTls).map_err(|e| BenchError::connection(BACKEND, e))?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        PostgresSession {
            client,
            insert: None,
            insert_batch: None,
            selects: HashMap::new(),
            pending: Vec::new(),
            in_transaction: false,
        }
    }

    fn forget_statements(&mut self) {
        self.insert = None;
        self.insert_batch = None;
        self.selects.clear();
        self.pending.clear();
    }
}

fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (id, name, surname, created_date) VALUES ($1, $2, $3, $4)")
}

/// One statement inserting every element of four parallel arrays.
pub fn batch_insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (id, name, surname, created_date) \
         SELECT * FROM UNNEST($1::int4[], $2::text[], $3::text[], $4::date[])"
    )
}

/// Queued rows split into the array parameters of [`batch_insert_sql`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchColumns {
    pub ids: Vec<i32>,
    pub names: Vec<String>,
    pub surnames: Vec<String>,
    pub created: Vec<NaiveDate>,
}

impl BatchColumns {
    pub fn from_rows(rows: &[BenchmarkRow]) -> Self {
        let mut columns = BatchColumns {
            ids: Vec::with_capacity(rows.len()),
            names: Vec::with_capacity(rows.len()),
            surnames: Vec::with_capacity(rows.len()),
            created: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            columns.ids.push(row.id);
            columns.names.push(row.name.clone());
            columns.surnames.push(row.surname.clone());
            columns.created.push(row.created);
        }
        columns
    }
}

impl Session for PostgresSession {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.pending.clear();
            if self.in_transaction {
                self.in_transaction = false;
                self.client
                    .batch_execute("COMMIT")
                    .map_err(|e| BenchError::statement("set auto-commit", e))?;
            }
        } else if !self.in_transaction {
            self.client
                .batch_execute("BEGIN")
                .map_err(|e| BenchError::statement("set auto-commit", e))?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn prepare_insert(&mut self, table: &str) -> Result<()> {
        let single = self
            .client
            .prepare(&insert_sql(table))
            .map_err(|e| BenchError::statement("prepare insert", e))?;
        let batch = self
            .client
            .prepare(&batch_insert_sql(table))
            .map_err(|e| BenchError::statement("prepare insert", e))?;
        self.insert = Some(single);
        self.insert_batch = Some(batch);
        self.pending.clear();
        Ok(())
    }

    fn execute_insert(&mut self, row: &BenchmarkRow) -> Result<()> {
        let stmt = self
            .insert
            .as_ref()
            .ok_or_else(|| BenchError::statement("execute insert", "no INSERT prepared"))?;
        self.client
            .execute(stmt, &[&row.id, &row.name, &row.surname, &row.created])
            .map_err(|e| BenchError::statement("execute insert", e))?;
        Ok(())
    }

    fn add_batch(&mut self, row: &BenchmarkRow) -> Result<()> {
        if self.insert.is_none() {
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
        let stmt = self
            .insert_batch
            .as_ref()
            .ok_or_else(|| BenchError::statement("execute batch", "no INSERT prepared"))?;

        let columns = BatchColumns::from_rows(&rows);
        let inserted = self
            .client
            .execute(
                stmt,
                &[&columns.ids, &columns.names, &columns.surnames, &columns.created],
            )
            .map_err(|e| BenchError::statement("execute batch", e))?;
        log::trace!("batch of {} rows inserted {inserted}", rows.len());
        Ok(rows.len())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.client
            .batch_execute("COMMIT")
            .map_err(|e| BenchError::statement("commit", e))?;
        self.in_transaction = false;
        self.client
            .batch_execute("BEGIN")
            .map_err(|e| BenchError::statement("commit", e))?;
        self.in_transaction = true;
        Ok(())
    }

    fn select_by_id(&mut self, table: &str, id: i32) -> Result<Vec<BenchmarkRow>> {
        let stmt = match self.selects.get(table) {
            Some(stmt) => stmt.clone(),
            None => {
                let sql =
                    format!("SELECT id, name, surname, created_date FROM {table} WHERE id = $1");
                let stmt = self
                    .client
                    .prepare(&sql)
                    .map_err(|e| BenchError::statement("select by id", e))?;
                self.selects.insert(table.to_string(), stmt.clone());
                stmt
            }
        };

        let rows = self
            .client
            .query(&stmt, &[&id])
            .map_err(|e| BenchError::statement("select by id", e))?;
        rows.iter()
            .map(|r| {
                Ok(BenchmarkRow {
                    id: r.try_get(0)?,
                    name: r.try_get(1)?,
                    surname: r.try_get(2)?,
                    created: r.try_get(3)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, postgres::Error>>()
            .map_err(|e| BenchError::statement("select by id", e))
    }
}

impl SchemaManager for PostgresSession {
    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = current_schema()
                      AND upper(table_name) = upper($1)
                )",
                &[&table],
            )
            .map_err(|e| BenchError::statement("check table", e))?;
        row.try_get(0)
            .map_err(|e| BenchError::statement("check table", e))
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.forget_statements();
        self.client
            .batch_execute(&format!("DROP TABLE IF EXISTS {table};"))
            .map_err(|e| BenchError::statement("drop table", e))
    }

    fn create_table(&mut self, table: &str) -> Result<()> {
        self.forget_statements();
        self.client
            .batch_execute(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    ID INTEGER CONSTRAINT {table}_pk PRIMARY KEY,
                    NAME VARCHAR(255) NOT NULL,
                    SURNAME VARCHAR(255) NOT NULL,
                    CREATED_DATE DATE NOT NULL
                );
                COMMENT ON TABLE {table} IS 'INSERT/SELECT latency benchmark table';
                COMMENT ON COLUMN {table}.ID IS 'Primary key.';
                COMMENT ON COLUMN {table}.CREATED_DATE IS 'Row creation date';"
            ))
            .map_err(|e| BenchError::statement("create table", e))
    }
}

impl BenchSession for PostgresSession {
    fn close(self: Box<Self>) -> Result<()> {
        let session = *self;
        session
            .client
            .close()
            .map_err(|e| BenchError::connection(BACKEND, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populate::generate_row;

    #[test]
    fn batch_flush_is_one_statement() {
        let sql = batch_insert_sql("TEST_TABLE");
        assert!(sql.starts_with("INSERT INTO TEST_TABLE (id, name, surname, created_date)"));
        assert!(sql.contains("UNNEST($1::int4[], $2::text[], $3::text[], $4::date[])"));
        assert_eq!(sql.matches("INSERT").count(), 1);
        assert!(!sql.contains(';'));
    }

    #[test]
    fn batch_columns_keep_row_order() {
        let rows: Vec<_> = (1..=3).map(generate_row).collect();
        let columns = BatchColumns::from_rows(&rows);

        assert_eq!(columns.ids, vec![1, 2, 3]);
        assert_eq!(columns.names[2], "test_name3");
        assert_eq!(columns.surnames[0], "test_surname1");
        assert_eq!(columns.created.len(), 3);
    }
}
