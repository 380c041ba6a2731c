//! Integration tests: full insert/select runs against in-memory SQLite.

use dbbench::config::{Backend, BenchConfig};
use dbbench::error::BenchError;
use dbbench::insert::{run_insert_benchmark, BenchmarkRun};
use dbbench::populate::{row_name, row_surname};
use dbbench::schema::{recreate_table, reset_table};
use dbbench::select::run_select_benchmark;
use dbbench::session::{PostgresSession, SchemaManager, Session, SqliteSession};

const TABLE: &str = "TEST_TABLE";

fn fresh_session() -> SqliteSession {
    let mut session = SqliteSession::open_in_memory().expect("open");
    reset_table(&mut session, TABLE).expect("reset table");
    session
}

fn row_count(session: &SqliteSession) -> i64 {
    session
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |r| r.get(0))
        .unwrap()
}

fn sqlite_config(rows: u32, every: u32) -> BenchConfig {
    BenchConfig {
        backend: Backend::Sqlite,
        database: ":memory:".to_string(),
        user: String::new(),
        password: String::new(),
        host: String::new(),
        port: 0,
        table_name: TABLE.to_string(),
        max_rows_per_commit: every,
        max_rows_inserted: rows,
    }
}

#[test]
fn sequential_insert_writes_every_row() {
    let mut session = fresh_session();
    let mut out = Vec::new();

    let report = run_insert_benchmark(
        &mut session,
        &BenchmarkRun::sequential(TABLE, 250, 40).unwrap(),
        &mut out,
    )
    .unwrap();

    assert_eq!(report.count, 250);
    assert_eq!(row_count(&session), 250);
    assert!(session.connection().is_autocommit());
}

#[test]
fn batched_insert_writes_every_row_including_partial_batch() {
    let mut session = fresh_session();
    let mut out = Vec::new();

    let report = run_insert_benchmark(
        &mut session,
        &BenchmarkRun::batched(TABLE, 103, 10).unwrap(),
        &mut out,
    )
    .unwrap();

    assert_eq!(report.count, 103);
    assert_eq!(row_count(&session), 103);
    assert!(session.connection().is_autocommit());

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("INSERT statements executed:103"));
    assert!(text.contains("COMMIT every 10 rows inserted."));
}

#[test]
fn select_round_trip_matches_generated_rows() {
    let mut session = fresh_session();
    let mut out = Vec::new();
    run_insert_benchmark(
        &mut session,
        &BenchmarkRun::batched(TABLE, 20, 6).unwrap(),
        &mut out,
    )
    .unwrap();

    for id in [1, 7, 20] {
        let rows = session.select_by_id(TABLE, id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].name, row_name(id));
        assert_eq!(rows[0].surname, row_surname(id));
    }

    let report = run_select_benchmark(&mut session, TABLE, 20, &mut out).unwrap();
    assert_eq!(report.count, 20);
    if let Some(min) = report.min_nanos {
        assert!(min <= report.max_nanos);
    }
}

#[test]
fn select_of_absent_id_returns_nothing_but_is_timed() {
    let mut session = fresh_session();
    let mut out = Vec::new();

    assert!(session.select_by_id(TABLE, 99).unwrap().is_empty());

    let report = run_select_benchmark(&mut session, TABLE, 5, &mut out).unwrap();
    assert_eq!(report.count, 5);
}

#[test]
fn recreate_leaves_empty_table() {
    let mut session = fresh_session();
    let mut out = Vec::new();
    run_insert_benchmark(
        &mut session,
        &BenchmarkRun::sequential(TABLE, 15, 4).unwrap(),
        &mut out,
    )
    .unwrap();
    assert_eq!(row_count(&session), 15);

    recreate_table(&mut session, TABLE).unwrap();
    assert_eq!(row_count(&session), 0);

    recreate_table(&mut session, TABLE).unwrap();
    assert_eq!(row_count(&session), 0);
    assert!(session.table_exists(TABLE).unwrap());
    assert!(session.table_exists("test_table").unwrap());
}

#[test]
fn duplicate_ids_abort_the_run_and_restore_auto_commit() {
    let mut session = fresh_session();
    let mut out = Vec::new();
    let run = BenchmarkRun::sequential(TABLE, 5, 2).unwrap();

    run_insert_benchmark(&mut session, &run, &mut out).unwrap();
    out.clear();

    let err = run_insert_benchmark(&mut session, &run, &mut out).unwrap_err();

    assert!(matches!(err, BenchError::Statement { .. }), "{err}");
    assert!(out.is_empty());
    assert!(session.connection().is_autocommit());
    assert_eq!(row_count(&session), 5);
}

#[test]
fn insert_into_missing_table_fails_before_any_row() {
    let mut session = SqliteSession::open_in_memory().unwrap();
    let mut out = Vec::new();

    let err = run_insert_benchmark(
        &mut session,
        &BenchmarkRun::batched("NO_SUCH_TABLE", 5, 2).unwrap(),
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        BenchError::Statement {
            operation: "prepare insert",
            ..
        }
    ));
    assert!(session.connection().is_autocommit());
}

#[test]
fn full_run_produces_three_reports() {
    let mut session = SqliteSession::open_in_memory().unwrap();
    let cfg = sqlite_config(30, 7);
    let mut out = Vec::new();

    let summary = dbbench::run_benchmarks(&mut session, &cfg, &mut out).unwrap();

    assert_eq!(summary.batched_insert.count, 30);
    assert_eq!(summary.sequential_insert.count, 30);
    assert_eq!(summary.select.count, 30);
    assert_eq!(row_count(&session), 30);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("INSERT BENCHMARKS").count(), 2);
    assert_eq!(text.matches("SELECT BENCHMARKS").count(), 1);
}

#[test]
fn full_run_with_zero_rows() {
    let mut session = SqliteSession::open_in_memory().unwrap();
    let cfg = sqlite_config(0, 5);
    let mut out = Vec::new();

    let summary = dbbench::run_benchmarks(&mut session, &cfg, &mut out).unwrap();

    assert_eq!(summary.batched_insert.count, 0);
    assert_eq!(summary.select.average_nanos(), 0);
}

#[test]
#[ignore = "requires a PostgreSQL server; set DBBENCH_PG_URL"]
fn postgres_round_trip() {
    let url = std::env::var("DBBENCH_PG_URL").expect("DBBENCH_PG_URL must be set");
    let mut session = PostgresSession::connect_url(&url).expect("connect");
    let table = "dbbench_it";
    reset_table(&mut session, table).unwrap();

    let mut out = Vec::new();
    run_insert_benchmark(
        &mut session,
        &BenchmarkRun::batched(table, 50, 8).unwrap(),
        &mut out,
    )
    .unwrap();
    let report = run_select_benchmark(&mut session, table, 50, &mut out).unwrap();
    assert_eq!(report.count, 50);

    let rows = session.select_by_id(table, 17).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, row_name(17));

    // 50 rows flushed as 7 array inserts, including the partial tail
    for id in 1..=50 {
        assert_eq!(session.select_by_id(table, id).unwrap().len(), 1, "id {id}");
    }

    session.drop_table(table).unwrap();
}
