//! Row generation: synthesizes the benchmark rows from their index.
//!
//! `name` and `surname` are a pure function of the index so a lookup of id
//! `i` can be checked against `generate_row(i)`. `created` is sampled from
//! the local calendar on every call and is not reproducible.

use chrono::{Local, NaiveDate};

/// One row of the benchmark table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRow {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub created: NaiveDate,
}

pub fn generate_row(index: i32) -> BenchmarkRow {
    BenchmarkRow {
        id: index,
        name: row_name(index),
        surname: row_surname(index),
        created: Local::now().date_naive(),
    }
}

pub fn row_name(index: i32) -> String {
    format!("test_name{index}")
}

pub fn row_surname(index: i32) -> String {
    format!("test_surname{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_derive_from_index() {
        let row = generate_row(42);
        assert_eq!(row.id, 42);
        assert_eq!(row.name, "test_name42");
        assert_eq!(row.surname, "test_surname42");
    }

    #[test]
    fn same_index_same_text() {
        let a = generate_row(7);
        let b = generate_row(7);
        assert_eq!(a.name, b.name);
        assert_eq!(a.surname, b.surname);
        assert_ne!(a.name, generate_row(8).name);
    }

    #[test]
    fn created_is_today() {
        let before = Local::now().date_naive();
        let row = generate_row(1);
        let after = Local::now().date_naive();
        assert!(row.created >= before && row.created <= after);
    }
}
