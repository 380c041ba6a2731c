//! Table lifecycle helpers run between benchmark phases.

use crate::error::Result;
use crate::session::SchemaManager;

/// Drop `table` when it exists, then create it empty.
pub fn reset_table<S: SchemaManager + ?Sized>(session: &mut S, table: &str) -> Result<()> {
    if session.table_exists(table)? {
        log::info!("Table {table} already exists, dropping it for a fresh run");
        session.drop_table(table)?;
        log::info!("Table {table} dropped");
    }
    session.create_table(table)?;
    log::info!("Table {table} created");
    Ok(())
}

/// Unconditional drop + create. Leaves an empty table whatever it held.
pub fn recreate_table<S: SchemaManager + ?Sized>(session: &mut S, table: &str) -> Result<()> {
    session.drop_table(table)?;
    session.create_table(table)
}
