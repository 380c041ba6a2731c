/// Hard ceiling on the number of rows a single insert run may write.
pub const MAX_ROWS_INSERTED: u32 = 2_000_000;

/// Hard ceiling on the number of rows between two commits.
pub const MAX_ROWS_PER_COMMIT: u32 = 500_000;

/// Table the benchmark drops, recreates and fills on every run.
pub const DEFAULT_TABLE_NAME: &str = "TEST_TABLE";

pub const NANOS_PER_MILLI: u64 = 1_000_000;
