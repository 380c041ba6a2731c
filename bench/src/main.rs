//! Standalone benchmark runner.
//!
//! Settings are resolved from, highest precedence first:
//!
//!   1. positional arguments `[database] [dbuser] [dbpassword]`
//!   2. `DBBENCH_<KEY>` environment variables
//!   3. `config.properties` (or the file named by `DBBENCH_CONFIG`)
//!   4. built-in defaults
//!
//! Usage:
//!   cargo run --release -p dbbench
//!   cargo run --release -p dbbench -- benchdb alice s3cret
//!   DBBENCH_BACKEND=sqlite DBBENCH_DATABASE=:memory: cargo run --release -p dbbench
//!
//! `DBBENCH_LOG` sets the log level (default `info`).

use dbbench::config::{self, BenchConfig};
use dbbench::session;
use log::LevelFilter;
use std::env;
use std::io;
use std::process;

const LOG_FILE: &str = "dbbench.log";

fn log_level_from_env() -> LevelFilter {
    env::var("DBBENCH_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn print_config(cfg: &BenchConfig) {
    println!("Backend:             {}", cfg.backend);
    println!("Database name:       {}", cfg.database);
    println!("Database user:       {}", cfg.user);
    println!(
        "Database password:   {}",
        if cfg.password.is_empty() { "(none)" } else { "********" }
    );
    println!("Database host:       {}:{}", cfg.host, cfg.port);
    println!("Table:               {}", cfg.table_name);
    println!("Max rows per commit: {}", cfg.max_rows_per_commit);
    println!("Max rows inserted:   {}", cfg.max_rows_inserted);
}

fn main() {
    bench_core::initialize_logger(log_level_from_env(), Some(LOG_FILE)).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {e}. Exiting.");
        process::exit(1);
    });

    log::info!("Starting dbbench v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = env::args().skip(1).collect();
    let cfg = config::load(&args).unwrap_or_else(|e| {
        log::error!("{e}. Exiting.");
        process::exit(1);
    });
    print_config(&cfg);

    let mut session = session::connect(&cfg).unwrap_or_else(|e| {
        log::error!("{e}. Exiting.");
        process::exit(1);
    });
    log::info!("Connected to {}", cfg.backend);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = dbbench::run_benchmarks(session.as_mut(), &cfg, &mut out);

    // Close on every path, including after a failed phase.
    let closed = session.close();

    let mut failed = false;
    if let Err(e) = &outcome {
        log::error!("Benchmark run failed: {e}");
        failed = true;
    }
    if let Err(e) = &closed {
        log::error!("Failed to close connection: {e}");
        failed = true;
    }
    if failed {
        process::exit(1);
    }
    log::info!("Benchmark complete");
}
