//! Report module: writes the line-oriented benchmark summaries.
//!
//! Every statistic is emitted twice, once in nanoseconds and once in whole
//! milliseconds (truncated), each on its own labelled line.

use crate::insert::BenchmarkRun;
use bench_core::latency::{nanos_to_millis, LatencyReport};
use std::io::{self, Write};

const BANNER_FILL: &str = "******************";
const BANNER_TAIL: &str = "***********************";

fn write_metric(out: &mut dyn Write, label: &str, nanos: Option<u64>) -> io::Result<()> {
    match nanos {
        Some(n) => {
            writeln!(out, "{label} ns:{n}")?;
            writeln!(out, "{label} ms:{}", nanos_to_millis(n))
        }
        None => {
            writeln!(out, "{label} ns:undefined")?;
            writeln!(out, "{label} ms:undefined")
        }
    }
}

fn write_latency(out: &mut dyn Write, noun: &str, report: &LatencyReport) -> io::Result<()> {
    write_metric(out, &format!("Max {noun} time"), Some(report.max_nanos))?;
    write_metric(out, &format!("Min {noun} time"), report.min_nanos)?;
    write_metric(out, &format!("Total {noun} time"), Some(report.total_nanos))?;
    write_metric(out, &format!("Average {noun} time"), Some(report.average_nanos()))
}

pub fn write_insert_report(
    out: &mut dyn Write,
    run: &BenchmarkRun,
    report: &LatencyReport,
) -> io::Result<()> {
    writeln!(out, "{BANNER_FILL} INSERT BENCHMARKS {BANNER_TAIL}")?;
    writeln!(out, "INSERT statements executed:{}", run.row_count())?;
    writeln!(out, "COMMIT every {} rows inserted.", run.commit_every())?;
    writeln!(out, "{}", run.policy().label())?;
    write_latency(out, "insert", report)?;
    out.flush()
}

pub fn write_select_report(
    out: &mut dyn Write,
    lookups: u32,
    report: &LatencyReport,
) -> io::Result<()> {
    writeln!(out, "{BANNER_FILL} SELECT BENCHMARKS {BANNER_TAIL}")?;
    writeln!(out, "SELECT statements executed:{lookups}")?;
    write_latency(out, "select", report)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> Vec<String> {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn insert_report_lists_every_metric_in_both_units() {
        let run = BenchmarkRun::batched("TEST_TABLE", 10, 3).unwrap();
        let report = LatencyReport {
            count: 10,
            total_nanos: 25_000_000,
            min_nanos: Some(1_500),
            max_nanos: 7_900_000,
        };

        let lines = render(|buf| write_insert_report(buf, &run, &report));

        assert_eq!(lines[0], "****************** INSERT BENCHMARKS ***********************");
        assert_eq!(lines[1], "INSERT statements executed:10");
        assert_eq!(lines[2], "COMMIT every 3 rows inserted.");
        assert!(lines[3].contains("batch"), "mode line: {}", lines[3]);
        assert_eq!(
            &lines[4..],
            [
                "Max insert time ns:7900000",
                "Max insert time ms:7",
                "Min insert time ns:1500",
                "Min insert time ms:0",
                "Total insert time ns:25000000",
                "Total insert time ms:25",
                "Average insert time ns:2500000",
                "Average insert time ms:2",
            ]
        );
    }

    #[test]
    fn empty_select_report_has_zero_average_and_undefined_min() {
        let report = LatencyReport {
            count: 0,
            total_nanos: 0,
            min_nanos: None,
            max_nanos: 0,
        };

        let lines = render(|buf| write_select_report(buf, 0, &report));

        assert_eq!(lines[1], "SELECT statements executed:0");
        assert!(lines.contains(&"Min select time ns:undefined".to_string()));
        assert!(lines.contains(&"Average select time ns:0".to_string()));
        assert!(lines.contains(&"Average select time ms:0".to_string()));
    }
}
