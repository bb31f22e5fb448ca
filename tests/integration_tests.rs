//! Integration tests for the interval-bars pipeline
//!
//! These tests drive the loader, aggregator and writer together.

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::PathBuf;

use interval_bars::aggregate::{aggregate_all, interleave};
use interval_bars::config::{InvalidNumberPolicy, WindowSpan};
use interval_bars::data::{read_records, write_to};
use interval_bars::pipeline::{self, build_output};
use interval_bars::{Config, IntervalRecord, Symbol};

// =============================================================================
// Test Utilities
// =============================================================================

const HEADER: &str = "Date,Open,High,Low,Close,Adj Close,Volume";

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 13, 42, 7).unwrap()
}

/// CSV with `count` rows; row i (1-based) has open i.1, high i.9, low i.0,
/// close i.5, volume i*100
fn generate_csv(count: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 1..=count {
        csv.push_str(&format!(
            "2024-05-20,{i}.1,{i}.9,{i}.0,{i}.5,{i}.5,{}\n",
            i * 100
        ));
    }
    csv
}

fn convert(csv: &str, config: &Config) -> Vec<IntervalRecord> {
    let report = read_records(csv.as_bytes(), &Symbol::new("XYZ"), base_time(), config).unwrap();
    build_output(&report.records, config).1
}

fn render(records: &[IntervalRecord]) -> Vec<String> {
    let mut out = Vec::new();
    write_to(&mut out, records, false).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("interval_bars_{}_{}", std::process::id(), name))
}

// =============================================================================
// End-to-end Scenarios
// =============================================================================

#[test]
fn test_five_rows_produce_one_five_bar_aggregate() {
    let lines = render(&convert(&generate_csv(5), &Config::default()));

    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "XYZ,1.5,2024-05-20T09:01:00Z,1,1.9,1.0,1.1,100");
    assert_eq!(lines[4], "XYZ,5.5,2024-05-20T09:05:00Z,1,5.9,5.0,5.1,500");
    // open from row 1, close and timestamp from row 5, extremes and volume from rows 2-5
    assert_eq!(lines[5], "XYZ,5.5,2024-05-20T09:05:00Z,5,5.9,2.0,1.1,1400");
}

#[test]
fn test_fewer_rows_than_smallest_window() {
    let records = convert(&generate_csv(4), &Config::default());
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.is_raw()));
}

#[test]
fn test_full_window_span() {
    let config = Config {
        window_span: WindowSpan::Full,
        ..Default::default()
    };
    let lines = render(&convert(&generate_csv(5), &config));
    assert_eq!(lines[5], "XYZ,5.5,2024-05-20T09:05:00Z,5,5.9,1.0,1.1,1500");
}

#[test]
fn test_exclude_window_close() {
    let config = Config {
        window_span: WindowSpan::ExcludeClose,
        ..Default::default()
    };
    let lines = render(&convert(&generate_csv(5), &config));
    assert_eq!(lines[5], "XYZ,5.5,2024-05-20T09:05:00Z,5,4.9,1.0,1.1,1000");
}

#[test]
fn test_raw_text_passes_through_verbatim() {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    csv.push_str("d1,1.5e3,+2,1,0.12345678901234567890123456789,x,100\n");
    csv.push_str("d2,7,8,6,7.50,x,123456789012345678901234567890\n");
    csv.push_str("d3,7,8,6,7.5,x,1\n");
    csv.push_str("d4,7,8,6,7.5,x,1\n");
    csv.push_str("d5,7.0,8.0,6.0,7.5,x,1\n");

    let lines = render(&convert(&csv, &Config::default()));

    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "XYZ,0.12345678901234567890123456789,2024-05-20T09:01:00Z,1,+2,1,1.5e3,100"
    );
    assert_eq!(
        lines[1],
        "XYZ,7.50,2024-05-20T09:02:00Z,1,8,6,7,123456789012345678901234567890"
    );
    assert_eq!(lines[4], "XYZ,7.5,2024-05-20T09:05:00Z,1,8.0,6.0,7.0,1");
    // The aggregate keeps row 1's open text and still sums the oversized volume
    assert!(lines[5].starts_with("XYZ,7.5,2024-05-20T09:05:00Z,5,8,6,1.5e3,"));
    assert!(!lines[5].ends_with(",0"));
}

#[test]
fn test_sixty_rows_emit_every_window() {
    let records = convert(&generate_csv(60), &Config::default());

    let count = |w: usize| records.iter().filter(|r| r.interval == w).count();
    assert_eq!(count(1), 60);
    assert_eq!(count(5), 12);
    assert_eq!(count(15), 4);
    assert_eq!(count(30), 2);
    assert_eq!(count(60), 1);

    let tail: Vec<usize> = records[records.len() - 5..].iter().map(|r| r.interval).collect();
    assert_eq!(tail, vec![1, 5, 15, 30, 60]);
}

#[test]
fn test_trigger_positions_follow_raw_positions() {
    let records = convert(&generate_csv(33), &Config::default());

    let mut raw_seen = 0;
    for record in &records {
        if record.is_raw() {
            raw_seen += 1;
        } else {
            assert_eq!(raw_seen % record.interval, 0);
        }
    }
    assert_eq!(raw_seen, 33);
}

#[test]
fn test_null_rows_shift_windows_to_filtered_count() {
    let mut csv = generate_csv(5);
    csv.push_str("2024-05-20,null,null,null,null,null,null\n");
    csv.push_str("2024-05-20,6.1,6.9,6.0,6.5,6.5,600\n");
    // Insert a null row between rows 2 and 3
    let mut lines: Vec<&str> = csv.lines().collect();
    lines.insert(3, "2024-05-20,3.1,null,3.0,3.5,3.5,300");
    let csv = lines.join("\n");

    let records = convert(&csv, &Config::default());

    // 6 surviving rows + one aggregate after the 5th survivor
    assert_eq!(records.len(), 7);
    assert_eq!(records[5].interval, 5);
    assert_eq!(records[5].close, records[4].close);
    // Position 3 was consumed by the dropped row
    assert_eq!(
        records[2].created_at,
        Utc.with_ymd_and_hms(2024, 5, 20, 9, 4, 0).unwrap()
    );
}

#[test]
fn test_pass_through_is_unchanged() {
    let csv = generate_csv(47);
    let config = Config::default();
    let raw = read_records(csv.as_bytes(), &Symbol::new("XYZ"), base_time(), &config)
        .unwrap()
        .records;
    let combined = interleave(&raw, &aggregate_all(&raw, &config.windows, config.window_span));

    let passed: Vec<&IntervalRecord> = combined.iter().filter(|r| r.is_raw()).collect();
    assert_eq!(passed.len(), raw.len());
    for (out, original) in passed.iter().zip(&raw) {
        assert_eq!(*out, original);
    }
}

#[test]
fn test_removing_a_window_leaves_others_unchanged() {
    let csv = generate_csv(90);
    let all = convert(&csv, &Config::default());
    let without_15 = convert(
        &csv,
        &Config {
            windows: vec![5, 30, 60],
            ..Default::default()
        },
    );

    let pick = |records: &[IntervalRecord], w: usize| -> Vec<IntervalRecord> {
        records.iter().filter(|r| r.interval == w).cloned().collect()
    };
    for w in [1, 5, 30, 60] {
        assert_eq!(pick(&all, w), pick(&without_15, w));
    }
}

#[test]
fn test_strict_mode_rejects_bad_numbers() {
    let mut csv = generate_csv(3);
    csv.push_str("2024-05-20,1.0,n/a,0.5,0.7,0.7,10\n");
    let config = Config {
        invalid_numbers: InvalidNumberPolicy::Fail,
        ..Default::default()
    };

    let result = read_records(csv.as_bytes(), &Symbol::new("XYZ"), base_time(), &config);
    assert!(result.is_err());

    let lenient = read_records(csv.as_bytes(), &Symbol::new("XYZ"), base_time(), &Config::default())
        .unwrap();
    assert_eq!(lenient.records.len(), 3);
    assert_eq!(lenient.dropped_invalid, 1);
}

// =============================================================================
// File Round Trip
// =============================================================================

#[test]
fn test_convert_file_writes_output() {
    let input = temp_path("input.csv");
    let output = temp_path("Result_input.csv");
    fs::write(&input, generate_csv(15)).unwrap();

    let summary = pipeline::convert_file(
        &input,
        &output,
        &Symbol::new("XYZ"),
        base_time(),
        &Config::default(),
    )
    .unwrap();

    assert_eq!(summary.rows_read, 15);
    assert_eq!(summary.records_kept, 15);
    assert_eq!(summary.aggregates, vec![(5, 3), (15, 1), (30, 0), (60, 0)]);
    assert_eq!(summary.rows_written, 19);

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 19);
    assert!(written.starts_with("XYZ,1.5,2024-05-20T09:01:00Z,1,"));

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}

#[test]
fn test_convert_file_with_header() {
    let input = temp_path("header_input.csv");
    let output = temp_path("Result_header_input.csv");
    fs::write(&input, generate_csv(2)).unwrap();

    let config = Config {
        write_header: true,
        ..Default::default()
    };
    pipeline::convert_file(&input, &output, &Symbol::new("XYZ"), base_time(), &config).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let first = written.lines().next().unwrap();
    assert_eq!(first, "stockId,close,createdAt,intervalRecord,high,low,open,volume");
    assert_eq!(written.lines().count(), 3);

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}

#[test]
fn test_convert_file_missing_input_fails() {
    let result = pipeline::convert_file(
        &temp_path("does_not_exist.csv"),
        &temp_path("Result_does_not_exist.csv"),
        &Symbol::new("XYZ"),
        base_time(),
        &Config::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_convert_file_rejects_invalid_config() {
    let input = temp_path("bad_config.csv");
    fs::write(&input, generate_csv(2)).unwrap();

    let config = Config {
        windows: vec![1, 5],
        ..Default::default()
    };
    let result = pipeline::convert_file(
        &input,
        &temp_path("Result_bad_config.csv"),
        &Symbol::new("XYZ"),
        base_time(),
        &config,
    );
    assert!(result.is_err());

    fs::remove_file(&input).ok();
}
