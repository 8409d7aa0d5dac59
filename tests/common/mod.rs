//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Subgroups of five whose means are 10, 12, 11, 13, 9 and ranges 2, 3, 1, 4, 2
pub const REFERENCE_SUBGROUPS: [[f64; 5]; 5] = [
    [9.0, 10.0, 11.0, 10.0, 10.0],
    [10.5, 12.0, 13.5, 12.0, 12.0],
    [10.5, 11.0, 11.5, 11.0, 11.0],
    [11.0, 13.0, 15.0, 13.0, 13.0],
    [8.0, 9.0, 10.0, 9.0, 9.0],
];

/// Helper to get an spc command isolated from the user's config and env
pub fn spc(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("spc"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("SPC_CONFIG")
        .env_remove("SPC_LOG")
        .env_remove("SPC_LOG_FORMAT");
    cmd
}

/// Write a file into the temp directory and return its path
pub fn write_file(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// CSV text for values one minute apart, without subgroup numbers
pub fn csv_of(values: &[f64]) -> String {
    let mut csv = String::from("value,timestamp\n");
    for (i, v) in values.iter().enumerate() {
        csv.push_str(&format!(
            "{},2024-03-01T{:02}:{:02}:00Z\n",
            v,
            8 + i / 60,
            i % 60
        ));
    }
    csv
}

/// Flattened reference subgroups, in order
pub fn reference_values() -> Vec<f64> {
    REFERENCE_SUBGROUPS.iter().flatten().copied().collect()
}

/// Characteristic YAML with the given limits and embedded measurements
pub fn characteristic_yaml(usl: Option<f64>, lsl: Option<f64>, values: &[f64]) -> String {
    let mut yaml = String::from("code: CHR-001\nname: Bore diameter\nunit: mm\nsample_size: 5\n");
    if let Some(usl) = usl {
        yaml.push_str(&format!("usl: {}\n", usl));
    }
    if let Some(lsl) = lsl {
        yaml.push_str(&format!("lsl: {}\n", lsl));
    }
    if values.is_empty() {
        yaml.push_str("measurements: []\n");
        return yaml;
    }
    yaml.push_str("measurements:\n");
    for (i, v) in values.iter().enumerate() {
        yaml.push_str(&format!(
            "  - value: {}\n    timestamp: 2024-03-01T08:{:02}:00Z\n",
            v,
            i % 60
        ));
    }
    yaml
}

/// Parse stdout as JSON
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}
