//! execution configuration
//!
//! defaults suit tests and the demo binary; `from_env` lets a deployment
//! override them without recompiling.

use crate::error::{ExecError, ExecResult};
use std::env;

/// default number of right-side tuples a join may hold in its hash table
pub const DEFAULT_JOIN_BUFFER_SIZE: usize = 10_000;

/// default number of rows shown by the demo preview
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// how csv files are read into tables
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// skip the first record as a header
    pub has_header: bool,
    /// field delimiter byte
    pub delimiter: u8,
    /// number of rows sampled when inferring column types
    pub sample_rows: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            sample_rows: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// advisory bound on the join's in-memory hash table
    pub join_buffer_size: usize,
    pub preview_rows: usize,
    pub csv: CsvOptions,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            join_buffer_size: DEFAULT_JOIN_BUFFER_SIZE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            csv: CsvOptions::default(),
        }
    }
}

impl ExecutionConfig {
    /// build a config from `QUARRY_*` environment variables over the defaults
    pub fn from_env() -> ExecResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ExecResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("QUARRY_JOIN_BUFFER_SIZE") {
            config.join_buffer_size = parse_usize("QUARRY_JOIN_BUFFER_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("QUARRY_PREVIEW_ROWS") {
            config.preview_rows = parse_usize("QUARRY_PREVIEW_ROWS", &raw)?;
        }
        if let Some(raw) = lookup("QUARRY_CSV_DELIMITER") {
            config.csv.delimiter = match raw.as_bytes() {
                [b] => *b,
                _ if raw == "\\t" => b'\t',
                _ => {
                    return Err(ExecError::InvalidConfig(format!(
                        "QUARRY_CSV_DELIMITER must be a single byte, got {:?}",
                        raw
                    )));
                }
            };
        }
        if let Some(raw) = lookup("QUARRY_CSV_HAS_HEADER") {
            config.csv.has_header = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ExecError::InvalidConfig(format!(
                        "QUARRY_CSV_HAS_HEADER must be a boolean, got {:?}",
                        raw
                    )));
                }
            };
        }

        Ok(config)
    }
}

fn parse_usize(key: &str, raw: &str) -> ExecResult<usize> {
    raw.trim().parse::<usize>().map_err(|e| {
        ExecError::InvalidConfig(format!("{} must be a non-negative integer: {}", key, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = ExecutionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ExecutionConfig::default());
        assert_eq!(config.join_buffer_size, DEFAULT_JOIN_BUFFER_SIZE);
    }

    #[test]
    fn test_overrides() {
        let config = ExecutionConfig::from_lookup(lookup(&[
            ("QUARRY_JOIN_BUFFER_SIZE", "64"),
            ("QUARRY_PREVIEW_ROWS", "5"),
            ("QUARRY_CSV_DELIMITER", ";"),
            ("QUARRY_CSV_HAS_HEADER", "no"),
        ]))
        .unwrap();
        assert_eq!(config.join_buffer_size, 64);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.csv.delimiter, b';');
        assert!(!config.csv.has_header);
    }

    #[test]
    fn test_tab_delimiter() {
        let config =
            ExecutionConfig::from_lookup(lookup(&[("QUARRY_CSV_DELIMITER", "\\t")])).unwrap();
        assert_eq!(config.csv.delimiter, b'\t');
    }

    #[test]
    fn test_invalid_values() {
        let err = ExecutionConfig::from_lookup(lookup(&[("QUARRY_JOIN_BUFFER_SIZE", "-1")]))
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidConfig(_)));

        let err = ExecutionConfig::from_lookup(lookup(&[("QUARRY_CSV_HAS_HEADER", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidConfig(_)));
    }
}
