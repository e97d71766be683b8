use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub const DEFAULT_KEY_COLUMN: &str = "Username";
pub const DEFAULT_VALUE_COLUMN: &str = "Total time";
pub const DEFAULT_OUTPUT_COLUMN: &str = "Reordered Total Time";
pub const DEFAULT_TIME: &str = "00:00:00";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    /// Value emitted for roster identifiers absent from the report.
    pub default_value: String,
    /// Carry every roster column through and append the resolved column.
    pub preserve_extra_columns: bool,
    /// Header of the appended/resolved column.
    pub output_column: String,
    pub source: SourceOptions,
    pub canonical: CanonicalOptions,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            default_value: DEFAULT_TIME.into(),
            preserve_extra_columns: false,
            output_column: DEFAULT_OUTPUT_COLUMN.into(),
            source: SourceOptions::default(),
            canonical: CanonicalOptions::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report (source) options
// ---------------------------------------------------------------------------

/// How to read the daily report.
///
/// `skip_before_header` drops physical rows ahead of the header row;
/// `skip_after_header` drops rows directly below it (e.g. an instructor-name
/// line exported as the first data row).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOptions {
    pub key_column: String,
    pub value_column: String,
    pub skip_before_header: usize,
    pub skip_after_header: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    /// Worksheet name for spreadsheet reports; first sheet when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.into(),
            value_column: DEFAULT_VALUE_COLUMN.into(),
            skip_before_header: 0,
            skip_after_header: 0,
            delimiter: None,
            sheet: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Roster (canonical) options
// ---------------------------------------------------------------------------

/// A roster column, by zero-based position or by exact header name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl Default for ColumnRef {
    /// Column B.
    fn default() -> Self {
        Self::Index(1)
    }
}

impl FromStr for ColumnRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("column reference cannot be empty".into());
        }
        Ok(match s.parse::<usize>() {
            Ok(idx) => Self::Index(idx),
            Err(_) => Self::Name(s.to_string()),
        })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(idx) => write!(f, "#{idx}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// What to do with roster rows whose identifier is empty after trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyKeyPolicy {
    #[default]
    Drop,
    /// Keep the row; it resolves to the default value unless the report
    /// also has an empty identifier.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanonicalOptions {
    pub column: ColumnRef,
    pub has_header: bool,
    pub skip_rows: usize,
    pub empty_keys: EmptyKeyPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for CanonicalOptions {
    fn default() -> Self {
        Self {
            column: ColumnRef::default(),
            has_header: true,
            skip_rows: 0,
            empty_keys: EmptyKeyPolicy::Drop,
            delimiter: None,
            sheet: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub preserve_extra_columns: bool,
    pub default_value: String,
    pub output_column: String,
    /// Identifier header for the fresh two-column table.
    pub key_header: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            preserve_extra_columns: false,
            default_value: DEFAULT_TIME.into(),
            output_column: DEFAULT_OUTPUT_COLUMN.into(),
            key_header: DEFAULT_KEY_COLUMN.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.output_column.trim().is_empty() {
            return Err(ReconError::ConfigValidation("output_column cannot be empty".into()));
        }

        let src = &self.source;
        if src.key_column.is_empty() || src.value_column.is_empty() {
            return Err(ReconError::ConfigValidation(
                "source.key_column and source.value_column must be set".into(),
            ));
        }
        if src.key_column == src.value_column {
            return Err(ReconError::ConfigValidation(format!(
                "source.key_column and source.value_column are both '{}'",
                src.key_column
            )));
        }

        if let ColumnRef::Name(name) = &self.canonical.column {
            if !self.canonical.has_header {
                return Err(ReconError::ConfigValidation(format!(
                    "canonical.column '{name}' is a name but canonical.has_header is false"
                )));
            }
        }

        delimiter_byte(src.delimiter)?;
        delimiter_byte(self.canonical.delimiter)?;
        Ok(())
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            preserve_extra_columns: self.preserve_extra_columns,
            default_value: self.default_value.clone(),
            output_column: self.output_column.clone(),
            key_header: self.source.key_column.clone(),
        }
    }
}

/// Delimiters must be a single ASCII byte for the CSV reader.
pub fn delimiter_byte(delimiter: Option<char>) -> Result<Option<u8>, ReconError> {
    match delimiter {
        None => Ok(None),
        Some(c) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(Some(c as u8)),
        Some(c) => Err(ReconError::ConfigValidation(format!("unsupported delimiter {c:?}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
