use std::fmt;

/// Which of the two inputs an error or warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    /// The daily report (identifier → total time).
    Report,
    /// The roster holding the canonical identifier ordering.
    Roster,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report => write!(f, "report"),
            Self::Roster => write!(f, "roster"),
        }
    }
}

/// Structural defects in an input, detected before any reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Required column(s) absent from the header row (exact, case-sensitive match).
    MissingColumns { input: InputRole, columns: Vec<String> },
    /// Column-based extraction needs more columns than the input has.
    TooFewColumns { input: InputRole, found: usize, required: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns { input, columns } => {
                let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
                let noun = if columns.len() == 1 { "column" } else { "columns" };
                write!(f, "{input}: missing required {noun} {}", quoted.join(", "))
            }
            Self::TooFewColumns { input, found, required } => {
                write!(f, "{input}: has {found} column(s), at least {required} required")
            }
        }
    }
}

#[derive(Debug)]
pub enum ReconError {
    /// Required column absent, or canonical source too narrow.
    Schema(SchemaError),
    /// Malformed delimited text or spreadsheet bytes.
    Parse { input: InputRole, cause: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column name, bad delimiter, etc.).
    ConfigValidation(String),
    /// IO error (file read/write).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "schema error: {err}"),
            Self::Parse { input, cause } => write!(f, "{input}: parse error: {cause}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<SchemaError> for ReconError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_names_every_column() {
        let err = ReconError::from(SchemaError::MissingColumns {
            input: InputRole::Report,
            columns: vec!["Username".into(), "Total time".into()],
        });
        assert_eq!(
            err.to_string(),
            "schema error: report: missing required columns 'Username', 'Total time'"
        );
    }

    #[test]
    fn too_few_columns_message() {
        let err = SchemaError::TooFewColumns { input: InputRole::Roster, found: 1, required: 2 };
        assert_eq!(err.to_string(), "roster: has 1 column(s), at least 2 required");
    }
}
