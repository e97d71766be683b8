//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 2    | Usage error (bad args, unknown input format)         |
//! | 3    | I/O error (cannot read input, cannot write output)   |
//! | 4    | Parse error (malformed CSV or spreadsheet bytes)     |
//! | 5    | Schema error (missing column, roster too narrow)     |
//! | 6    | Config error (bad TOML, invalid option values)       |
//! | 7    | Warnings present and `--strict` given                |

use rollcall_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, input format cannot be determined.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or the output could not be written.
pub const EXIT_IO: u8 = 3;

/// Input bytes are not valid CSV / spreadsheet data.
pub const EXIT_PARSE: u8 = 4;

/// Required column missing, or roster has too few columns.
pub const EXIT_SCHEMA: u8 = 5;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 6;

/// Reconciliation produced warnings and `--strict` was given.
pub const EXIT_STRICT_WARNINGS: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Schema(_) => EXIT_SCHEMA,
        ReconError::Parse { .. } => EXIT_PARSE,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_recon::{InputRole, SchemaError};

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS, EXIT_USAGE, EXIT_IO, EXIT_PARSE,
            EXIT_SCHEMA, EXIT_CONFIG, EXIT_STRICT_WARNINGS,
        ];
        let unique: std::collections::HashSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn schema_errors_map_to_schema_code() {
        let err = ReconError::from(SchemaError::TooFewColumns { input: InputRole::Roster, found: 1, required: 2 });
        assert_eq!(recon_exit_code(&err), EXIT_SCHEMA);
        assert_eq!(recon_exit_code(&ReconError::Io("x".into())), EXIT_IO);
    }
}
