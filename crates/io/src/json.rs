// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use rollcall_recon::{OutputTable, ReconError};

/// Output table as `{"headers": [...], "rows": [[...], ...]}`.
pub fn to_bytes(table: &OutputTable) -> Result<Vec<u8>, ReconError> {
    serde_json::to_vec_pretty(table).map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
}

pub fn write(table: &OutputTable, path: &Path) -> Result<(), ReconError> {
    let file = File::create(path).map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, table).map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        let table = OutputTable {
            headers: vec!["Username".into(), "Reordered Total Time".into()],
            rows: vec![vec!["a".into(), "01:00:00".into()], vec!["b".into(), "00:00:00".into()]],
        };
        write(&table, &path).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["headers"][1], "Reordered Total Time");
        assert_eq!(parsed["rows"][0][1], "01:00:00");
        assert_eq!(parsed["rows"].as_array().unwrap().len(), 2);
    }
}
