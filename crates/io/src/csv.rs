// CSV export

use std::path::Path;

use rollcall_recon::{OutputTable, ReconError};

pub fn to_bytes(table: &OutputTable, delimiter: u8) -> Result<Vec<u8>, ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(&table.headers).map_err(|e| ReconError::Io(e.to_string()))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|e| ReconError::Io(e.to_string()))?;
    }

    writer.into_inner().map_err(|e| ReconError::Io(e.to_string()))
}

pub fn write(table: &OutputTable, path: &Path, delimiter: u8) -> Result<(), ReconError> {
    let bytes = to_bytes(table, delimiter)?;
    std::fs::write(path, bytes).map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
}
