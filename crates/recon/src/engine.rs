use std::collections::{HashMap, HashSet};

use crate::config::ReconcileOptions;
use crate::error::ReconError;
use crate::model::{
    normalize_key, CanonicalSequence, DuplicateIdentifier, OutputTable, ReconMeta, ReconResult,
    ReconSummary, ReconWarning, SourceTable,
};

/// Identifier → time lookup. Later records overwrite earlier ones.
pub struct Lookup<'a> {
    values: HashMap<&'a str, &'a str>,
    /// Identifiers seen more than once, in order of first appearance.
    pub duplicates: Vec<DuplicateIdentifier>,
}

impl<'a> Lookup<'a> {
    pub fn build(source: &'a SourceTable) -> Self {
        let mut values: HashMap<&str, &str> = HashMap::with_capacity(source.len());
        let mut counts: HashMap<&str, usize> = HashMap::with_capacity(source.len());
        let mut order: Vec<&str> = Vec::new();

        for record in &source.records {
            let id = normalize_key(&record.identifier);
            values.insert(id, record.time_value.as_str());
            let count = counts.entry(id).or_insert(0);
            if *count == 0 {
                order.push(id);
            }
            *count += 1;
        }

        let duplicates = order
            .into_iter()
            .filter_map(|id| {
                let occurrences = counts[id];
                (occurrences > 1).then(|| DuplicateIdentifier { identifier: id.to_string(), occurrences })
            })
            .collect();

        Self { values, duplicates }
    }

    pub fn get(&self, identifier: &str) -> Option<&'a str> {
        self.values.get(normalize_key(identifier)).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn identifiers(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.values.keys().copied()
    }
}

/// Project the report's values onto the roster order.
///
/// One output row per roster entry, in roster order; identifiers missing
/// from the report resolve to `options.default_value`.
pub fn reconcile(
    source: &SourceTable,
    canonical: &CanonicalSequence,
    options: &ReconcileOptions,
) -> Result<ReconResult, ReconError> {
    if options.output_column.trim().is_empty() {
        return Err(ReconError::ConfigValidation("output column header cannot be empty".into()));
    }

    let lookup = Lookup::build(source);

    let mut warnings = Vec::new();
    if source.has_length_mismatch() {
        warnings.push(ReconWarning::LengthMismatch {
            identifiers: source.identifiers_seen,
            values: source.values_seen,
        });
    }
    if !lookup.duplicates.is_empty() {
        warnings.push(ReconWarning::DuplicateIdentifiers { identifiers: lookup.duplicates.clone() });
    }
    for warning in &warnings {
        log::warn!("{warning}");
    }

    let width = canonical.width();
    let headers = if options.preserve_extra_columns {
        let mut headers = preserved_headers(canonical, width, &options.key_header);
        headers.push(options.output_column.clone());
        headers
    } else {
        vec![options.key_header.clone(), options.output_column.clone()]
    };

    let mut matched = 0;
    let mut requested: HashSet<&str> = HashSet::with_capacity(canonical.len());
    let mut rows = Vec::with_capacity(canonical.len());

    for entry in &canonical.entries {
        let key = normalize_key(&entry.key);
        requested.insert(key);
        let resolved = match lookup.get(key) {
            Some(value) => {
                matched += 1;
                value.to_string()
            }
            None => options.default_value.clone(),
        };

        let row = if options.preserve_extra_columns {
            let mut row = entry.fields.clone();
            row.resize(width, String::new());
            row[canonical.key_index] = key.to_string();
            row.push(resolved);
            row
        } else {
            vec![key.to_string(), resolved]
        };
        rows.push(row);
    }

    let unused_identifiers = lookup.identifiers().filter(|id| !requested.contains(id)).count();

    let summary = ReconSummary {
        canonical_rows: rows.len(),
        matched,
        defaulted: rows.len() - matched,
        dropped_empty_keys: canonical.dropped_empty,
        source_records: source.len(),
        distinct_identifiers: lookup.len(),
        unused_identifiers,
    };

    Ok(ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            default_value: options.default_value.clone(),
            preserve_extra_columns: options.preserve_extra_columns,
        },
        summary,
        warnings,
        table: OutputTable { headers, rows },
    })
}

/// Roster headers padded to `width`. Missing names become the key header
/// (for the key column) or a spreadsheet column letter.
fn preserved_headers(canonical: &CanonicalSequence, width: usize, key_header: &str) -> Vec<String> {
    (0..width)
        .map(|col| match canonical.headers.get(col) {
            Some(h) if !h.trim().is_empty() => h.clone(),
            _ if col == canonical.key_index => key_header.to_string(),
            _ => col_to_letter(col),
        })
        .collect()
}

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
