//! Manuals CSV loading and rule-based ontology tagging.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{ExtractedEntities, ManualRecord};

/// Failure-mode names recognised even without a `_wear`/`_fault` suffix.
pub const KNOWN_FAILURE_MODES: &[&str] = &["bearing_fault", "seal_wear", "belt_break", "oil_leak", "seat_erosion"];

const PROCEDURE_MARKER: &str = "Procedure:";

/// Records that passed validation plus a diagnostic line per rejected row.
#[derive(Debug, Clone, Default)]
pub struct ProcessedInput {
    pub records: Vec<ManualRecord>,
    pub rejected: Vec<String>,
}

#[derive(Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    pub fn process_csv(&self, csv_path: &Path) -> Result<ProcessedInput> {
        let file = File::open(csv_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(csv_path.display().to_string())
            } else {
                Error::Operation(format!("cannot open {}: {e}", csv_path.display()))
            }
        })?;
        info!(path = %csv_path.display(), "reading manuals");
        self.process_reader(file)
    }

    /// Parse `id,title,text` rows. Extra columns are ignored; malformed rows
    /// are skipped and reported.
    pub fn process_reader<R: Read>(&self, input: R) -> Result<ProcessedInput> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
        let headers = reader.headers().map_err(|e| Error::Operation(format!("unreadable CSV header: {e}")))?.clone();
        for required in ["id", "title", "text"] {
            if !headers.iter().any(|h| h == required) {
                return Err(Error::Operation(format!("CSV header is missing the '{required}' column")));
            }
        }

        let mut out = ProcessedInput::default();
        for (row, result) in reader.deserialize::<ManualRecord>().enumerate() {
            // header is line 1
            let line = row + 2;
            match result {
                Ok(record) => match validate_record(&record) {
                    Ok(()) => out.records.push(record),
                    Err(reason) => {
                        warn!(line, %reason, "rejecting manual record");
                        out.rejected.push(format!("line {line}: {reason}"));
                    }
                },
                Err(e) => {
                    warn!(line, error = %e, "unparseable manual record");
                    out.rejected.push(format!("line {line}: {e}"));
                }
            }
        }
        info!(accepted = out.records.len(), rejected = out.rejected.len(), "processed manuals");
        Ok(out)
    }
}

/// Record ids become both a Qdrant point id (`u64`) and a graph IRI segment,
/// so only canonical decimal strings are accepted.
pub fn validate_record(record: &ManualRecord) -> std::result::Result<(), String> {
    let id = record.id.as_str();
    if id.is_empty() {
        return Err("empty id".to_string());
    }
    match id.parse::<u64>() {
        Ok(n) if n.to_string() == id => Ok(()),
        Ok(n) => Err(format!("id '{id}' is not in canonical form (expected '{n}')")),
        Err(_) => Err(format!("id '{id}' is not an unsigned integer")),
    }
}

/// Pull failure modes and procedures out of a manual's text.
///
/// Failure modes are comma-stripped whitespace tokens ending in `_wear` or
/// `_fault`, or listed in [`KNOWN_FAILURE_MODES`]. Procedures are the
/// comma-separated items after the last `Procedure:` marker.
pub fn extract_entities(text: &str) -> ExtractedEntities {
    let mut entities = ExtractedEntities::default();
    let stripped = text.replace(',', "");
    for token in stripped.split_whitespace() {
        let is_failure = token.ends_with("_wear") || token.ends_with("_fault") || KNOWN_FAILURE_MODES.contains(&token);
        if is_failure && !entities.failure_modes.iter().any(|f| f == token) {
            entities.failure_modes.push(token.to_string());
        }
    }
    if let Some((_, tail)) = text.rsplit_once(PROCEDURE_MARKER) {
        for step in tail.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !entities.procedures.iter().any(|p| p == step) {
                entities.procedures.push(step.to_string());
            }
        }
    }
    debug!(failure_modes = entities.failure_modes.len(), procedures = entities.procedures.len(), "extracted entities");
    entities
}
