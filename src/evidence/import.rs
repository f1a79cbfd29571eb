use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::fields::normalize_key;
use super::record::{EvidenceRecord, RecordType};

#[derive(Debug, thiserror::Error)]
pub enum EvidenceImportError {
    #[error("failed to read evidence export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid evidence CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads an upstream CSV export into evidence field bags.
///
/// Headers are normalized into field-bag keys; the content of each field stays
/// verbatim so the tolerant extraction combinators can deal with it later.
/// Rows without any recognizable identifier get a synthesized one, since every
/// evidence record must carry a stable id.
pub struct CsvEvidenceImporter;

impl CsvEvidenceImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        record_type: RecordType,
    ) -> Result<Vec<EvidenceRecord>, EvidenceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, record_type)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        record_type: RecordType,
    ) -> Result<Vec<EvidenceRecord>, EvidenceImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(normalize_key)
            .collect();

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            let row = row?;
            let mut fields = BTreeMap::new();
            for (header, value) in headers.iter().zip(row.iter()) {
                if !header.is_empty() && !value.trim().is_empty() {
                    fields.insert(header.clone(), value.trim().to_string());
                }
            }

            let id = ["id", "record_id", "complaint_id", "reference", "case_number"]
                .iter()
                .find_map(|name| fields.get(*name))
                .cloned()
                .unwrap_or_else(|| format!("{}-{}", prefix_for(record_type), index + 1));

            records.push(EvidenceRecord {
                id,
                record_type,
                fields,
            });
        }

        Ok(records)
    }
}

fn prefix_for(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Complaint => "CPL",
        RecordType::SeriousIncident => "INC",
        RecordType::Sales => "SLS",
        RecordType::Literature => "LIT",
        RecordType::FollowUpStudy => "FUS",
    }
}
