//! Typed, normalized evidence records and the tolerant extraction layer that
//! builds them from ingestion field bags.

pub mod fields;
mod import;
mod period;
mod record;

mod complaint;
mod sales;

pub use complaint::{Answer, ComplaintRecord, ConfirmationStatus, HarmLevel, Investigation};
pub use import::{CsvEvidenceImporter, EvidenceImportError};
pub use period::{quarter_label, MonthSpan, ReportingPeriod};
pub use record::{EvidenceRecord, RecordType};
pub use sales::{exposure_by_region, total_exposure, SalesRecord};
