//! Record file reading and source metadata.

mod reader;
mod source;

pub use reader::{ReaderConfig, RecordFormat, RecordReader};
pub use source::{field_name_suffixes, RawRecord, SourceMetadata, PATH_SEPARATOR};
