//! Sample ingestion and model persistence.

pub mod checkpoint;
pub mod csv_reader;
pub mod source;

pub use checkpoint::{read_checkpoint, write_checkpoint, LayerCheckpoint, ModelCheckpoint};
pub use csv_reader::CsvReader;
pub use source::{MemorySource, Sample, SampleSource};
