//! Document ingestion: page extraction and chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::{Span, TextChunker};
pub use parser::{PdfTextExtractor, TextExtractor};
pub use processor::IngestPipeline;
