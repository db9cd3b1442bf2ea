pub mod config;
pub mod extraction;
pub mod services;

pub use config::{Config, ExtractionConfig};
pub use extraction::{
    ExtractedText, ExtractionError, ExtractionPath, ExtractionStats, SourceDocument,
    TextExtractor,
};
