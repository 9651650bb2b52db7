pub mod classifier;
pub mod formatter;
pub mod processor;
pub mod types;

pub use classifier::ClassifyError;
pub use processor::EnrichmentPipeline;
