//! Trend keyword extraction and history de-duplication

mod dedup;
mod extractor;

pub use dedup::{dedup_key, dedupe, Deduplicator};
pub use extractor::{EntityTrends, TrendExtractor, TrendOutput};
