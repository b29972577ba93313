//! Deterministic completeness scoring and gap analysis over [`ExtractedData`].
//!
//! [`ExtractedData`]: crate::model::ExtractedData

pub mod gaps;
pub mod score;

pub use gaps::{GapAnalyzer, DEFAULT_MIN_CONFIDENCE};
pub use score::score;
