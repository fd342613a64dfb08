//! Account history analysis.

mod statistics;

pub use statistics::DealStatistics;
