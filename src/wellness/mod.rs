pub mod alerts;
pub mod stats;
pub mod streak;
