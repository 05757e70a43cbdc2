pub mod alerts;
pub mod connections;
pub mod entries;
pub mod goals;
pub mod rewards;
