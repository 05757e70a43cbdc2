pub mod alert;
pub mod connection;
pub mod entry;
pub mod goal;
pub mod reward;
