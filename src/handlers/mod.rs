pub mod ai;
pub mod health;
pub mod watch;
pub mod wellness;
