pub mod health;
pub mod monitor;
pub mod signal;
