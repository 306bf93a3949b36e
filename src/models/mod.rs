//! Domain models shared across the relay.

pub mod signal;

pub use signal::{Action, Side, Signal, SubmitSignal};
