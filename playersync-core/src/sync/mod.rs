//! Sync state
//!
//! Which players are linked, and the events that drive the engine.

mod protocol;
mod state;

pub use protocol::*;
pub use state::*;
