//! Sync engine
//!
//! Owns the shared [`SyncState`](crate::sync::SyncState), consumes
//! [`EngineEvent`](crate::sync::EngineEvent)s and issues commands to peer
//! players.

mod handlers;
mod session;
mod types;
mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use session::*;
pub use types::*;
pub use view::*;
