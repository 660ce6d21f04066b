//! MPRIS backend
//!
//! Talks to media players over the session bus using the
//! `org.mpris.MediaPlayer2.Player` interface.

mod backend;
mod client;
mod types;

pub use backend::MprisBackend;
pub use client::MprisPlayer;
pub use types::*;
