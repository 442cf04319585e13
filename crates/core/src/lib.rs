//! Pure domain logic shared by the coordinator and the generation thread.
//!
//! Nothing in this crate touches the database or the network. Async code is
//! limited to [`hedge`], which only needs the tokio timer.

pub mod bundle;
pub mod error;
pub mod hedge;
pub mod lease;
pub mod protocol;
pub mod svg;
pub mod texts;
pub mod tournament;
pub mod types;
