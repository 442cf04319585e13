//! One generation thread: drafts card layouts with a generative model,
//! ranks them in a pairwise tournament, and streams `svg` / `score` / `end`
//! lines on stdout for the coordinator.

pub mod client;
pub mod config;
pub mod designer;
pub mod emit;
pub mod error;
pub mod judge;
pub mod messages;
pub mod prompts;
pub mod ranker;
pub mod session;
