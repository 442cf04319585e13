//! Work-queue coordinator: claims batches under a lease, fans each out to
//! generation thread subprocesses, and stores what they stream back.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod heartbeat;
pub mod pipeline;
pub mod sink;
pub mod thread;
