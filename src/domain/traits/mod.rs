//! Domain traits - Abstractions for infrastructure implementations

pub mod client;
pub mod store;

pub use client::{ClientInfo, GroupClient};
pub use store::SnippetStore;
