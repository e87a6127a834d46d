//! Application services - the host that modules talk to

pub mod host;

pub use host::{Host, Listener};
