//! Application layer - Use cases and orchestration
//! 
//! This layer contains:
//! - Services: The host shared by all modules
//! - Errors: Domain-specific errors
//! - Messaging: Event routing, command classification and dispatch

pub mod errors;
pub mod services;
pub mod messaging;
