//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Database: SQLite snippet store
//! - Storage: Content-addressed image files
//! - Adapters: Network clients (console, in-memory)

pub mod config;
pub mod database;
pub mod storage;
pub mod adapters;
