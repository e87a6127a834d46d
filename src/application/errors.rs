//! Application layer errors

use thiserror::Error;
use crate::modules::{ModuleState, Phase};

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network send failed: {0}")]
    NetworkSend(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Module registration and lifecycle errors
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Module '{0}' is already registered")]
    DuplicateIdentifier(String),

    #[error("Init failed for module '{module}': {reason}")]
    InitFailure { module: String, reason: String },

    #[error("PostInit failed for module '{module}': {reason}")]
    PostInitFailure { module: String, reason: String },

    #[error("Serve failed for module '{module}': {reason}")]
    ServeFailure { module: String, reason: String },

    #[error("Module '{module}' cannot enter {phase} while {state}")]
    InvalidTransition {
        module: String,
        phase: Phase,
        state: ModuleState,
    },

    #[error("Shutdown timed out waiting for: {}", .0.join(", "))]
    ShutdownTimeout(Vec<String>),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Command execution errors, reported back to the group as text
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("语录添加失败：no image found in message. please send image with the command in one message.")]
    MissingPayload,

    #[error("随机语录读取失败：no snippet has been recorded yet")]
    EmptyStore,

    #[error("语录添加失败：internal: {0}")]
    StorageWrite(String),

    #[error("随机语录读取失败：{0}")]
    StorageRead(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Store is closed")]
    Closed,

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
