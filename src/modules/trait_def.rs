//! Module trait definitions

use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;

use crate::application::errors::ModuleError;
use crate::application::services::Host;
use crate::infrastructure::config::Config;
use super::shutdown::DoneSignal;

/// Static description of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Globally unique identifier, e.g. `galvingao.snippets`
    pub id: String,
    pub description: String,
}

impl ModuleInfo {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Core trait that every feature module implements.
///
/// The lifecycle coordinator calls `init`, `post_init` and `serve` once each,
/// in registration order, then spawns `start` and finally `stop`.
#[async_trait]
pub trait Module: Send + Sync {
    fn info(&self) -> ModuleInfo;

    /// Local setup only, such as reading this module's slice of the config.
    /// Must not touch other modules.
    async fn init(&self, config: &Config) -> Result<(), ModuleError>;

    /// Cross-module setup. Every module has finished `init` at this point.
    async fn post_init(&self, _config: &Config) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Register event callbacks through `host.on_group_message`
    fn serve(&self, host: &Host) -> Result<(), ModuleError>;

    /// Long-running background work. Runs in its own task.
    async fn start(&self, _host: Arc<Host>) {}

    /// Release resources. `done` must be signalled; dropping it counts as
    /// signalling, so early returns are safe.
    async fn stop(&self, host: Arc<Host>, done: DoneSignal);
}

/// Lifecycle phases, in the order the coordinator runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    PostInit,
    Serve,
    Start,
    Stop,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Init => "Init",
            Phase::PostInit => "PostInit",
            Phase::Serve => "Serve",
            Phase::Start => "Start",
            Phase::Stop => "Stop",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-module lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    Registered,
    Initialized,
    PostInitialized,
    Serving,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl ModuleState {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleState::Registered => "registered",
            ModuleState::Initialized => "initialized",
            ModuleState::PostInitialized => "post-initialized",
            ModuleState::Serving => "serving",
            ModuleState::Running => "running",
            ModuleState::Stopping => "stopping",
            ModuleState::Stopped => "stopped",
            ModuleState::Failed => "failed",
        }
    }

    /// State a module must be in before `phase` may run
    pub fn required_for(phase: Phase) -> Option<ModuleState> {
        match phase {
            Phase::Init => Some(ModuleState::Registered),
            Phase::PostInit => Some(ModuleState::Initialized),
            Phase::Serve => Some(ModuleState::PostInitialized),
            Phase::Start => Some(ModuleState::Serving),
            // Stop accepts any state that touched resources
            Phase::Stop => None,
        }
    }

    /// Whether `stop` should be invoked for a module in this state
    pub fn is_stoppable(&self) -> bool {
        !matches!(self, ModuleState::Registered | ModuleState::Stopping | ModuleState::Stopped)
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
