//! Module system for snippets-bot
//! 
//! Feature modules implement [`Module`] and are registered into a
//! [`ModuleRegistry`] before the host starts. The [`LifecycleCoordinator`]
//! then drives them through Init, PostInit, Serve, Start and Stop.

pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod shutdown;
pub mod snippets;
pub mod trait_def;

pub use lifecycle::LifecycleCoordinator;
pub use registry::{ModuleDescriptor, ModuleRegistry};
pub use shutdown::{DoneSignal, ShutdownBarrier};
pub use trait_def::{Module, ModuleInfo, ModuleState, Phase};

use crate::application::errors::ModuleError;

/// Registry holding every module built into this binary, in load order
pub fn builtin_registry() -> Result<ModuleRegistry, ModuleError> {
    let mut registry = ModuleRegistry::new();
    registry.register_module(logging::LoggingModule::new())?;
    registry.register_module(snippets::SnippetsModule::new())?;
    Ok(registry)
}
