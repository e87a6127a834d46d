//! Module registry - ordered, append-only table of modules

use std::sync::Arc;
use tracing::info;

use crate::application::errors::ModuleError;
use super::trait_def::Module;

/// A registered module together with its identifier
#[derive(Clone)]
pub struct ModuleDescriptor {
    id: String,
    description: String,
    instance: Arc<dyn Module>,
}

impl ModuleDescriptor {
    /// Describe a module under the id it reports in `info()`
    pub fn new(instance: Arc<dyn Module>) -> Self {
        let info = instance.info();
        Self {
            id: info.id,
            description: info.description,
            instance,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instance(&self) -> &Arc<dyn Module> {
        &self.instance
    }
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor").field("id", &self.id).finish()
    }
}

/// Registry for all modules known to the host.
///
/// Iteration order is registration order. There is no removal; once the
/// registry is handed to the lifecycle coordinator it is frozen behind an `Arc`.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, rejecting duplicate identifiers
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), ModuleError> {
        if self.contains(descriptor.id()) {
            return Err(ModuleError::DuplicateIdentifier(descriptor.id().to_string()));
        }

        info!("Registering module: {} ({})", descriptor.id(), descriptor.description());
        self.modules.push(descriptor);
        Ok(())
    }

    /// Shorthand for `register(ModuleDescriptor::new(Arc::new(module)))`
    pub fn register_module<M: Module + 'static>(&mut self, module: M) -> Result<(), ModuleError> {
        self.register(ModuleDescriptor::new(Arc::new(module)))
    }

    /// All descriptors, in registration order
    pub fn all(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|d| d.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.modules.iter().map(|d| d.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::application::services::Host;
    use crate::infrastructure::config::Config;
    use crate::modules::{DoneSignal, ModuleInfo};

    struct Named(&'static str);

    #[async_trait]
    impl Module for Named {
        fn info(&self) -> ModuleInfo {
            ModuleInfo::new(self.0, "test module")
        }

        async fn init(&self, _config: &Config) -> Result<(), ModuleError> {
            Ok(())
        }

        fn serve(&self, _host: &Host) -> Result<(), ModuleError> {
            Ok(())
        }

        async fn stop(&self, _host: Arc<Host>, done: DoneSignal) {
            done.done();
        }
    }

    #[test]
    fn test_all_preserves_registration_order() {
        let names = ["zeta", "alpha", "mid", "beta", "omega"];
        let mut registry = ModuleRegistry::new();
        for name in names {
            registry.register_module(Named(name)).unwrap();
        }

        assert_eq!(registry.ids(), names.to_vec());
        assert_eq!(registry.len(), names.len());
    }

    #[test]
    fn test_duplicate_identifier_is_rejected_and_registry_unchanged() {
        let mut registry = ModuleRegistry::new();
        registry.register_module(Named("a")).unwrap();
        registry.register_module(Named("b")).unwrap();

        let err = registry.register_module(Named("a")).unwrap_err();
        assert!(matches!(err, ModuleError::DuplicateIdentifier(ref id) if id == "a"));
        assert_eq!(registry.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        registry.register_module(Named("x")).unwrap();

        assert!(registry.contains("x"));
        assert_eq!(registry.get("x").map(|d| d.id()), Some("x"));
        assert_eq!(registry.get("x").map(|d| d.description()), Some("test module"));
        assert!(registry.get("y").is_none());
    }
}
