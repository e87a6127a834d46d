//! Lifecycle coordinator - drives every module through its phases

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::errors::ModuleError;
use crate::application::services::Host;
use crate::infrastructure::config::Config;
use super::registry::ModuleRegistry;
use super::shutdown::ShutdownBarrier;
use super::trait_def::{ModuleState, Phase};

/// Runs Init, PostInit and Serve sequentially in registration order, spawns
/// Start, and on shutdown runs every Stop concurrently behind a barrier.
pub struct LifecycleCoordinator {
    registry: Arc<ModuleRegistry>,
    states: Mutex<Vec<ModuleState>>,
    background: Mutex<Vec<(String, JoinHandle<()>)>>,
    stop_timeout: Option<Duration>,
}

impl LifecycleCoordinator {
    /// Take ownership of the registry; its membership is frozen from here on
    pub fn new(registry: ModuleRegistry) -> Self {
        let states = vec![ModuleState::Registered; registry.len()];
        Self {
            registry: Arc::new(registry),
            states: Mutex::new(states),
            background: Mutex::new(Vec::new()),
            stop_timeout: None,
        }
    }

    /// Bound the shutdown wait; `None` waits forever
    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn state(&self, id: &str) -> Option<ModuleState> {
        let idx = self.registry.all().iter().position(|d| d.id() == id)?;
        Some(self.lock_states()[idx])
    }

    pub fn states(&self) -> Vec<(String, ModuleState)> {
        let states = self.lock_states();
        self.registry
            .all()
            .iter()
            .zip(states.iter())
            .map(|(d, s)| (d.id().to_string(), *s))
            .collect()
    }

    fn lock_states(&self) -> MutexGuard<'_, Vec<ModuleState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, idx: usize, state: ModuleState) {
        self.lock_states()[idx] = state;
    }

    /// Check that module `idx` may enter `phase`
    fn check(&self, idx: usize, phase: Phase) -> Result<(), ModuleError> {
        let state = self.lock_states()[idx];
        match ModuleState::required_for(phase) {
            Some(required) if required != state => Err(ModuleError::InvalidTransition {
                module: self.registry.all()[idx].id().to_string(),
                phase,
                state,
            }),
            _ => Ok(()),
        }
    }

    /// Phase 1: local setup. Any failure aborts startup.
    pub async fn init_all(&self, config: &Config) -> Result<(), ModuleError> {
        for (idx, descriptor) in self.registry.all().iter().enumerate() {
            self.check(idx, Phase::Init)?;
            debug!("Init: {}", descriptor.id());

            if let Err(e) = descriptor.instance().init(config).await {
                self.set_state(idx, ModuleState::Failed);
                error!("Failed to initialize module '{}': {}", descriptor.id(), e);
                return Err(ModuleError::InitFailure {
                    module: descriptor.id().to_string(),
                    reason: e.to_string(),
                });
            }
            self.set_state(idx, ModuleState::Initialized);
        }

        info!("Initialized {} modules", self.registry.len());
        Ok(())
    }

    /// Phase 2: cross-module setup. Any failure aborts startup.
    pub async fn post_init_all(&self, config: &Config) -> Result<(), ModuleError> {
        for (idx, descriptor) in self.registry.all().iter().enumerate() {
            self.check(idx, Phase::PostInit)?;
            debug!("PostInit: {}", descriptor.id());

            if let Err(e) = descriptor.instance().post_init(config).await {
                self.set_state(idx, ModuleState::Failed);
                error!("PostInit failed for module '{}': {}", descriptor.id(), e);
                return Err(ModuleError::PostInitFailure {
                    module: descriptor.id().to_string(),
                    reason: e.to_string(),
                });
            }
            self.set_state(idx, ModuleState::PostInitialized);
        }
        Ok(())
    }

    /// Phase 3: wire every module's callbacks into the host's router
    pub fn serve_all(&self, host: &Host) -> Result<(), ModuleError> {
        for (idx, descriptor) in self.registry.all().iter().enumerate() {
            self.check(idx, Phase::Serve)?;

            if let Err(e) = descriptor.instance().serve(host) {
                self.set_state(idx, ModuleState::Failed);
                error!("Serve failed for module '{}': {}", descriptor.id(), e);
                return Err(ModuleError::ServeFailure {
                    module: descriptor.id().to_string(),
                    reason: e.to_string(),
                });
            }
            self.set_state(idx, ModuleState::Serving);
        }

        info!("{} event subscriptions registered", host.router().subscriber_count());
        Ok(())
    }

    /// Phase 4: launch every module's background task without waiting on it
    pub fn start_all(&self, host: &Arc<Host>) -> Result<(), ModuleError> {
        for (idx, descriptor) in self.registry.all().iter().enumerate() {
            self.check(idx, Phase::Start)?;

            let module = Arc::clone(descriptor.instance());
            let host = Arc::clone(host);
            let id = descriptor.id().to_string();
            let task = tokio::spawn({
                let id = id.clone();
                async move {
                    module.start(host).await;
                    debug!("Background task of module '{}' finished", id);
                }
            });

            self.background
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((id, task));
            self.set_state(idx, ModuleState::Running);
        }
        Ok(())
    }

    /// Init, PostInit, Serve and Start, halting at the first failure
    pub async fn startup(&self, host: &Arc<Host>) -> Result<(), ModuleError> {
        self.init_all(host.config()).await?;
        self.post_init_all(host.config()).await?;
        self.serve_all(host)?;
        self.start_all(host)?;
        info!("All modules running: {}", self.registry.ids().join(", "));
        Ok(())
    }

    /// Run `stop` on every module that got past registration, each in its own
    /// task, and wait until all of them have signalled completion.
    pub async fn shutdown(&self, host: &Arc<Host>) -> Result<(), ModuleError> {
        let mut barrier = ShutdownBarrier::new();
        let mut stops = Vec::new();

        for (idx, descriptor) in self.registry.all().iter().enumerate() {
            let state = self.lock_states()[idx];
            if !state.is_stoppable() {
                debug!("Skipping stop for module '{}' ({})", descriptor.id(), state);
                continue;
            }

            self.set_state(idx, ModuleState::Stopping);
            let done = barrier.signal_for(descriptor.id());
            let module = Arc::clone(descriptor.instance());
            let host = Arc::clone(host);
            stops.push((idx, descriptor.id().to_string(), tokio::spawn(async move {
                module.stop(host, done).await;
            })));
        }

        info!("Waiting for {} modules to stop", barrier.expected());
        let result = barrier.wait(self.stop_timeout).await;

        let pending: &[String] = match &result {
            Ok(()) => &[],
            Err(pending) => pending,
        };
        for (idx, descriptor) in self.registry.all().iter().enumerate() {
            let stopping = self.lock_states()[idx] == ModuleState::Stopping;
            if stopping && !pending.iter().any(|p| p == descriptor.id()) {
                self.set_state(idx, ModuleState::Stopped);
            }
        }

        // After a timeout only the finished tasks can be joined without blocking
        let timed_out = result.is_err();
        for (idx, id, task) in stops {
            if timed_out && !task.is_finished() {
                continue;
            }
            if let Err(e) = task.await {
                error!("Stop of module '{}' panicked: {}", id, e);
                self.set_state(idx, ModuleState::Failed);
            }
        }

        let background: Vec<_> = self
            .background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        for (id, task) in background {
            if !task.is_finished() {
                debug!("Aborting background task of module '{}'", id);
                task.abort();
            }
        }

        match result {
            Ok(()) => {
                info!("All modules stopped");
                Ok(())
            }
            Err(pending) => {
                warn!("Modules did not stop in time: {}", pending.join(", "));
                Err(ModuleError::ShutdownTimeout(pending))
            }
        }
    }
}
