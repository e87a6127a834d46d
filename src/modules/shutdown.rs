//! Shutdown barrier - counts module `stop` completions

use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Completion token handed to `Module::stop`.
///
/// Signalling is exactly-once by construction: `done` consumes the token, and
/// dropping an unsignalled token signals on its behalf.
#[derive(Debug)]
pub struct DoneSignal {
    module: String,
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl DoneSignal {
    pub fn done(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.tx.take() {
            // Receiver gone means the barrier already gave up waiting
            let _ = tx.send(self.module.clone());
        }
    }
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("Module '{}' dropped its stop signal without calling done()", self.module);
            self.fire();
        }
    }
}

/// Counting barrier over a fixed set of modules
pub struct ShutdownBarrier {
    expected: Vec<String>,
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl ShutdownBarrier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            expected: Vec::new(),
            tx: Some(tx),
            rx,
        }
    }

    /// Issue the completion token for one module
    pub fn signal_for(&mut self, module: impl Into<String>) -> DoneSignal {
        let module = module.into();
        self.expected.push(module.clone());
        DoneSignal {
            module,
            tx: self.tx.clone(),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected.len()
    }

    /// Wait until every issued token has been signalled.
    ///
    /// With `timeout = None` this waits indefinitely. On timeout the ids of the
    /// modules that never reported are returned.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<(), Vec<String>> {
        // Only outstanding tokens may keep the channel open
        self.tx = None;

        let deadline = timeout.map(|t| Instant::now() + t);
        let mut finished: HashSet<String> = HashSet::new();

        while finished.len() < self.expected.len() {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => self.rx.recv().await,
            };

            match next {
                Some(module) => {
                    debug!("Module '{}' reported stop completion", module);
                    finished.insert(module);
                }
                // Every sender is gone, so every token has fired
                None => break,
            }
        }

        let pending: Vec<String> = self
            .expected
            .iter()
            .filter(|m| !finished.contains(*m))
            .cloned()
            .collect();

        if pending.is_empty() {
            Ok(())
        } else {
            Err(pending)
        }
    }
}

impl Default for ShutdownBarrier {
    fn default() -> Self {
        Self::new()
    }
}
