//! Event router - fans inbound group messages out to interested modules

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::application::errors::BotError;
use crate::application::services::Host;
use crate::domain::entities::InboundEvent;

/// Which groups a subscription wants to hear from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    AllGroups,
    Groups(HashSet<i64>),
}

impl Interest {
    pub fn groups(ids: impl IntoIterator<Item = i64>) -> Self {
        Interest::Groups(ids.into_iter().collect())
    }

    pub fn matches(&self, group_id: i64) -> bool {
        match self {
            Interest::AllGroups => true,
            Interest::Groups(ids) => ids.contains(&group_id),
        }
    }
}

/// Callback a module registers during `serve`
#[async_trait]
pub trait GroupMessageHandler: Send + Sync {
    async fn handle(&self, host: Arc<Host>, event: Arc<InboundEvent>) -> Result<(), BotError>;
}

struct Subscription {
    module: String,
    interest: Interest,
    handler: Arc<dyn GroupMessageHandler>,
}

/// Outcome of delivering one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Routes each inbound event to every matching subscription
#[derive(Default)]
pub struct EventRouter {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, module: impl Into<String>, interest: Interest, handler: Arc<dyn GroupMessageHandler>) {
        let module = module.into();
        debug!("Module '{}' subscribed to group messages ({:?})", module, interest);
        self.subscriptions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Subscription { module, interest, handler });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions
            .read()
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Modules that would receive a message from `group_id`, in registration order
    pub fn interested(&self, group_id: i64) -> Vec<String> {
        self.targets(group_id)
            .into_iter()
            .map(|(module, _)| module)
            .collect()
    }

    fn targets(&self, group_id: i64) -> Vec<(String, Arc<dyn GroupMessageHandler>)> {
        self.subscriptions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|s| s.interest.matches(group_id))
            .map(|s| (s.module.clone(), Arc::clone(&s.handler)))
            .collect()
    }

    /// Deliver `event` to every interested module.
    ///
    /// Each handler runs in its own task, so a failing or panicking module
    /// cannot keep the others from receiving the event.
    pub async fn dispatch(&self, host: Arc<Host>, event: InboundEvent) -> DispatchReport {
        let targets = self.targets(event.group_id);
        let mut report = DispatchReport::default();
        if targets.is_empty() {
            return report;
        }

        let event = Arc::new(event);
        let mut tasks = Vec::with_capacity(targets.len());
        for (module, handler) in targets {
            let host = Arc::clone(&host);
            let event = Arc::clone(&event);
            let task = tokio::spawn(async move { handler.handle(host, event).await });
            tasks.push((module, task));
        }

        for (module, task) in tasks {
            match task.await {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!("[{}] Module '{}' failed to handle message: {}", event.group_id, module, e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("[{}] Module '{}' handler panicked: {}", event.group_id, module, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
