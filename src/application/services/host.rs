use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::errors::BotError;
use crate::application::messaging::router::{DispatchReport, EventRouter, GroupMessageHandler, Interest};
use crate::domain::entities::{InboundEvent, OutgoingMessage};
use crate::domain::traits::{ClientInfo, GroupClient};
use crate::infrastructure::config::Config;

/// Capacity of the inbound event channel between client and router
const EVENT_BUFFER: usize = 256;

/// The single process-wide host: network client, event router and config
pub struct Host {
    client: Arc<dyn GroupClient>,
    config: Arc<Config>,
    router: EventRouter,
}

impl Host {
    pub fn new(client: Arc<dyn GroupClient>, config: Config) -> Arc<Self> {
        Arc::new(Self {
            client,
            config: Arc::new(config),
            router: EventRouter::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client_info(&self) -> ClientInfo {
        self.client.client_info()
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Register a group-message callback for `module`
    pub fn on_group_message<H>(&self, module: impl Into<String>, interest: Interest, handler: H)
    where
        H: GroupMessageHandler + 'static,
    {
        self.router.subscribe(module, interest, Arc::new(handler));
    }

    /// Send a message to a group. Failures are logged and returned, never retried.
    pub async fn send_group_message(&self, group_id: i64, message: OutgoingMessage) -> Result<(), BotError> {
        tracing::debug!("Sending to group {}: {}", group_id, message.plain_text());
        self.client
            .send_group_message(group_id, message)
            .await
            .map_err(|e| {
                tracing::error!("Failed to send message to group {}: {}", group_id, e);
                BotError::NetworkSend(e.to_string())
            })
    }

    pub async fn send_text(&self, group_id: i64, text: impl Into<String>) -> Result<(), BotError> {
        self.send_group_message(group_id, OutgoingMessage::text(text)).await
    }

    /// Route one event to every interested module
    pub async fn dispatch(self: &Arc<Self>, event: InboundEvent) -> DispatchReport {
        tracing::debug!("[{}] {}: {}", event.group_id, event.sender, event.summary());
        self.router.dispatch(Arc::clone(self), event).await
    }

    /// Start the network client and the routing loop.
    ///
    /// Each event is dispatched in its own task, so distinct events are
    /// handled concurrently.
    pub fn listen(self: &Arc<Self>) -> Listener {
        let info = self.client_info();
        tracing::info!("Listening as {} ({}) on {}", info.name, info.uin, info.platform);

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);

        let client = Arc::clone(&self.client);
        let client_task = tokio::spawn(async move {
            if let Err(e) = client.run(tx).await {
                tracing::error!("Network client stopped with error: {}", e);
            } else {
                tracing::info!("Network client stopped");
            }
        });

        let host = Arc::clone(self);
        let router_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let host = Arc::clone(&host);
                tokio::spawn(async move {
                    host.dispatch(event).await;
                });
            }
            tracing::info!("Inbound event stream closed");
        });

        Listener { client_task, router_task }
    }
}

/// Handles to the tasks started by `Host::listen`
pub struct Listener {
    client_task: JoinHandle<()>,
    router_task: JoinHandle<()>,
}

impl Listener {
    /// Resolves once the inbound stream has ended
    pub async fn closed(&mut self) {
        if self.router_task.is_finished() {
            return;
        }
        let _ = (&mut self.router_task).await;
    }

    pub fn abort(&self) {
        self.client_task.abort();
        self.router_task.abort();
    }
}
