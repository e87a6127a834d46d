//! In-process loopback adapter

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{InboundEvent, OutgoingMessage};
use crate::domain::traits::{ClientInfo, GroupClient};

const INJECT_BUFFER: usize = 64;

/// Loopback client: events are injected through a channel and every sent
/// message is recorded instead of leaving the process
pub struct MemoryAdapter {
    info: ClientInfo,
    injector: Mutex<Option<mpsc::Sender<InboundEvent>>>,
    inbound: Mutex<Option<mpsc::Receiver<InboundEvent>>>,
    sent: Mutex<Vec<(i64, OutgoingMessage)>>,
    fail_sends: AtomicBool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        let (injector, inbound) = mpsc::channel(INJECT_BUFFER);
        Self {
            info: ClientInfo {
                uin: 10001,
                name: "snippets-bot".to_string(),
                platform: "memory".to_string(),
            },
            injector: Mutex::new(Some(injector)),
            inbound: Mutex::new(Some(inbound)),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Queue an event for `run` to deliver
    pub async fn inject(&self, event: InboundEvent) -> Result<(), BotError> {
        let injector = self
            .injector
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?
            .clone();
        let injector = injector.ok_or_else(|| BotError::Network("inbound stream is closed".to_string()))?;
        injector
            .send(event)
            .await
            .map_err(|_| BotError::Network("inbound stream is closed".to_string()))
    }

    /// End the inbound stream once queued events are drained
    pub fn close(&self) {
        if let Ok(mut injector) = self.injector.lock() {
            injector.take();
        }
    }

    /// Messages sent so far, as (group, message)
    pub fn sent(&self) -> Vec<(i64, OutgoingMessage)> {
        self.sent
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn sent_to(&self, group_id: i64) -> Vec<OutgoingMessage> {
        self.sent()
            .into_iter()
            .filter(|(g, _)| *g == group_id)
            .map(|(_, m)| m)
            .collect()
    }

    /// Make every following send fail, to exercise error paths
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupClient for MemoryAdapter {
    async fn run(&self, events: mpsc::Sender<InboundEvent>) -> Result<(), BotError> {
        let inbound = self
            .inbound
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?
            .take();
        let Some(mut inbound) = inbound else {
            return Err(BotError::Network("memory client is already running".to_string()));
        };

        while let Some(event) = inbound.recv().await {
            if events.send(event).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    async fn send_group_message(&self, group_id: i64, message: OutgoingMessage) -> Result<(), BotError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BotError::Network("send disabled".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?
            .push((group_id, message));
        Ok(())
    }

    fn client_info(&self) -> ClientInfo {
        self.info.clone()
    }
}
