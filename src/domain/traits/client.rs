use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::domain::entities::{InboundEvent, OutgoingMessage};
use crate::application::errors::BotError;

/// Network client abstraction - the messaging platform behind the host
#[async_trait]
pub trait GroupClient: Send + Sync {
    /// Connect and push every inbound group message into `events` until the
    /// connection ends or the receiving side is dropped
    async fn run(&self, events: mpsc::Sender<InboundEvent>) -> Result<(), BotError>;

    /// Send a composed message to a group
    async fn send_group_message(&self, group_id: i64, message: OutgoingMessage) -> Result<(), BotError>;

    /// Get client info
    fn client_info(&self) -> ClientInfo;
}

/// Identity of the logged-in account
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub uin: i64,
    pub name: String,
    pub platform: String,
}
