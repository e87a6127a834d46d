//! Command dispatcher - classifies a group message and runs its handler

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;

use crate::application::errors::{BotError, CommandError};
use crate::application::services::Host;
use crate::domain::entities::{CommandInvocation, CommandKind, InboundEvent, OutgoingMessage};
use super::classifier::CommandClassifier;
use super::router::GroupMessageHandler;

/// Prefix of replies reporting success
pub const SUCCESS_PREFIX: &str = "[✓] ";

/// Prefix of replies reporting a failed command
pub const FAILURE_PREFIX: &str = "[!] ";

/// What a handler gets to work with
pub struct CommandContext<'a> {
    pub event: &'a InboundEvent,
    pub payload: Option<Vec<u8>>,
}

/// Handler for one command kind. The returned message is sent to the
/// originating group; an error is reported there as a failure reply.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: CommandContext<'_>) -> Result<OutgoingMessage, CommandError>;
}

/// What happened to a dispatched message
#[derive(Debug)]
pub enum DispatchOutcome {
    Ignored,
    Replied(CommandKind),
    Failed(CommandKind, CommandError),
}

/// Per-module classifier plus handler table
pub struct CommandDispatcher {
    module: String,
    classifier: CommandClassifier,
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new(module: impl Into<String>, classifier: CommandClassifier) -> Self {
        Self {
            module: module.into(),
            classifier,
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for `kind`, replacing any previous one
    pub fn with_handler<H: CommandHandler + 'static>(mut self, kind: CommandKind, handler: H) -> Self {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    pub fn classify(&self, event: &InboundEvent) -> CommandInvocation {
        self.classifier.classify(&event.elements)
    }

    /// Classify `event`, run the matching handler and reply to its group
    pub async fn dispatch(&self, host: &Host, event: &InboundEvent) -> Result<DispatchOutcome, BotError> {
        let invocation = self.classify(event);
        if invocation.is_noop() {
            return Ok(DispatchOutcome::Ignored);
        }

        let kind = invocation.kind;
        let Some(handler) = self.handlers.get(&kind) else {
            tracing::debug!("[{}] {}: no handler for {}", event.group_id, self.module, kind.as_str());
            return Ok(DispatchOutcome::Ignored);
        };

        tracing::info!("[{}] {} runs {} for {}", event.group_id, self.module, kind.as_str(), event.sender);

        let ctx = CommandContext {
            event,
            payload: invocation.payload,
        };

        match handler.handle(ctx).await {
            Ok(reply) => {
                host.send_group_message(event.group_id, reply).await?;
                Ok(DispatchOutcome::Replied(kind))
            }
            Err(e) => {
                tracing::warn!("[{}] {} {} failed: {}", event.group_id, self.module, kind.as_str(), e);
                host.send_text(event.group_id, format!("{}{}", FAILURE_PREFIX, e)).await?;
                Ok(DispatchOutcome::Failed(kind, e))
            }
        }
    }
}

#[async_trait]
impl GroupMessageHandler for CommandDispatcher {
    async fn handle(&self, host: Arc<Host>, event: Arc<InboundEvent>) -> Result<(), BotError> {
        self.dispatch(&host, &event).await.map(|_| ())
    }
}
