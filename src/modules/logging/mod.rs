//! Logs every group message the host receives

use std::sync::Arc;
use async_trait::async_trait;

use crate::application::errors::{BotError, ModuleError};
use crate::application::messaging::{GroupMessageHandler, Interest};
use crate::application::services::Host;
use crate::domain::entities::InboundEvent;
use crate::infrastructure::config::Config;
use super::{DoneSignal, Module, ModuleInfo};

pub const MODULE_ID: &str = "internal.logging";

#[derive(Debug, Default)]
pub struct LoggingModule;

impl LoggingModule {
    pub fn new() -> Self {
        Self
    }
}

struct LogMessages;

#[async_trait]
impl GroupMessageHandler for LogMessages {
    async fn handle(&self, _host: Arc<Host>, event: Arc<InboundEvent>) -> Result<(), BotError> {
        tracing::info!(
            target: "group_message",
            group = event.group_id,
            sender = event.sender.uin,
            "{}: {}",
            event.sender.display_name(),
            event.summary()
        );
        Ok(())
    }
}

#[async_trait]
impl Module for LoggingModule {
    fn info(&self) -> ModuleInfo {
        ModuleInfo::new(MODULE_ID, "Log all group messages")
    }

    async fn init(&self, _config: &Config) -> Result<(), ModuleError> {
        Ok(())
    }

    fn serve(&self, host: &Host) -> Result<(), ModuleError> {
        host.on_group_message(MODULE_ID, Interest::AllGroups, LogMessages);
        Ok(())
    }

    async fn stop(&self, _host: Arc<Host>, done: DoneSignal) {
        done.done();
    }
}
