//! Command handlers of the snippets module

use std::sync::Arc;
use async_trait::async_trait;
use rand::Rng;

use crate::application::errors::CommandError;
use crate::application::messaging::{CommandContext, CommandHandler, SUCCESS_PREFIX};
use crate::domain::entities::{NewSnippet, OutgoingMessage, Snippet};
use crate::domain::traits::SnippetStore;
use crate::infrastructure::storage::ImageStore;

/// `!添加语录` with an image: store the image and record who sent it
pub struct AddSnippet {
    pub store: Arc<dyn SnippetStore>,
    pub images: ImageStore,
}

#[async_trait]
impl CommandHandler for AddSnippet {
    async fn handle(&self, ctx: CommandContext<'_>) -> Result<OutgoingMessage, CommandError> {
        let image = ctx.payload.ok_or(CommandError::MissingPayload)?;

        let path = self.images.put(&image).await.map_err(|e| {
            tracing::error!("Failed to write image to file: {}", e);
            CommandError::StorageWrite("failed to write image to file".to_string())
        })?;

        let event = ctx.event;
        let snippet = self
            .store
            .create(NewSnippet {
                from_user_uin: event.sender.uin,
                from_user_display: event.sender.display_name(),
                from_group: event.group_id,
                image_path: path.to_string_lossy().into_owned(),
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to create db record: {}", e);
                CommandError::StorageWrite("failed to create db record".to_string())
            })?;

        tracing::info!("[{}] Recorded snippet #{} from {}", event.group_id, snippet.id, event.sender);
        Ok(OutgoingMessage::text(format!(
            "{}语录已添加为如下记录\n{}",
            SUCCESS_PREFIX,
            render(&snippet)
        )))
    }
}

/// `!随机语录`: send back a uniformly chosen snippet
pub struct RandomSnippet {
    pub store: Arc<dyn SnippetStore>,
    pub images: ImageStore,
}

impl RandomSnippet {
    async fn pick(&self) -> Result<Snippet, CommandError> {
        let count = self
            .store
            .count()
            .await
            .map_err(|e| CommandError::StorageRead(e.to_string()))?;
        if count == 0 {
            return Err(CommandError::EmptyStore);
        }

        let offset = rand::thread_rng().gen_range(0..count);
        self.store
            .nth(offset)
            .await
            .map_err(|e| CommandError::StorageRead(e.to_string()))?
            // Rows only disappear through manual deletion between the two queries
            .ok_or(CommandError::EmptyStore)
    }
}

#[async_trait]
impl CommandHandler for RandomSnippet {
    async fn handle(&self, _ctx: CommandContext<'_>) -> Result<OutgoingMessage, CommandError> {
        let snippet = self.pick().await?;
        let image = self
            .images
            .read(&snippet.image_path)
            .await
            .map_err(|e| CommandError::StorageRead(e.to_string()))?;

        Ok(OutgoingMessage::new()
            .with_text(format!(
                "由 {} ({}) 录入于群 {} 的随机语录 #{}：",
                snippet.from_user_display, snippet.from_user_uin, snippet.from_group, snippet.id
            ))
            .with_image(image))
    }
}

fn render(snippet: &Snippet) -> String {
    serde_json::to_string_pretty(snippet).unwrap_or_else(|_| format!("{:?}", snippet))
}
