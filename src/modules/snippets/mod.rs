//! Group snippets: save an image with `!添加语录`, replay a random one with
//! `!随机语录`

mod handlers;

use std::sync::{Arc, RwLock};
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::application::errors::ModuleError;
use crate::application::messaging::{CommandClassifier, CommandDispatcher, Interest};
use crate::application::services::Host;
use crate::domain::entities::CommandKind;
use crate::domain::traits::SnippetStore;
use crate::infrastructure::config::{Config, SnippetsConfig};
use crate::infrastructure::database::SqliteSnippetStore;
use crate::infrastructure::storage::ImageStore;
use super::{DoneSignal, Module, ModuleInfo};

pub use handlers::{AddSnippet, RandomSnippet};

pub const MODULE_ID: &str = "galvingao.snippets";

/// Resources opened during PostInit
struct Resources {
    store: Arc<dyn SnippetStore>,
    images: ImageStore,
}

#[derive(Default)]
pub struct SnippetsModule {
    settings: RwLock<Option<SnippetsConfig>>,
    resources: RwLock<Option<Resources>>,
}

impl SnippetsModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn settings(&self) -> Result<SnippetsConfig, ModuleError> {
        self.settings
            .read()
            .map_err(|_| ModuleError::NotReady("settings lock poisoned".to_string()))?
            .clone()
            .ok_or_else(|| ModuleError::NotReady("init has not run".to_string()))
    }
}

#[async_trait]
impl Module for SnippetsModule {
    fn info(&self) -> ModuleInfo {
        ModuleInfo::new(MODULE_ID, "Record and replay group snippets")
    }

    async fn init(&self, config: &Config) -> Result<(), ModuleError> {
        let settings = config.snippets.clone();
        if settings.groups.is_empty() {
            warn!("snippets.groups is empty, {} will not answer any group", MODULE_ID);
        }

        *self
            .settings
            .write()
            .map_err(|_| ModuleError::NotReady("settings lock poisoned".to_string()))? = Some(settings);
        Ok(())
    }

    async fn post_init(&self, config: &Config) -> Result<(), ModuleError> {
        let settings = self.settings()?;

        let store = SqliteSnippetStore::open(&config.database.dsn)?;
        let images = ImageStore::new(&settings.image_dir);
        images.init().await?;
        info!("Snippet store ready at {}, images under {}", config.database.dsn, images.base_dir().display());

        *self
            .resources
            .write()
            .map_err(|_| ModuleError::NotReady("resources lock poisoned".to_string()))? = Some(Resources {
            store: Arc::new(store),
            images,
        });
        Ok(())
    }

    fn serve(&self, host: &Host) -> Result<(), ModuleError> {
        let settings = self.settings()?;
        let resources = self
            .resources
            .read()
            .map_err(|_| ModuleError::NotReady("resources lock poisoned".to_string()))?;
        let Some(resources) = resources.as_ref() else {
            return Err(ModuleError::NotReady("store was not opened in PostInit".to_string()));
        };

        let classifier = CommandClassifier::new()
            .with_prefix(settings.add_prefix.clone(), CommandKind::AddRecord)
            .with_prefix(settings.random_prefix.clone(), CommandKind::RandomRecord);

        let dispatcher = CommandDispatcher::new(MODULE_ID, classifier)
            .with_handler(
                CommandKind::AddRecord,
                AddSnippet {
                    store: Arc::clone(&resources.store),
                    images: resources.images.clone(),
                },
            )
            .with_handler(
                CommandKind::RandomRecord,
                RandomSnippet {
                    store: Arc::clone(&resources.store),
                    images: resources.images.clone(),
                },
            );

        host.on_group_message(MODULE_ID, Interest::groups(settings.groups), dispatcher);
        Ok(())
    }

    async fn stop(&self, _host: Arc<Host>, done: DoneSignal) {
        let resources = match self.resources.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(resources) = resources {
            if let Err(e) = resources.store.close().await {
                error!("Failed to close snippet store: {}", e);
            }
        }

        done.done();
    }
}
