use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{NewSnippet, Snippet};

/// Store trait - persistence for snippet records
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Insert a new row and return it with its assigned id and timestamps
    async fn create(&self, snippet: NewSnippet) -> Result<Snippet, StorageError>;

    /// Number of live (not soft-deleted) rows
    async fn count(&self) -> Result<u64, StorageError>;

    /// Row at `offset` in id order, skipping soft-deleted rows
    async fn nth(&self, offset: u64) -> Result<Option<Snippet>, StorageError>;

    async fn get(&self, id: i64) -> Result<Option<Snippet>, StorageError>;

    /// Release the underlying handle; later calls fail with `StorageError::Closed`
    async fn close(&self) -> Result<(), StorageError>;
}
