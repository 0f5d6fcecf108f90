//! Document storage capability. The files themselves live in the document
//! storage service; this service only tracks opaque references to them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;

#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Store a file and return an opaque reference to it.
    async fn store(&self, file_name: &str, data: Vec<u8>) -> Result<String, AppError>;

    /// Delete a previously stored file.
    async fn delete(&self, reference: &str) -> Result<(), AppError>;
}

/// Stand-in until the document-storage integration lands: references are
/// generated locally and the file content is discarded.
pub struct StubDocumentStorage;

#[async_trait]
impl DocumentStorage for StubDocumentStorage {
    async fn store(&self, file_name: &str, data: Vec<u8>) -> Result<String, AppError> {
        let reference = format!("receivable-doc-{}", Uuid::new_v4());
        tracing::warn!(
            %file_name,
            size = data.len(),
            %reference,
            "Document storage stub: content discarded, reference issued"
        );
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), AppError> {
        tracing::warn!(%reference, "Document storage stub: nothing to delete");
        Ok(())
    }
}
