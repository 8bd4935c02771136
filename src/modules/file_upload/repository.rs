use crate::{
    api::error::StoreError,
    modules::file_upload::{model::NewFile, schema::FileEntity},
};

/// Metadata store for uploaded files. No transactional guarantees are assumed.
#[async_trait::async_trait]
pub trait FileRepository {
    /// Persists a record, assigning its id and upload timestamp.
    async fn create(&self, file: &NewFile) -> Result<FileEntity, StoreError>;

    async fn find_all(&self) -> Result<Vec<FileEntity>, StoreError>;

    /// Fails with `InvalidId` for a malformed id and `NotFound` for an absent one.
    async fn find_by_id(&self, file_id: &str) -> Result<FileEntity, StoreError>;

    async fn delete(&self, file_id: &str) -> Result<(), StoreError>;
}
