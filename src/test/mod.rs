use std::sync::Mutex;
use uuid::Uuid;

use crate::api::error::StoreError;
use crate::modules::file_upload::{model::NewFile, repository::FileRepository, schema::FileEntity};

/// In-memory metadata store with switchable failures.
#[derive(Default)]
pub struct MemoryFileRepository {
    files: Mutex<Vec<FileEntity>>,
    fail_create: bool,
    fail_delete: bool,
    fail_reads: bool,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create() -> Self {
        Self { fail_create: true, ..Self::default() }
    }

    pub fn failing_delete() -> Self {
        Self { fail_delete: true, ..Self::default() }
    }

    pub fn failing_reads() -> Self {
        Self { fail_reads: true, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }
}

#[async_trait::async_trait]
impl FileRepository for MemoryFileRepository {
    async fn create(&self, file: &NewFile) -> Result<FileEntity, StoreError> {
        if self.fail_create {
            return Err(StoreError::Database("insert rejected".into()));
        }
        let entity = FileEntity {
            id: Uuid::now_v7(),
            owner_id: file.owner_id.clone(),
            original_name: file.original_name.clone(),
            stored_name: file.stored_name.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes,
            storage_path: file.storage_path.clone(),
            uploaded_at: chrono::Utc::now(),
        };
        self.files.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn find_all(&self) -> Result<Vec<FileEntity>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Database("store unreachable".into()));
        }
        Ok(self.files.lock().unwrap().clone())
    }

    async fn find_by_id(&self, file_id: &str) -> Result<FileEntity, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Database("store unreachable".into()));
        }
        let id = Uuid::parse_str(file_id).map_err(|_| StoreError::InvalidId(file_id.to_string()))?;
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        if self.fail_delete {
            return Err(StoreError::Database("delete rejected".into()));
        }
        let id = Uuid::parse_str(file_id).map_err(|_| StoreError::InvalidId(file_id.to_string()))?;
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != id);
        if files.len() == before {
            return Err(StoreError::NotFound(file_id.to_string()));
        }
        Ok(())
    }
}
