use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// File metadata entity from the store
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileEntity {
    pub id: Uuid,
    pub owner_id: String,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Client-facing view of a stored file. `storage_path` never leaves the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: String,
    pub user_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl FileEntity {
    pub fn into_response(self, base_url: &str) -> FileResponse {
        FileResponse {
            id: self.id.to_string(),
            url: format!("{}/uploads/{}", base_url, self.stored_name),
            user_id: self.owner_id,
            original_name: self.original_name,
            mime_type: self.mime_type,
            size: self.size_bytes,
            uploaded_at: self.uploaded_at,
        }
    }
}
