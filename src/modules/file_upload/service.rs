use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::api::error::{StoreError, SystemError};
use crate::middlewares::CallerContext;
use crate::modules::file_upload::{
    model::{Category, NewFile, UploadConfig, UploadPayload},
    repository::FileRepository,
    schema::{FileEntity, FileResponse},
};
use crate::utils::generate_stored_name;

pub struct FileUploadService<R>
where
    R: FileRepository + Send + Sync,
{
    file_repo: Arc<R>,
    config: UploadConfig,
}

impl<R> Clone for FileUploadService<R>
where
    R: FileRepository + Send + Sync,
{
    fn clone(&self) -> Self {
        Self { file_repo: Arc::clone(&self.file_repo), config: self.config.clone() }
    }
}

impl<R> FileUploadService<R>
where
    R: FileRepository + Send + Sync,
{
    pub fn new(file_repo: Arc<R>, config: UploadConfig) -> Self {
        Self { file_repo, config }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    /// Check size first, then type.
    fn validate_file(payload: &UploadPayload, category: Category) -> Result<(), SystemError> {
        let policy = category.policy();

        if payload.size_bytes > policy.max_size_bytes {
            return Err(SystemError::policy(format!(
                "{} size exceeds maximum allowed size of {} bytes",
                category.label(),
                policy.max_size_bytes
            )));
        }

        if !policy.allows(&payload.mime_type) {
            return Err(SystemError::policy(format!(
                "invalid {} type: {}. Allowed types: {}",
                category.label(),
                payload.mime_type,
                policy.allowed_mime_types.join(", ")
            )));
        }

        Ok(())
    }

    /// Save file to disk
    async fn save_file(&self, stored_name: &str, content: &[u8]) -> Result<PathBuf, SystemError> {
        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(|e| SystemError::storage("failed to create upload directory", e))?;

        let file_path = self.config.upload_dir.join(stored_name);
        let mut file = tokio::fs::File::create(&file_path)
            .await
            .map_err(|e| SystemError::storage("failed to save file", e))?;

        let written = async {
            file.write_all(content).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            remove_best_effort(&file_path).await;
            return Err(SystemError::storage("failed to save file", e));
        }

        Ok(file_path)
    }

    /// Validate, write to disk, then record metadata. A metadata failure
    /// removes the written file before the error is returned.
    pub async fn upload(
        &self,
        payload: UploadPayload,
        owner_id: String,
        category: Category,
    ) -> Result<FileResponse, SystemError> {
        Self::validate_file(&payload, category)?;

        let stored_name = generate_stored_name(&payload.original_name);
        let file_path = self.save_file(&stored_name, &payload.content).await?;

        let new_file = NewFile {
            owner_id,
            original_name: payload.original_name,
            stored_name,
            mime_type: payload.mime_type,
            size_bytes: payload.size_bytes as i64,
            storage_path: file_path.to_string_lossy().into_owned(),
        };

        let entity = match self.file_repo.create(&new_file).await {
            Ok(entity) => entity,
            Err(e) => {
                remove_best_effort(&file_path).await;
                return Err(SystemError::PersistenceFailure(e));
            }
        };

        log::info!(
            "Stored {} upload {} ({} bytes) for {}",
            category.label(),
            entity.stored_name,
            entity.size_bytes,
            entity.owner_id
        );
        Ok(entity.into_response(&self.config.base_url))
    }

    pub async fn upload_photo(
        &self,
        payload: UploadPayload,
        owner_id: String,
    ) -> Result<FileResponse, SystemError> {
        self.upload(payload, owner_id, Category::Photo).await
    }

    pub async fn upload_certificate(
        &self,
        payload: UploadPayload,
        owner_id: String,
    ) -> Result<FileResponse, SystemError> {
        self.upload(payload, owner_id, Category::Certificate).await
    }

    pub async fn upload_file(
        &self,
        payload: UploadPayload,
        owner_id: String,
    ) -> Result<FileResponse, SystemError> {
        self.upload(payload, owner_id, Category::General).await
    }

    pub async fn list_all(&self) -> Result<Vec<FileResponse>, SystemError> {
        let files = self.file_repo.find_all().await?;
        Ok(files.into_iter().map(|f| f.into_response(&self.config.base_url)).collect())
    }

    async fn find(&self, file_id: &str) -> Result<FileEntity, SystemError> {
        self.file_repo.find_by_id(file_id).await.map_err(|e| match e {
            StoreError::InvalidId(_) | StoreError::NotFound(_) => {
                SystemError::not_found("file not found")
            }
            other => SystemError::GatewayFailure(other),
        })
    }

    pub async fn get_by_id(&self, file_id: &str) -> Result<FileResponse, SystemError> {
        let file = self.find(file_id).await?;
        Ok(file.into_response(&self.config.base_url))
    }

    /// Remove the file from disk (best effort), then its metadata.
    pub async fn delete(&self, caller: &CallerContext, file_id: &str) -> Result<(), SystemError> {
        let file = self.find(file_id).await?;

        if !caller.can_manage(&file.owner_id) {
            return Err(SystemError::forbidden("You don't have permission to delete this file"));
        }

        if let Err(e) = tokio::fs::remove_file(&file.storage_path).await {
            log::warn!("Failed to delete file {} from disk: {}", file.storage_path, e);
        }

        self.file_repo.delete(file_id).await?;

        log::info!("Deleted file {} ({})", file_id, file.stored_name);
        Ok(())
    }
}

async fn remove_best_effort(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        log::warn!("Failed to remove {} during rollback: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middlewares::Role;
    use crate::modules::file_upload::model::{MAX_CERTIFICATE_SIZE, MAX_PHOTO_SIZE};
    use crate::test::MemoryFileRepository;
    use tempfile::TempDir;

    const BASE_URL: &str = "http://localhost:3000";

    fn service_with(repo: MemoryFileRepository) -> (FileUploadService<MemoryFileRepository>, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = UploadConfig::new(dir.path().join("uploads"), BASE_URL);
        (FileUploadService::new(Arc::new(repo), config), dir)
    }

    fn payload(name: &str, mime: &str, size: usize) -> UploadPayload {
        UploadPayload::new(name, mime, vec![7u8; size])
    }

    fn files_on_disk(service: &FileUploadService<MemoryFileRepository>) -> usize {
        match std::fs::read_dir(service.upload_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    fn stored_name_of(response: &FileResponse) -> &str {
        response.url.rsplit('/').next().unwrap()
    }

    #[actix_web::test]
    async fn size_ceiling_is_inclusive_for_every_category() {
        let (service, _dir) = service_with(MemoryFileRepository::new());

        for category in Category::ALL {
            let policy = category.policy();
            let mime = policy.allowed_mime_types[0];
            let max = policy.max_size_bytes as usize;

            let at_limit = service.upload(payload("a.bin", mime, max), "u1".into(), category).await;
            assert!(at_limit.is_ok(), "{:?} rejected file at the ceiling", category);

            let over = service.upload(payload("a.bin", mime, max + 1), "u1".into(), category).await;
            match over {
                Err(SystemError::PolicyViolation(msg)) => {
                    assert!(msg.contains("size exceeds"), "unexpected message: {msg}")
                }
                other => panic!("expected size violation, got {:?}", other.map(|r| r.url)),
            }
        }
    }

    #[actix_web::test]
    async fn disallowed_type_is_rejected_regardless_of_size() {
        let (service, _dir) = service_with(MemoryFileRepository::new());

        for category in Category::ALL {
            let result =
                service.upload(payload("notes.txt", "text/plain", 1), "u1".into(), category).await;
            match result {
                Err(SystemError::PolicyViolation(msg)) => {
                    assert!(msg.contains("text/plain"));
                    for allowed in category.policy().allowed_mime_types {
                        assert!(msg.contains(allowed), "{msg} should list {allowed}");
                    }
                }
                other => panic!("expected type violation, got {:?}", other.map(|r| r.url)),
            }
        }
        assert_eq!(files_on_disk(&service), 0);
    }

    #[actix_web::test]
    async fn photo_upload_scenario() {
        let (service, _dir) = service_with(MemoryFileRepository::new());

        let response = service
            .upload_photo(payload("holiday.png", "image/png", 500 * 1024), "alice".into())
            .await
            .unwrap();

        assert_eq!(response.mime_type, "image/png");
        assert_eq!(response.size, 512000);
        assert_eq!(response.user_id, "alice");
        assert_eq!(response.original_name, "holiday.png");
        assert!(response.url.starts_with("http://localhost:3000/uploads/"));
        assert!(response.url.ends_with(".png"));

        let on_disk = service.upload_dir().join(stored_name_of(&response));
        assert_eq!(std::fs::metadata(on_disk).unwrap().len(), 512000);
    }

    #[actix_web::test]
    async fn pdf_over_photo_ceiling_fails_as_photo() {
        let (service, _dir) = service_with(MemoryFileRepository::new());
        let size = (MAX_PHOTO_SIZE + MAX_PHOTO_SIZE / 2) as usize;
        assert!((size as u64) < MAX_CERTIFICATE_SIZE);

        let result =
            service.upload_photo(payload("cert.pdf", "application/pdf", size), "u1".into()).await;
        assert!(matches!(result, Err(SystemError::PolicyViolation(_))));

        let result = service
            .upload_certificate(payload("cert.pdf", "application/pdf", size), "u1".into())
            .await;
        assert!(result.is_ok());
    }

    #[actix_web::test]
    async fn stored_name_preserves_extension() {
        let (service, _dir) = service_with(MemoryFileRepository::new());

        let with_ext = service
            .upload_file(payload("scan.final.PDF", "application/pdf", 3), "u1".into())
            .await
            .unwrap();
        assert!(stored_name_of(&with_ext).ends_with(".PDF"));

        let without_ext =
            service.upload_file(payload("scan", "application/pdf", 3), "u1".into()).await.unwrap();
        assert!(!stored_name_of(&without_ext).contains('.'));
    }

    #[actix_web::test]
    async fn identical_uploads_get_distinct_names_and_ids() {
        let (service, _dir) = service_with(MemoryFileRepository::new());

        let first = service.upload_photo(payload("me.jpg", "image/jpeg", 10), "u1".into()).await.unwrap();
        let second =
            service.upload_photo(payload("me.jpg", "image/jpeg", 10), "u1".into()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.url, second.url);
        assert_eq!(files_on_disk(&service), 2);
    }

    #[actix_web::test]
    async fn metadata_failure_rolls_back_file() {
        let (service, _dir) = service_with(MemoryFileRepository::failing_create());

        let result = service.upload_photo(payload("me.png", "image/png", 10), "u1".into()).await;

        assert!(matches!(result, Err(SystemError::PersistenceFailure(_))));
        assert!(service.upload_dir().exists());
        assert_eq!(files_on_disk(&service), 0);
    }

    #[actix_web::test]
    async fn unwritable_upload_dir_is_storage_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let repo = Arc::new(MemoryFileRepository::new());
        let service = FileUploadService::new(repo.clone(), UploadConfig::new(blocker.join("uploads"), BASE_URL));

        let result = service.upload_photo(payload("me.png", "image/png", 10), "u1".into()).await;

        assert!(matches!(result, Err(SystemError::StorageFailure { .. })));
        assert!(repo.is_empty());
    }

    #[actix_web::test]
    async fn list_all_maps_every_record() {
        let (service, _dir) = service_with(MemoryFileRepository::new());
        service.upload_photo(payload("a.png", "image/png", 1), "alice".into()).await.unwrap();
        service.upload_certificate(payload("b.pdf", "application/pdf", 1), "bob".into()).await.unwrap();

        let files = service.list_all().await.unwrap();
        let owners: Vec<_> = files.iter().map(|f| f.user_id.as_str()).collect();
        assert_eq!(owners, vec!["alice", "bob"]);
    }

    #[actix_web::test]
    async fn get_unknown_or_malformed_id_is_not_found() {
        let (service, _dir) = service_with(MemoryFileRepository::new());

        let unknown = service.get_by_id(&uuid::Uuid::now_v7().to_string()).await;
        assert!(matches!(unknown, Err(SystemError::NotFound(_))));

        let malformed = service.get_by_id("definitely-not-an-id").await;
        assert!(matches!(malformed, Err(SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn delete_then_get_is_not_found() {
        let (service, _dir) = service_with(MemoryFileRepository::new());
        let owner = CallerContext::new("alice", Role::User);
        let uploaded = service.upload_photo(payload("a.png", "image/png", 4), "alice".into()).await.unwrap();

        service.delete(&owner, &uploaded.id).await.unwrap();

        assert_eq!(files_on_disk(&service), 0);
        assert!(matches!(service.get_by_id(&uploaded.id).await, Err(SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn delete_succeeds_when_file_already_gone() {
        let (service, _dir) = service_with(MemoryFileRepository::new());
        let owner = CallerContext::new("alice", Role::User);
        let uploaded = service.upload_photo(payload("a.png", "image/png", 4), "alice".into()).await.unwrap();
        std::fs::remove_file(service.upload_dir().join(stored_name_of(&uploaded))).unwrap();

        service.delete(&owner, &uploaded.id).await.unwrap();

        assert!(matches!(service.get_by_id(&uploaded.id).await, Err(SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn delete_requires_owner_or_admin() {
        let (service, _dir) = service_with(MemoryFileRepository::new());
        let uploaded = service.upload_photo(payload("a.png", "image/png", 4), "alice".into()).await.unwrap();

        let stranger = CallerContext::new("mallory", Role::User);
        let result = service.delete(&stranger, &uploaded.id).await;
        assert!(matches!(result, Err(SystemError::Forbidden(_))));
        assert_eq!(files_on_disk(&service), 1);

        let admin = CallerContext::new("root", Role::Admin);
        service.delete(&admin, &uploaded.id).await.unwrap();
        assert_eq!(files_on_disk(&service), 0);
    }

    #[actix_web::test]
    async fn metadata_delete_failure_surfaces_after_file_removal() {
        let (service, _dir) = service_with(MemoryFileRepository::failing_delete());
        let owner = CallerContext::new("alice", Role::User);
        let uploaded = service.upload_photo(payload("a.png", "image/png", 4), "alice".into()).await.unwrap();

        let result = service.delete(&owner, &uploaded.id).await;

        assert!(matches!(result, Err(SystemError::GatewayFailure(_))));
        assert_eq!(files_on_disk(&service), 0);
        assert!(service.get_by_id(&uploaded.id).await.is_ok());
    }

    #[actix_web::test]
    async fn delete_unknown_id_is_not_found() {
        let (service, _dir) = service_with(MemoryFileRepository::new());
        let admin = CallerContext::new("root", Role::Admin);

        let result = service.delete(&admin, "missing").await;
        assert!(matches!(result, Err(SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn unreachable_store_fails_reads_as_gateway_failure() {
        let (service, _dir) = service_with(MemoryFileRepository::failing_reads());

        assert!(matches!(service.list_all().await, Err(SystemError::GatewayFailure(_))));

        let result = service.get_by_id(&uuid::Uuid::now_v7().to_string()).await;
        assert!(matches!(result, Err(SystemError::GatewayFailure(_))));

        let err: crate::api::error::Error = result.unwrap_err().into();
        assert_eq!(
            actix_web::ResponseError::status_code(&err),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
