use uuid::Uuid;

use crate::{
    api::error::StoreError,
    modules::file_upload::{model::NewFile, repository::FileRepository, schema::FileEntity},
};

#[derive(Clone)]
pub struct FilePgRepository {
    pool: sqlx::PgPool,
}

impl FilePgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn parse_id(file_id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(file_id).map_err(|_| StoreError::InvalidId(file_id.to_string()))
}

#[async_trait::async_trait]
impl FileRepository for FilePgRepository {
    async fn create(&self, file: &NewFile) -> Result<FileEntity, StoreError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let entity = sqlx::query_as::<_, FileEntity>(
            r#"
            INSERT INTO files (id, owner_id, original_name, stored_name, mime_type, size_bytes, storage_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&file.owner_id)
        .bind(&file.original_name)
        .bind(&file.stored_name)
        .bind(&file.mime_type)
        .bind(file.size_bytes)
        .bind(&file.storage_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn find_all(&self) -> Result<Vec<FileEntity>, StoreError> {
        let files = sqlx::query_as::<_, FileEntity>(
            r#"
            SELECT * FROM files ORDER BY uploaded_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn find_by_id(&self, file_id: &str) -> Result<FileEntity, StoreError> {
        let id = parse_id(file_id)?;
        sqlx::query_as::<_, FileEntity>(
            r#"
            SELECT * FROM files WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(file_id.to_string()))
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        let id = parse_id(file_id)?;
        let rows = sqlx::query(
            r#"
            DELETE FROM files WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::NotFound(file_id.to_string()));
        }
        Ok(())
    }
}
