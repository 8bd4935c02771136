use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{api::error::StoreError, ENV};

/// Opens the metadata store pool and brings the schema up to date.
pub async fn connect_database() -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(ENV.max_connections)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(&ENV.database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string().into()))?;

    log::info!("Connected to metadata store");
    Ok(pool)
}

pub async fn close_database(pool: PgPool) {
    pool.close().await;
    log::info!("Metadata store connection closed");
}
