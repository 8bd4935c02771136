use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{close_database, connect_database},
    modules::file_upload::{FilePgRepository, FileUploadService, UploadConfig},
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    LazyLock::force(&ENV);

    let db_pool = connect_database().await.map_err(|e| {
        log::error!("{}", e);
        std::io::Error::other("Database connection error")
    })?;

    let file_repo = FilePgRepository::new(db_pool.clone());
    let file_service = web::Data::new(FileUploadService::new(
        Arc::new(file_repo),
        UploadConfig::new(&ENV.upload_dir, ENV.base_url.as_str()),
    ));

    let upload_dir = file_service.upload_dir().to_path_buf();
    std::fs::create_dir_all(&upload_dir)?;

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(file_service.clone())
            .service(health_check)
            .service(
                web::scope("/api/files")
                    .configure(modules::file_upload::route::configure::<FilePgRepository>),
            )
            .service(actix_files::Files::new("/uploads", upload_dir.clone()))
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .run()
    .await;

    close_database(db_pool).await;
    server
}
