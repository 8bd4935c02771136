use actix_web::{guard, middleware::from_fn, web};

use crate::middlewares::authentication;
use crate::modules::file_upload::{handle, repository::FileRepository};

/// Uploads and deletes require a caller identity; listing and lookup are public.
pub fn configure<R>(cfg: &mut web::ServiceConfig)
where
    R: FileRepository + Send + Sync + 'static,
{
    cfg.service(
        web::resource("/upload")
            .wrap(from_fn(authentication))
            .route(web::post().to(handle::upload_file::<R>)),
    )
    .service(
        web::resource("/photo")
            .wrap(from_fn(authentication))
            .route(web::post().to(handle::upload_photo::<R>)),
    )
    .service(
        web::resource("/certificate")
            .wrap(from_fn(authentication))
            .route(web::post().to(handle::upload_certificate::<R>)),
    )
    .service(web::resource(["", "/"]).route(web::get().to(handle::list_files::<R>)))
    .service(
        web::resource("/{file_id}")
            .guard(guard::Get())
            .route(web::get().to(handle::get_file::<R>)),
    )
    .service(
        web::resource("/{file_id}")
            .guard(guard::Delete())
            .wrap(from_fn(authentication))
            .route(web::delete().to(handle::delete_file::<R>)),
    );
}
