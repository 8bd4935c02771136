use actix_multipart::{Field, Multipart};
use actix_web::{http::header, web, HttpRequest};
use futures_util::TryStreamExt;

use crate::api::{error, success::Success};
use crate::middlewares::{get_extensions, CallerContext};
use crate::modules::file_upload::{
    model::{Category, UploadPayload, MAX_GENERAL_SIZE},
    repository::FileRepository,
    schema::FileResponse,
    service::FileUploadService,
};

const FILE_FIELD: &str = "file";
const TARGET_USER_FIELD: &str = "target_user_id";

/// Largest multipart body accepted: the biggest category plus form overhead.
const MAX_BODY_SIZE: u64 = MAX_GENERAL_SIZE + 64 * 1024;
const MAX_TEXT_FIELD_LEN: usize = 256;

struct UploadForm {
    file: Option<UploadPayload>,
    target_user_id: Option<String>,
}

/// Counts every byte pulled off the multipart stream against `MAX_BODY_SIZE`.
#[derive(Default)]
struct BodyCounter {
    consumed: u64,
}

impl BodyCounter {
    async fn next_chunk(&mut self, field: &mut Field) -> Result<Option<web::Bytes>, error::Error> {
        let chunk = field
            .try_next()
            .await
            .map_err(|_| error::Error::bad_request("Invalid multipart form"))?;
        if let Some(chunk) = &chunk {
            self.consumed += chunk.len() as u64;
            if self.consumed > MAX_BODY_SIZE {
                return Err(too_large());
            }
        }
        Ok(chunk)
    }
}

fn too_large() -> error::Error {
    error::Error::PayloadTooLarge(
        format!("Request body exceeds maximum allowed size of {} bytes", MAX_BODY_SIZE).into(),
    )
}

fn check_content_length(req: &HttpRequest) -> Result<(), error::Error> {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    match declared {
        Some(len) if len > MAX_BODY_SIZE => Err(too_large()),
        _ => Ok(()),
    }
}

/// Buffers the `file` part until it passes `max_size_bytes`, then stops so
/// the size check rejects it without the rest being read.
async fn read_file_field(
    field: &mut Field,
    counter: &mut BodyCounter,
    original_name: String,
    max_size_bytes: u64,
) -> Result<UploadPayload, error::Error> {
    let mime_type = field
        .content_type()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut content = Vec::new();
    while let Some(chunk) = counter.next_chunk(field).await? {
        content.extend_from_slice(&chunk);
        if content.len() as u64 > max_size_bytes {
            break;
        }
    }

    Ok(UploadPayload::new(original_name, mime_type, content))
}

async fn read_text_field(
    field: &mut Field,
    counter: &mut BodyCounter,
) -> Result<String, error::Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = counter.next_chunk(field).await? {
        bytes.extend_from_slice(&chunk);
        if bytes.len() > MAX_TEXT_FIELD_LEN {
            return Err(error::Error::bad_request(format!(
                "Form field exceeds maximum length of {} bytes",
                MAX_TEXT_FIELD_LEN
            )));
        }
    }
    String::from_utf8(bytes)
        .map(|s| s.trim().to_string())
        .map_err(|_| error::Error::bad_request("Form fields must be valid UTF-8"))
}

async fn drain_field(field: &mut Field, counter: &mut BodyCounter) -> Result<(), error::Error> {
    while counter.next_chunk(field).await?.is_some() {}
    Ok(())
}

async fn read_upload_form(
    mut payload: Multipart,
    category: Category,
) -> Result<UploadForm, error::Error> {
    let max_size_bytes = category.policy().max_size_bytes;
    let mut counter = BodyCounter::default();
    let mut form = UploadForm { file: None, target_user_id: None };

    while let Some(mut field) =
        payload.try_next().await.map_err(|_| error::Error::bad_request("Invalid multipart form"))?
    {
        let name = field.name().map(str::to_string);
        // A `file` part without a filename is a plain value, not an upload.
        let filename =
            field.content_disposition().and_then(|cd| cd.get_filename()).map(str::to_string);

        match (name.as_deref(), filename) {
            (Some(FILE_FIELD), Some(filename)) if form.file.is_none() => {
                let file =
                    read_file_field(&mut field, &mut counter, filename, max_size_bytes).await?;
                let oversize = file.size_bytes > max_size_bytes;
                form.file = Some(file);
                if oversize {
                    break;
                }
            }
            (Some(TARGET_USER_FIELD), _) => {
                form.target_user_id = Some(read_text_field(&mut field, &mut counter).await?);
            }
            _ => drain_field(&mut field, &mut counter).await?,
        }
    }

    Ok(form)
}

/// Reads the form and resolves who owns the upload. Only photo and
/// certificate uploads honour an admin's `target_user_id`.
async fn read_upload(
    payload: Multipart,
    req: &HttpRequest,
    category: Category,
) -> Result<(UploadPayload, String), error::Error> {
    let caller = get_extensions::<CallerContext>(req)?;
    check_content_length(req)?;
    let form = read_upload_form(payload, category).await?;
    let file = form.file.ok_or_else(|| error::Error::bad_request("No file uploaded"))?;

    let owner_id = match category {
        Category::General => caller.user_id,
        Category::Photo | Category::Certificate => {
            caller.owner_for(form.target_user_id.as_deref())
        }
    };
    Ok((file, owner_id))
}

/// Upload handler for the general category
pub async fn upload_file<R>(
    payload: Multipart,
    req: HttpRequest,
    service: web::Data<FileUploadService<R>>,
) -> Result<Success<FileResponse>, error::Error>
where
    R: FileRepository + Send + Sync + 'static,
{
    let (file, owner_id) = read_upload(payload, &req, Category::General).await?;
    let result = service.upload_file(file, owner_id).await?;
    Ok(Success::created_plain(result))
}

pub async fn upload_photo<R>(
    payload: Multipart,
    req: HttpRequest,
    service: web::Data<FileUploadService<R>>,
) -> Result<Success<FileResponse>, error::Error>
where
    R: FileRepository + Send + Sync + 'static,
{
    let (file, owner_id) = read_upload(payload, &req, Category::Photo).await?;
    let result = service.upload_photo(file, owner_id).await?;
    Ok(Success::created_plain(result))
}

pub async fn upload_certificate<R>(
    payload: Multipart,
    req: HttpRequest,
    service: web::Data<FileUploadService<R>>,
) -> Result<Success<FileResponse>, error::Error>
where
    R: FileRepository + Send + Sync + 'static,
{
    let (file, owner_id) = read_upload(payload, &req, Category::Certificate).await?;
    let result = service.upload_certificate(file, owner_id).await?;
    Ok(Success::created_plain(result))
}

pub async fn list_files<R>(
    service: web::Data<FileUploadService<R>>,
) -> Result<Success<Vec<FileResponse>>, error::Error>
where
    R: FileRepository + Send + Sync + 'static,
{
    let files = service.list_all().await?;
    Ok(Success::ok(Some(files)))
}

pub async fn get_file<R>(
    file_id: web::Path<String>,
    service: web::Data<FileUploadService<R>>,
) -> Result<Success<FileResponse>, error::Error>
where
    R: FileRepository + Send + Sync + 'static,
{
    let file = service.get_by_id(&file_id).await?;
    Ok(Success::ok_plain(file))
}

/// Delete handler, owner or admin only
pub async fn delete_file<R>(
    file_id: web::Path<String>,
    req: HttpRequest,
    service: web::Data<FileUploadService<R>>,
) -> Result<Success<()>, error::Error>
where
    R: FileRepository + Send + Sync + 'static,
{
    let caller = get_extensions::<CallerContext>(&req)?;
    service.delete(&caller, &file_id).await?;
    Ok(Success::no_content())
}
