use std::path::PathBuf;

pub const MAX_PHOTO_SIZE: u64 = 1024 * 1024;
pub const MAX_CERTIFICATE_SIZE: u64 = 2 * 1024 * 1024;
pub const MAX_GENERAL_SIZE: u64 = 10 * 1024 * 1024;

const PHOTO_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];
const CERTIFICATE_TYPES: &[&str] = &["application/pdf"];
const GENERAL_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "application/pdf"];

/// Upload category, chosen by the endpoint the client calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Photo,
    Certificate,
    General,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryPolicy {
    pub max_size_bytes: u64,
    pub allowed_mime_types: &'static [&'static str],
}

impl CategoryPolicy {
    pub fn allows(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|allowed| *allowed == mime_type)
    }
}

impl Category {
    #[cfg(test)]
    pub const ALL: [Category; 3] = [Category::Photo, Category::Certificate, Category::General];

    pub fn policy(self) -> CategoryPolicy {
        match self {
            Category::Photo => {
                CategoryPolicy { max_size_bytes: MAX_PHOTO_SIZE, allowed_mime_types: PHOTO_TYPES }
            }
            Category::Certificate => CategoryPolicy {
                max_size_bytes: MAX_CERTIFICATE_SIZE,
                allowed_mime_types: CERTIFICATE_TYPES,
            },
            Category::General => CategoryPolicy {
                max_size_bytes: MAX_GENERAL_SIZE,
                allowed_mime_types: GENERAL_TYPES,
            },
        }
    }

    /// Word used in client-facing policy messages.
    pub fn label(self) -> &'static str {
        match self {
            Category::Photo => "photo",
            Category::Certificate => "certificate",
            Category::General => "file",
        }
    }
}

/// A file as received from the transport, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub content: Vec<u8>,
}

impl UploadPayload {
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }
}

/// New file metadata to insert into the store
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_id: String,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
}

/// Read-only engine configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub base_url: String,
}

impl UploadConfig {
    pub fn new(upload_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self { upload_dir: upload_dir.into(), base_url: base_url.trim_end_matches('/').to_string() }
    }
}
