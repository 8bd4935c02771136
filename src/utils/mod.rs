use uuid::Uuid;

/// Extension of the last path element, leading dot included.
///
/// `report.tar.gz` yields `.gz`, `.env` yields `.env` and a name without a
/// dot yields an empty string.
pub fn file_extension(filename: &str) -> &str {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// Random on-disk name carrying the original extension.
pub fn generate_stored_name(original_filename: &str) -> String {
    format!("{}{}", Uuid::new_v4(), file_extension(original_filename))
}
