use thiserror::Error;

/// Default upper bound on an uploaded screenshot (10 MiB).
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("There is no image in the request")]
    Missing,
    #[error("The uploaded image is empty")]
    Empty,
    #[error("The uploaded image is {size} bytes, exceeding the maximum of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("Image type '{0}' is not supported")]
    UnsupportedType(String),
}

/// An image file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), data }
    }

    /// Lower-cased extension of the file name, without the dot.
    pub fn extension(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => String::new(),
        }
    }

    /// Check size limits and image type, returning the content type.
    pub fn validate(&self, max_size: usize) -> Result<&'static str, UploadError> {
        if self.data.is_empty() {
            return Err(UploadError::Empty);
        }
        if self.data.len() > max_size {
            return Err(UploadError::TooLarge { size: self.data.len(), max: max_size });
        }
        let ext = self.extension();
        image_content_type(&ext).ok_or(UploadError::UnsupportedType(ext))
    }
}

/// Content type for a supported image extension.
pub fn image_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
