use super::ImageProcessingConfig;
use crate::error::{AppError, AppResult};

/// Uploaded image validator
pub struct ImageValidator {
    config: ImageProcessingConfig,
}

impl ImageValidator {
    /// Create a new image validator
    pub fn new(config: &ImageProcessingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Validate an uploaded image payload
    pub fn validate_image(&self, image_data: &[u8], filename: &str) -> AppResult<()> {
        // 1. Check payload size
        self.validate_image_size(image_data)?;

        // 2. Check the filename
        self.validate_filename(filename)?;

        Ok(())
    }

    /// Validate payload size
    fn validate_image_size(&self, image_data: &[u8]) -> AppResult<()> {
        let image_size = image_data.len() as u64;

        if image_size == 0 {
            return Err(AppError::validation("image payload must not be empty"));
        }

        if image_size > self.config.max_image_size {
            return Err(AppError::FileTooLarge {
                max_size: self.config.max_image_size,
            });
        }

        Ok(())
    }

    /// Validate the upload filename
    fn validate_filename(&self, filename: &str) -> AppResult<()> {
        if filename.is_empty() {
            return Err(AppError::validation("filename must not be empty"));
        }

        if filename.len() > 255 {
            return Err(AppError::validation(
                "filename too long, 255 characters maximum",
            ));
        }

        let dangerous_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
        if filename.chars().any(|c| dangerous_chars.contains(&c)) {
            return Err(AppError::validation("filename contains illegal characters"));
        }

        Ok(())
    }

    /// Sniff the image type from magic bytes and check it against the
    /// allow-list. Returns the MIME type and the canonical extension.
    ///
    /// The declared multipart content type is ignored on purpose; camera
    /// uploads from the field routinely mislabel it.
    pub fn sniff_image_type(&self, image_data: &[u8]) -> AppResult<(String, String)> {
        let kind = infer::get(image_data).ok_or_else(|| {
            AppError::validation("payload is not a recognized image format")
        })?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(AppError::unsupported_file_type(kind.mime_type()));
        }

        let mime_type = kind.mime_type().to_string();
        if !self.config.allowed_mime_types.contains(&mime_type) {
            return Err(AppError::unsupported_file_type(mime_type));
        }

        Ok((mime_type, kind.extension().to_string()))
    }
}
