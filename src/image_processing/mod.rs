pub mod hasher;
pub mod validator;

pub use hasher::ImageHasher;
pub use validator::ImageValidator;

use crate::error::AppResult;
use serde::{Deserialize, Serialize};

/// Outcome of ingesting one uploaded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    /// Image basic information
    pub info: ImageInfo,
    /// SHA256 of the image bytes, used as the storage key
    pub sha256: String,
}

/// Image basic information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Original upload filename
    pub filename: String,
    /// Image size in bytes
    pub size: u64,
    /// Sniffed MIME type (from magic bytes, not the declared type)
    pub mime_type: String,
    /// File extension matching the sniffed type
    pub extension: String,
}

/// Image processing configuration
#[derive(Debug, Clone)]
pub struct ImageProcessingConfig {
    /// Maximum image size in bytes
    pub max_image_size: u64,
    /// Accepted image MIME types
    pub allowed_mime_types: Vec<String>,
}

impl Default for ImageProcessingConfig {
    fn default() -> Self {
        Self {
            max_image_size: 10 * 1024 * 1024, // 10MB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "image/gif".to_string(),
                "image/bmp".to_string(),
                "image/tiff".to_string(),
            ],
        }
    }
}

/// Image ingestion pipeline: validate, sniff the type, hash
pub struct ImageProcessor {
    config: ImageProcessingConfig,
    hasher: ImageHasher,
    validator: ImageValidator,
}

impl std::fmt::Debug for ImageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProcessor")
            .field("config", &self.config)
            .finish()
    }
}

impl ImageProcessor {
    /// Create a new image processor
    pub fn new(config: ImageProcessingConfig) -> Self {
        Self {
            hasher: ImageHasher::new(),
            validator: ImageValidator::new(&config),
            config,
        }
    }

    /// Validate and analyze a single uploaded image
    pub async fn process_image(
        &self,
        image_data: &[u8],
        filename: &str,
    ) -> AppResult<ProcessedImage> {
        // 1. Validate payload and filename
        self.validator.validate_image(image_data, filename)?;

        // 2. Sniff the actual image type from magic bytes
        let (mime_type, extension) = self.validator.sniff_image_type(image_data)?;

        // 3. Compute the storage key hash
        let sha256 = self.hasher.calculate_sha256(image_data).await?;

        Ok(ProcessedImage {
            info: ImageInfo {
                filename: filename.to_string(),
                size: image_data.len() as u64,
                mime_type,
                extension,
            },
            sha256,
        })
    }

    /// Configuration reference
    pub fn config(&self) -> &ImageProcessingConfig {
        &self.config
    }
}
