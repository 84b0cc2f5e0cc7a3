//! Post-processing checks on mirrored files.
//!
//! Plain copies must be byte identical to their source. Optimized images must
//! still decode to the same dimensions and the same pixels.

use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::path::Path;
use tracing::{debug, warn};

pub struct Validator;

impl Validator {
    /// Compare SHA-256 of source and destination
    pub async fn verify_copy(source: &Path, destination: &Path) -> anyhow::Result<()> {
        let expected = FileManager::sha256(source).await?;
        let actual = FileManager::sha256(destination).await?;

        if expected != actual {
            return Err(OptimizeError::Verification {
                path: destination.to_path_buf(),
                reason: format!("content hash {} differs from source {}", actual, expected),
            }
            .into());
        }

        debug!("Copy verified: {}", destination.display());
        Ok(())
    }

    /// Decode source and optimized destination and compare dimensions and pixels.
    ///
    /// Blocking: decoding is CPU bound, async callers go through `spawn_blocking`.
    pub fn verify_image(source: &Path, destination: &Path) -> Result<(), OptimizeError> {
        let expected = match Self::decode(source) {
            Ok(image) => image,
            Err(e) => {
                warn!("Source {} is not a decodable image, skipping image check: {}", source.display(), e);
                return Ok(());
            }
        };

        let actual = Self::decode(destination).map_err(|e| OptimizeError::Verification {
            path: destination.to_path_buf(),
            reason: format!("optimized image does not decode: {}", e),
        })?;

        let (width, height) = (actual.width(), actual.height());
        if (width, height) != (expected.width(), expected.height()) {
            return Err(OptimizeError::Verification {
                path: destination.to_path_buf(),
                reason: format!(
                    "dimensions changed from {}x{} to {}x{}",
                    expected.width(),
                    expected.height(),
                    width,
                    height
                ),
            });
        }

        // Lossless means the same RGBA samples, whatever the color type on disk
        if expected.to_rgba8() != actual.to_rgba8() {
            return Err(OptimizeError::Verification {
                path: destination.to_path_buf(),
                reason: format!("pixel content changed ({}x{})", width, height),
            });
        }

        debug!("Image verified: {} ({}x{})", destination.display(), width, height);
        Ok(())
    }

    fn decode(path: &Path) -> Result<DynamicImage, OptimizeError> {
        Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
    }
}
