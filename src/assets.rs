use crate::config::EngineConfig;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use std::path::{Path, PathBuf};

/// Still-image formats accepted as scene sources.
const IMAGE_FORMATS: [image::ImageFormat; 4] = [
    image::ImageFormat::Png,
    image::ImageFormat::Jpeg,
    image::ImageFormat::WebP,
    image::ImageFormat::Bmp,
];

/// Audio containers accepted as narration.
const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "m4a", "aac", "ogg", "flac"];

/// Assets that survived validation for one `create_video` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedAssetSet {
    /// Scene images in their original relative order; never empty.
    pub images: Vec<PathBuf>,
    pub audio: Option<PathBuf>,
}

/// Why a candidate asset was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    UnsupportedType,
    Missing,
    TooSmall { bytes: u64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnsupportedType => f.write_str("unsupported file type"),
            Rejection::Missing => f.write_str("file missing or unreadable"),
            Rejection::TooSmall { bytes } => write!(f, "file too small ({bytes} bytes)"),
        }
    }
}

/// Size-and-extension filter for upstream generator output.
///
/// A file is accepted when its size strictly exceeds the floor.
///
/// Pixels are never decoded: zero-byte and truncated downloads are caught by the size floor.
#[derive(Clone, Copy, Debug)]
pub struct AssetValidator {
    min_bytes: u64,
}

impl AssetValidator {
    pub fn new(min_bytes: u64) -> Self {
        Self { min_bytes }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.min_asset_bytes)
    }

    #[tracing::instrument(skip_all, fields(images = image_paths.len(), audio = audio_path.is_some()))]
    pub fn validate(
        &self,
        image_paths: &[PathBuf],
        audio_path: Option<&Path>,
    ) -> AssemblyResult<ValidatedAssetSet> {
        let mut images = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            match self.check_image(path) {
                Ok(()) => images.push(path.clone()),
                Err(reason) => {
                    tracing::debug!(path = %path.display(), %reason, "rejected image");
                }
            }
        }

        if images.is_empty() {
            return Err(AssemblyError::asset("no valid images"));
        }

        let audio = match audio_path {
            Some(path) => match self.check_audio(path) {
                Ok(()) => Some(path.to_path_buf()),
                Err(reason) => {
                    tracing::warn!(
                        path = %path.display(),
                        %reason,
                        "narration rejected, rendering without audio"
                    );
                    None
                }
            },
            None => None,
        };

        tracing::info!(
            accepted = images.len(),
            rejected = image_paths.len() - images.len(),
            has_audio = audio.is_some(),
            "assets validated"
        );
        Ok(ValidatedAssetSet { images, audio })
    }

    pub fn check_image(&self, path: &Path) -> Result<(), Rejection> {
        let supported = image::ImageFormat::from_path(path)
            .map(|f| IMAGE_FORMATS.contains(&f))
            .unwrap_or(false);
        if !supported {
            return Err(Rejection::UnsupportedType);
        }
        self.check_size(path)
    }

    pub fn check_audio(&self, path: &Path) -> Result<(), Rejection> {
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !supported {
            return Err(Rejection::UnsupportedType);
        }
        self.check_size(path)
    }

    fn check_size(&self, path: &Path) -> Result<(), Rejection> {
        let meta = std::fs::metadata(path).map_err(|_| Rejection::Missing)?;
        if !meta.is_file() {
            return Err(Rejection::Missing);
        }
        if meta.len() <= self.min_bytes {
            return Err(Rejection::TooSmall { bytes: meta.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/assets.rs"]
mod tests;
