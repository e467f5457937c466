use baitech_core::constants::{LOCAL_IMAGE_EXTENSIONS, REMOTE_IMAGE_EXTENSIONS};
use std::path::Path;

/// Validation errors for uploaded images
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file type: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Whether `filename` carries an extension the local pipeline accepts.
///
/// Case-insensitive; `x.PNG` is allowed, `x.exe` and `noextension` are not.
pub fn is_allowed_file(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| LOCAL_IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Logical identity of an upload: the final path component without its extension.
///
/// Both `/` and `\` separate components, so a Windows client path such as
/// `C:\Users\me\photo.jpg` yields `photo`.
pub fn file_stem(filename: &str) -> Result<String, ValidationError> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.contains("..") && !s.starts_with('.'))
        .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

    Ok(stem.to_string())
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Image upload validator
///
/// Checks payload size and extension before anything is decoded, so a
/// rejected upload never produces artifacts.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl ImageValidator {
    pub fn new(max_file_size: usize, allowed_extensions: &[&str]) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Validator for the local optimization pipeline.
    pub fn local(max_file_size: usize) -> Self {
        Self::new(max_file_size, LOCAL_IMAGE_EXTENSIONS)
    }

    /// Validator for remote CDN uploads (also accepts GIF).
    pub fn remote(max_file_size: usize) -> Self {
        Self::new(max_file_size, REMOTE_IMAGE_EXTENSIONS)
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = extension_of(filename)
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate extension, stem and size; returns the stem.
    pub fn validate_all(&self, filename: &str, file_size: usize) -> Result<String, ValidationError> {
        self.validate_extension(filename)?;
        let stem = file_stem(filename)?;
        self.validate_file_size(file_size)?;
        Ok(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    #[test]
    fn test_is_allowed_file() {
        assert!(is_allowed_file("x.PNG"));
        assert!(is_allowed_file("photo.jpeg"));
        assert!(is_allowed_file("photo.avif"));
        assert!(!is_allowed_file("x.exe"));
        assert!(!is_allowed_file("animation.gif"));
        assert!(!is_allowed_file("noextension"));
    }

    #[test]
    fn test_remote_accepts_gif() {
        let validator = ImageValidator::remote(MB);
        assert!(validator.validate_extension("animation.GIF").is_ok());
        assert!(ImageValidator::local(MB)
            .validate_extension("animation.gif")
            .is_err());
    }

    #[test]
    fn test_validate_file_size() {
        let validator = ImageValidator::local(MB);
        assert!(validator.validate_file_size(512 * 1024).is_ok());
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
        assert!(matches!(
            validator.validate_file_size(2 * MB),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_extension_invalid() {
        let validator = ImageValidator::local(MB);
        let err = validator.validate_extension("payload.exe").unwrap_err();
        assert!(err.to_string().contains("Invalid file type"));
        assert!(matches!(
            validator.validate_extension("noextension"),
            Err(ValidationError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("widget.jpg").unwrap(), "widget");
        assert_eq!(file_stem("uploads/nested/logo.PNG").unwrap(), "logo");
        assert_eq!(file_stem("../../escape.png").unwrap(), "escape");
        assert_eq!(file_stem(r"C:\Users\me\photo.jpg").unwrap(), "photo");
        assert_eq!(file_stem(r"..\..\escape.png").unwrap(), "escape");
        assert!(file_stem(r"uploads\.jpg").is_err());
        assert!(file_stem(".jpg").is_err());
    }

    #[test]
    fn test_validate_all_returns_stem() {
        let validator = ImageValidator::local(MB);
        assert_eq!(validator.validate_all("widget.jpg", 100).unwrap(), "widget");
        assert!(validator.validate_all("widget.jpg", 0).is_err());
        assert!(validator.validate_all("widget.bmp", 100).is_err());
    }
}
