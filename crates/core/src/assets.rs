//! Image reference resolution.
//!
//! Turns an `<img src>` value into a readable local file: inline data URIs are
//! decoded into temporary files next to the input document, relative paths are
//! looked up in a few conventional asset directories, and remote URLs are skipped.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Matches `data:image/<subtype>;base64,<payload>`.
static DATA_URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^data:image/([A-Za-z0-9.+-]+);base64,(.+)$").unwrap()
});

/// Directories searched (relative to the base dir) for a bare file name.
const FALLBACK_DIRS: &[&str] = &["assets", "images"];

/// Prefix of decoded data-URI files.
const TEMP_IMAGE_PREFIX: &str = "_temp_image_";

/// Resolves image references relative to the input document's directory.
///
/// Temporary files written for data URIs are removed by [`cleanup`](Self::cleanup)
/// or when the resolver is dropped.
#[derive(Debug)]
pub struct AssetResolver {
    base_dir: PathBuf,
    temp_files: Vec<PathBuf>,
    /// Next candidate number for a temporary file name.
    next_temp: usize,
}

impl AssetResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            temp_files: Vec::new(),
            next_temp: 0,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Temporary files written so far and not yet cleaned up.
    pub fn temp_files(&self) -> &[PathBuf] {
        &self.temp_files
    }

    /// Resolve `src` to an existing local file.
    pub fn resolve(&mut self, src: &str) -> Option<PathBuf> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }

        if src.starts_with("data:") {
            return match self.write_data_uri(src) {
                Ok(path) => Some(path),
                Err(e) => {
                    log::warn!("Could not decode inline image: {}", e);
                    None
                }
            };
        }

        if src.starts_with("http://") || src.starts_with("https://") {
            log::info!("Skipping remote image (download not supported): {}", src);
            return None;
        }

        let found = self.find_local(src);
        if found.is_none() {
            log::debug!("Image not found: {} (base {})", src, self.base_dir.display());
        }
        found
    }

    /// Delete all temporary files, ignoring errors.
    pub fn cleanup(&mut self) {
        for path in self.temp_files.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed temporary image {}", path.display()),
                Err(e) => log::debug!("Could not remove {}: {}", path.display(), e),
            }
        }
    }

    fn write_data_uri(&mut self, uri: &str) -> Result<PathBuf> {
        let (extension, bytes) = decode_data_uri(uri)?;

        // Only create fresh files; cleanup removes every tracked path.
        let (path, mut file) = loop {
            let file_name = format!("{}{}.{}", TEMP_IMAGE_PREFIX, self.next_temp, extension);
            let path = self.base_dir.join(file_name);
            self.next_temp += 1;

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("{} already exists, trying the next name", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        };
        if let Err(e) = file.write_all(&bytes) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        log::debug!("Wrote inline image ({} bytes) to {}", bytes.len(), path.display());
        self.temp_files.push(path.clone());
        Ok(path)
    }

    fn find_local(&self, src: &str) -> Option<PathBuf> {
        let src = src
            .split(['?', '#'])
            .next()
            .unwrap_or(src)
            .trim_start_matches('/');
        if src.is_empty() {
            return None;
        }

        let mut candidates = vec![self.base_dir.join(src)];
        if let Some(stripped) = src.strip_prefix("./") {
            candidates.push(self.base_dir.join(stripped));
        }
        if let Some(name) = Path::new(src).file_name() {
            candidates.push(self.base_dir.join(name));
            for dir in FALLBACK_DIRS {
                candidates.push(self.base_dir.join(dir).join(name));
            }
        }

        candidates.into_iter().find(|path| path.is_file())
    }
}

impl Drop for AssetResolver {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Decode a base64 image data URI into a file extension and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let caps = DATA_URI_REGEX
        .captures(uri)
        .ok_or_else(|| Error::AssetError("not a base64 image data URI".to_string()))?;

    let extension = match caps[1].to_ascii_lowercase().as_str() {
        "svg+xml" => "svg".to_string(),
        "x-icon" | "vnd.microsoft.icon" => "ico".to_string(),
        other => other.to_string(),
    };

    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_ENGINE
        .decode(payload.as_bytes())
        .map_err(|e| Error::AssetError(format!("invalid base64 payload: {}", e)))?;

    if bytes.is_empty() {
        return Err(Error::AssetError("empty image payload".to_string()));
    }

    Ok((extension, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn data_uri(subtype: &str, bytes: &[u8]) -> String {
        format!("data:image/{};base64,{}", subtype, BASE64_ENGINE.encode(bytes))
    }

    #[test]
    fn test_decode_data_uri() {
        let (ext, bytes) = decode_data_uri(&data_uri("png", PNG_BYTES)).unwrap();
        assert_eq!(ext, "png");
        assert_eq!(bytes, PNG_BYTES);

        let (ext, _) = decode_data_uri(&data_uri("svg+xml", b"<svg/>")).unwrap();
        assert_eq!(ext, "svg");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
        assert!(decode_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
    }

    #[test]
    fn test_data_uri_written_and_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let mut resolver = AssetResolver::new(dir.path());

        let path = resolver.resolve(&data_uri("png", PNG_BYTES)).unwrap();
        assert_eq!(path, dir.path().join("_temp_image_0.png"));
        assert_eq!(fs::read(&path).unwrap(), PNG_BYTES);

        let second = resolver.resolve(&data_uri("jpeg", b"jpeg")).unwrap();
        assert_eq!(second, dir.path().join("_temp_image_1.jpeg"));
        assert_eq!(resolver.temp_files().len(), 2);

        resolver.cleanup();
        assert!(!path.exists());
        assert!(!second.exists());
        assert!(resolver.temp_files().is_empty());
    }

    #[test]
    fn test_existing_file_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("_temp_image_0.png");
        fs::write(&existing, b"user data").unwrap();

        let mut resolver = AssetResolver::new(dir.path());
        let path = resolver.resolve(&data_uri("png", PNG_BYTES)).unwrap();
        assert_eq!(path, dir.path().join("_temp_image_1.png"));
        assert_eq!(resolver.temp_files(), &[path.clone()]);

        resolver.cleanup();
        assert!(!path.exists());
        assert_eq!(fs::read(&existing).unwrap(), b"user data");
    }

    #[test]
    fn test_drop_removes_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = {
            let mut resolver = AssetResolver::new(dir.path());
            resolver.resolve(&data_uri("gif", b"GIF89a")).unwrap()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_malformed_data_uri_is_none() {
        let dir = TempDir::new().unwrap();
        let mut resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("data:image/png;base64,!!!"), None);
        assert!(resolver.temp_files().is_empty());
    }

    #[test]
    fn test_remote_url_is_none() {
        let dir = TempDir::new().unwrap();
        let mut resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("https://example.com/logo.png"), None);
        assert_eq!(resolver.resolve("http://example.com/logo.png"), None);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let mut resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("img.png"), None);
        assert_eq!(resolver.resolve(""), None);
    }

    #[test]
    fn test_local_path_probing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("direct.png"), PNG_BYTES).unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets").join("logo.png"), PNG_BYTES).unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images").join("chart.png"), PNG_BYTES).unwrap();

        let mut resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("direct.png"), Some(dir.path().join("direct.png")));
        assert_eq!(resolver.resolve("./direct.png"), Some(dir.path().join("./direct.png")));
        assert_eq!(resolver.resolve("/direct.png"), Some(dir.path().join("direct.png")));
        assert_eq!(
            resolver.resolve("static/img/logo.png"),
            Some(dir.path().join("assets").join("logo.png"))
        );
        assert_eq!(
            resolver.resolve("chart.png?v=2"),
            Some(dir.path().join("images").join("chart.png"))
        );
        assert!(resolver.temp_files().is_empty());
    }
}
