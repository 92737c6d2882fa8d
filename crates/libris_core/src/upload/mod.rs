//! Signed uploads
//!
//! Files go straight from the client to the media host. The application backend only hands out a
//! short-lived signature for each upload ([`auth`]), the host stores the file and returns its asset
//! path ([`host`]), and the [`widget`] ties both together for a single form field.
pub mod auth;
pub mod host;
pub mod widget;

use core::fmt;
use std::io;
use std::path::Path;

pub use auth::{AuthenticationError, AuthenticationParameters, Authenticator, HttpAuthenticator};
pub use host::{ImageKitHost, MediaHost, UploadError, UploadEvent, UploadRequest, UploadResult};
pub use widget::{UploadState, UploadWidget};

pub const ONE_MB: u64 = 1024 * 1024;
pub const TWENTY_MB: u64 = 20 * ONE_MB;
pub const FIFTY_MB: u64 = 50 * ONE_MB;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Largest accepted file size in bytes
    #[must_use]
    #[inline]
    pub const fn max_bytes(self) -> u64 {
        match self {
            Self::Image => TWENTY_MB,
            Self::Video => FIFTY_MB,
        }
    }

    /// Whether a file of `size` bytes may be uploaded as this kind
    #[must_use]
    #[inline]
    pub const fn accepts_size(self, size: u64) -> bool {
        size <= self.max_bytes()
    }

    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    #[must_use]
    #[inline]
    pub const fn too_large_message(self) -> &'static str {
        match self {
            Self::Image => "Please upload a file smaller than 20MB.",
            Self::Video => "Please upload a file smaller than 50MB.",
        }
    }
}

impl fmt::Display for MediaKind {
    #[inline]
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A file picked by the user
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    #[must_use]
    #[inline]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name.
    /// # Errors
    /// Fails if the file cannot be read.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| String::from("upload"), |name| name.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }

    /// Size of a file on disk, so that it can be checked before being read.
    /// # Errors
    /// Fails if the file's metadata cannot be read.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn size_on_disk(path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    #[must_use]
    #[inline]
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_ceilings_are_inclusive() {
        assert!(MediaKind::Image.accepts_size(0));
        assert!(MediaKind::Image.accepts_size(20 * 1024 * 1024));
        assert!(!MediaKind::Image.accepts_size(20 * 1024 * 1024 + 1));
        assert!(MediaKind::Video.accepts_size(50 * 1024 * 1024));
        assert!(!MediaKind::Video.accepts_size(50 * 1024 * 1024 + 1));
    }

    #[test]
    fn size_ceilings_over_a_range_of_sizes() {
        for size in (0..=60 * ONE_MB).step_by(usize::try_from(ONE_MB / 4).unwrap_or(1)) {
            assert_eq!(MediaKind::Image.accepts_size(size), size <= 20 * 1024 * 1024);
            assert_eq!(MediaKind::Video.accepts_size(size), size <= 50 * 1024 * 1024);
        }
    }

    #[tokio::test]
    async fn reading_a_missing_file_fails() {
        let result = SelectedFile::from_path(Path::new("/definitely/not/here.png")).await;
        assert!(result.is_err());
        let size = SelectedFile::size_on_disk(Path::new("/definitely/not/here.png")).await;
        assert!(size.is_err());
    }
}
