use libris_core::config::ConfigError;
use libris_core::database::DbError;
use libris_core::forms::FieldErrors;
use libris_core::upload::{AuthenticationError, UploadError};
use std::io;
use std::path::PathBuf;

/// The Libris CLI error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Uploads were requested but the media host is not configured
    #[error("Uploads are not configured: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// Input that did not pass the form's validation
    #[error("Invalid input: {0}")]
    Invalid(#[from] FieldErrors),

    #[error("Failed to read {}: {source}", path.display())]
    File { path: PathBuf, source: io::Error },

    #[error("Failed to set up the signing client: {0}")]
    Authenticator(#[from] AuthenticationError),

    #[error("Failed to set up the upload client: {0}")]
    Host(#[from] UploadError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// Uploading a selected file did not produce an asset
    #[error("Upload of {} did not complete", .0.display())]
    Upload(PathBuf),

    /// The operation was refused, the reason has already been reported
    #[error("{0}")]
    Refused(String),
}
