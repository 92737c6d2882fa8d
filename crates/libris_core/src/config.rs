//! Application configuration
//!
//! All endpoints and keys are collected once into an [`AppConfig`] which is then handed to the
//! components that need it. Nothing in this crate reads the environment on its own.
use core::time::Duration;
use std::env;

/// ImageKit's upload API, used when no other upload endpoint is configured.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://upload.imagekit.io/api/v1/files/upload";
/// File name of the catalog database when no path is given on the command line or in
/// `LIBRIS_DATABASE_PATH`.
pub const DEFAULT_DATABASE_NAME: &str = "library.db";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;

const API_ENDPOINT_VAR: &str = "LIBRIS_API_ENDPOINT";
const PUBLIC_KEY_VAR: &str = "LIBRIS_IMAGEKIT_PUBLIC_KEY";
const URL_ENDPOINT_VAR: &str = "LIBRIS_IMAGEKIT_URL_ENDPOINT";
const UPLOAD_ENDPOINT_VAR: &str = "LIBRIS_IMAGEKIT_UPLOAD_ENDPOINT";
const UPLOAD_TIMEOUT_VAR: &str = "LIBRIS_UPLOAD_TIMEOUT_SECS";

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings of the media host the upload widget talks to.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageKitConfig {
    /// Public key sent along with every signed upload
    pub public_key: String,
    /// Base URL under which uploaded assets are served
    pub url_endpoint: String,
    /// URL of the upload API
    pub upload_endpoint: String,
}

impl ImageKitConfig {
    #[must_use]
    #[inline]
    pub fn new(public_key: impl Into<String>, url_endpoint: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            url_endpoint: url_endpoint.into(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_owned(),
        }
    }

    #[must_use]
    #[inline]
    pub fn with_upload_endpoint(mut self, upload_endpoint: impl Into<String>) -> Self {
        self.upload_endpoint = upload_endpoint.into();
        self
    }

    /// Public URL of an uploaded asset, given the path the host returned for it.
    #[must_use]
    #[inline]
    pub fn asset_url(&self, file_path: &str) -> String {
        format!(
            "{}/{}",
            self.url_endpoint.trim_end_matches('/'),
            file_path.trim_start_matches('/')
        )
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the application backend, which hosts the upload signing endpoint
    pub api_endpoint: String,
    pub imagekit: ImageKitConfig,
    /// Upper bound for a single upload request, from connect to last response byte
    pub upload_timeout: Duration,
}

impl AppConfig {
    #[must_use]
    #[inline]
    pub fn new(api_endpoint: impl Into<String>, imagekit: ImageKitConfig) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            imagekit,
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }

    #[must_use]
    #[inline]
    pub const fn with_upload_timeout(mut self, upload_timeout: Duration) -> Self {
        self.upload_timeout = upload_timeout;
        self
    }

    /// Read the configuration from the process environment. Call `dotenvy::dotenv()` beforehand
    /// if a `.env` file should be taken into account.
    /// # Errors
    /// Fails if a required variable is missing or a value cannot be parsed.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key-value source.
    /// # Errors
    /// Fails if a required key is missing or a value cannot be parsed.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let mut imagekit = ImageKitConfig::new(require(PUBLIC_KEY_VAR)?, require(URL_ENDPOINT_VAR)?);
        if let Some(upload_endpoint) = lookup(UPLOAD_ENDPOINT_VAR) {
            imagekit = imagekit.with_upload_endpoint(upload_endpoint);
        }

        let mut config = Self::new(require(API_ENDPOINT_VAR)?, imagekit);
        if let Some(raw) = lookup(UPLOAD_TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|err| ConfigError::Invalid {
                    name: UPLOAD_TIMEOUT_VAR,
                    reason: err.to_string(),
                })?;
            config = config.with_upload_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// URL of the endpoint handing out upload signatures
    #[must_use]
    #[inline]
    pub fn auth_url(&self) -> String {
        format!(
            "{}/api/auth/imagekit",
            self.api_endpoint.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_required_values_with_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LIBRIS_API_ENDPOINT", "http://localhost:3000/"),
            ("LIBRIS_IMAGEKIT_PUBLIC_KEY", "public_abc"),
            ("LIBRIS_IMAGEKIT_URL_ENDPOINT", "https://ik.imagekit.io/libris"),
        ]))
        .unwrap();

        assert_eq!(config.auth_url(), "http://localhost:3000/api/auth/imagekit");
        assert_eq!(config.imagekit.upload_endpoint, DEFAULT_UPLOAD_ENDPOINT);
        assert_eq!(config.upload_timeout, Duration::from_secs(60));
    }

    #[test]
    fn optional_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LIBRIS_API_ENDPOINT", "http://localhost:3000"),
            ("LIBRIS_IMAGEKIT_PUBLIC_KEY", "public_abc"),
            ("LIBRIS_IMAGEKIT_URL_ENDPOINT", "https://ik.imagekit.io/libris"),
            ("LIBRIS_IMAGEKIT_UPLOAD_ENDPOINT", "http://127.0.0.1:9000/upload"),
            ("LIBRIS_UPLOAD_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.imagekit.upload_endpoint, "http://127.0.0.1:9000/upload");
        assert_eq!(config.upload_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_or_blank_values_are_reported() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("LIBRIS_API_ENDPOINT", "  "),
            ("LIBRIS_IMAGEKIT_PUBLIC_KEY", "public_abc"),
            ("LIBRIS_IMAGEKIT_URL_ENDPOINT", "https://ik.imagekit.io/libris"),
        ]));
        assert_eq!(result, Err(ConfigError::Missing("LIBRIS_API_ENDPOINT")));
    }

    #[test]
    fn unparsable_timeout_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("LIBRIS_API_ENDPOINT", "http://localhost:3000"),
            ("LIBRIS_IMAGEKIT_PUBLIC_KEY", "public_abc"),
            ("LIBRIS_IMAGEKIT_URL_ENDPOINT", "https://ik.imagekit.io/libris"),
            ("LIBRIS_UPLOAD_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "LIBRIS_UPLOAD_TIMEOUT_SECS",
                ..
            })
        ));
    }

    #[test]
    fn asset_url_joins_endpoint_and_path() {
        let imagekit = ImageKitConfig::new("key", "https://ik.imagekit.io/libris/");
        assert_eq!(
            imagekit.asset_url("/books/covers/dune.png"),
            "https://ik.imagekit.io/libris/books/covers/dune.png"
        );
    }
}
