//! Editor configuration from environment variables.
//!
//! | Variable              | Meaning                                    | Default        |
//! |-----------------------|--------------------------------------------|----------------|
//! | `POSTER_BACKEND_URL`  | Base URL of the publicity backend          | local backend  |
//! | `POSTER_DATA_DIR`     | Local backend storage directory            | in memory      |
//! | `POSTER_DOWNLOAD_DIR` | Where exported JPEGs are written           | `.`            |
//! | `POSTER_OVERSAMPLE`   | Export supersampling factor (1 to 4)       | `2`            |
//! | `POSTER_JPEG_QUALITY` | JPEG quality (1 to 100)                    | `92`           |
//! | `POSTER_MAX_RETRIES`  | Attempts for backend reads                 | `4`            |
//! | `POSTER_WRITE_RETRIES`| Attempts for layout saves and uploads      | `2`            |

use std::path::PathBuf;
use std::sync::Arc;

use poster_renderer::ExportConfig;

use crate::backend::{Backend, BackendResult};
use crate::http::{HttpBackend, RetryPolicy};
use crate::local::LocalBackend;

/// Runtime configuration of the editor.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Base URL of the publicity backend; `None` selects the local backend.
    pub backend_url: Option<String>,
    /// Storage directory of the local backend.
    pub data_dir: Option<PathBuf>,
    /// Directory exported files are written to.
    pub download_dir: PathBuf,
    /// Export settings.
    pub export: ExportConfig,
    /// Retry policy for backend requests.
    pub retry: RetryPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            data_dir: None,
            download_dir: PathBuf::from("."),
            export: ExportConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EditorConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unparsable values fall back to
    /// their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let export = ExportConfig {
            oversample: non_empty("POSTER_OVERSAMPLE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.export.oversample),
            jpeg_quality: non_empty("POSTER_JPEG_QUALITY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.export.jpeg_quality),
            ..defaults.export
        };
        let retry = RetryPolicy {
            read_attempts: non_empty("POSTER_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.retry.read_attempts),
            write_attempts: non_empty("POSTER_WRITE_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.retry.write_attempts),
            ..defaults.retry
        };

        Self {
            backend_url: non_empty("POSTER_BACKEND_URL"),
            data_dir: non_empty("POSTER_DATA_DIR").map(PathBuf::from),
            download_dir: non_empty("POSTER_DOWNLOAD_DIR")
                .map_or(defaults.download_dir, PathBuf::from),
            export,
            retry,
        }
    }
}

/// Build the backend selected by `config`.
///
/// # Errors
///
/// Returns an error if the backend URL is invalid or the local data directory
/// cannot be prepared.
pub fn build_backend(config: &EditorConfig) -> BackendResult<Arc<dyn Backend>> {
    if let Some(url) = &config.backend_url {
        tracing::info!("Using publicity backend at {url}");
        return Ok(Arc::new(HttpBackend::with_retry_policy(url, config.retry)?));
    }
    match &config.data_dir {
        Some(dir) => {
            tracing::info!("Using local backend in {}", dir.display());
            Ok(Arc::new(LocalBackend::with_data_dir(dir)?))
        }
        None => {
            tracing::info!("Using in-memory local backend");
            Ok(Arc::new(LocalBackend::new()))
        }
    }
}
