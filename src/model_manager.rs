use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log;
use reqwest;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Identifies the remote model artifact and its label vocabulary sidecar.
///
/// The `name` keys the on-disk cache directory; the URLs are fixed remote
/// locations. Hashes are optional: `None` skips integrity verification for
/// that file, `Some` makes a mismatch fatal.
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
    pub model_hash: Option<String>,
    pub labels_hash: Option<String>,
}

/// Downloads and caches model artifacts on local disk.
///
/// The download is a one-time, idempotent operation: once the files for a
/// given (name, cache dir) pair exist and verify, subsequent calls are no-ops.
/// A process-wide lock serialises concurrent download attempts.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("LABELKIOSK_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("labelkiosk").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("labelkiosk").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("labelkiosk").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("model.onnx")
    }

    pub fn labels_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("labels.json")
    }

    pub fn is_downloaded(&self, name: &str) -> bool {
        let model_path = self.model_path(name);
        let labels_path = self.labels_path(name);
        log::info!("Checking if model is downloaded:");
        log::info!(
            "  Model path: {:?} (exists: {})",
            model_path,
            model_path.exists()
        );
        log::info!(
            "  Labels path: {:?} (exists: {})",
            labels_path,
            labels_path.exists()
        );
        model_path.exists() && labels_path.exists()
    }

    pub async fn download(&self, source: &ModelSource) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&source.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.model_path(&source.name);
        let model_result = self
            .fetch_if_needed(&source.model_url, &model_path, source.model_hash.as_deref(), "model")
            .await;

        let labels_path = self.labels_path(&source.name);
        let labels_result = self
            .fetch_if_needed(
                &source.labels_url,
                &labels_path,
                source.labels_hash.as_deref(),
                "labels",
            )
            .await;

        match (model_result, labels_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and labels ready to use");
                Ok(())
            }
            (Err(e), _) => {
                log::error!("Failed to set up model file: {}", e);
                // Cleanup on failure
                let _ = self.remove_download(&source.name);
                Err(e)
            }
            (_, Err(e)) => {
                log::error!("Failed to set up labels file: {}", e);
                // Cleanup on failure
                let _ = self.remove_download(&source.name);
                Err(e)
            }
        }
    }

    async fn fetch_if_needed(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path, expected_hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
        } else {
            log::info!("{} file does not exist, downloading...", file_type);
        }
        self.download_and_verify_file(url, path, expected_hash, file_type)
            .await
    }

    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let expected_hash = match expected_hash {
            // Without a pinned hash a present, readable file is taken as-is.
            None => return Ok(path.exists()),
            Some(hash) => hash,
        };
        log::info!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::info!("Calculated hash: {}", hash);
        log::info!("Expected hash:   {}", expected_hash);
        Ok(hash == expected_hash)
    }

    pub fn verify(&self, source: &ModelSource) -> Result<bool, ModelError> {
        let model_path = self.model_path(&source.name);
        let labels_path = self.labels_path(&source.name);

        if !model_path.exists() || !labels_path.exists() {
            log::info!("One or both files do not exist");
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, source.model_hash.as_deref())?;
        let labels_ok = self.verify_file(&labels_path, source.labels_hash.as_deref())?;

        log::info!("Verification results:");
        log::info!("  Model hash verification: {}", model_ok);
        log::info!("  Labels hash verification: {}", labels_ok);

        Ok(model_ok && labels_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        log::info!("Download response status: {}", response.status());
        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            let hash = format!("{:x}", hasher.finalize());
            log::info!("Calculated hash: {}", hash);

            if hash != expected {
                log::error!(
                    "{} hash mismatch: expected {}, got {}",
                    file_type,
                    expected,
                    hash
                );
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        log::info!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(path, bytes)?;

        // Verify after writing
        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        let model_path = self.model_path(name);
        let labels_path = self.labels_path(name);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if labels_path.exists() {
            fs::remove_file(&labels_path)?;
        }
        Ok(())
    }

    /// Ensures that the model artifact is downloaded and verified.
    /// If the files don't exist, they will be downloaded.
    /// If verification fails, they will be re-downloaded.
    pub async fn ensure_downloaded(&self, source: &ModelSource) -> Result<(), ModelError> {
        log::info!("Checking if model '{}' is downloaded...", source.name);
        if !self.is_downloaded(&source.name) {
            log::info!("Model not found, downloading...");
            self.download(source).await?;
        } else if !self.verify(source)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&source.name)?;
            self.download(source).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}
