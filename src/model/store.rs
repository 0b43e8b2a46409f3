//! Model artifact acquisition: prefer local, else download, else fail.

use std::path::{Path, PathBuf};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::ModelStoreError;
use crate::features::FEATURE_DIM;

use super::classifier::SpamClassifier;

/// Immutable handle to a loaded classifier.
///
/// Published once into the application state and read by every request for
/// the rest of the process lifetime. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    /// The validated classifier.
    classifier: SpamClassifier,
    /// When the artifact was loaded.
    loaded_at: OffsetDateTime,
    /// Filesystem path the artifact was loaded from.
    source: PathBuf,
}

impl ModelHandle {
    /// Wrap a validated classifier.
    pub fn new(classifier: SpamClassifier, source: PathBuf) -> Self {
        Self {
            classifier,
            loaded_at: OffsetDateTime::now_utc(),
            source,
        }
    }

    /// The loaded classifier.
    pub fn classifier(&self) -> &SpamClassifier {
        &self.classifier
    }

    /// When the artifact was loaded.
    pub fn loaded_at(&self) -> OffsetDateTime {
        self.loaded_at
    }

    /// Path the artifact was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Resolves the model artifact at startup.
///
/// Resolution order: existing local artifact, then download from `MODEL_URL`,
/// then a fatal `NoSource` error. The local copy always wins and is never
/// overwritten, even when a URL is configured.
#[derive(Debug, Clone)]
pub struct ModelStore {
    /// Directory holding the artifact.
    dir: PathBuf,
    /// Full artifact path inside `dir`.
    path: PathBuf,
    /// Optional download source.
    url: Option<String>,
    /// HTTP client for the one-time download.
    http: reqwest::Client,
}

impl ModelStore {
    /// Create a store from config.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_millis(2_000))
            .build()
            .expect("failed to create HTTP client");

        Self {
            dir: config.model_dir.clone(),
            path: config.model_path(),
            url: config.model_url.clone(),
            http,
        }
    }

    /// Resolve the artifact and return a ready-to-serve handle.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn ensure_ready(&self) -> Result<ModelHandle, ModelStoreError> {
        std::fs::create_dir_all(&self.dir)?;

        if self.path.exists() {
            info!("Loading model from local artifact");
            return self.load_local();
        }

        match &self.url {
            Some(url) => {
                info!(url = %url, "No local artifact, downloading model");
                self.download(url).await?;
                self.load_local()
            }
            None => Err(ModelStoreError::NoSource {
                path: self.path.clone(),
            }),
        }
    }

    /// Fetch the artifact and write it to the local path.
    async fn download(&self, url: &str) -> Result<(), ModelStoreError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ModelStoreError::Download {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ModelStoreError::DownloadStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ModelStoreError::Download {
                url: url.to_string(),
                source,
            })?;

        std::fs::write(&self.path, &bytes)?;
        info!(bytes = bytes.len(), "Model artifact downloaded");
        Ok(())
    }

    /// Read, parse, and structurally validate the local artifact.
    fn load_local(&self) -> Result<ModelHandle, ModelStoreError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ModelStoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let classifier: SpamClassifier =
            serde_json::from_str(&raw).map_err(|source| ModelStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        classifier
            .validate()
            .map_err(|reason| ModelStoreError::Invalid {
                path: self.path.clone(),
                reason,
            })?;

        // A width mismatch would fail every request, so reject it at startup.
        if classifier.n_features != FEATURE_DIM {
            return Err(ModelStoreError::Invalid {
                path: self.path.clone(),
                reason: format!(
                    "classifier expects {} features, featurizer produces {FEATURE_DIM}",
                    classifier.n_features
                ),
            });
        }

        info!(
            classifier = %classifier.name,
            nodes = classifier.tree.len(),
            "Model loaded"
        );

        Ok(ModelHandle::new(classifier, self.path.clone()))
    }
}
