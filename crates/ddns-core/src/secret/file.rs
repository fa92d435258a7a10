// # File Secret Store
//
// File-based implementation of SecretStore.
//
// ## Purpose
//
// Keeps the shared token in a single file whose path is the secret locator.
// The file holds the raw token; surrounding whitespace (a trailing newline
// from an editor, say) is tolerated because the cache trims on read.
//
// ## Durability
//
// - Atomic writes: the new token is written to a temporary file, then renamed
// - Permissions: on Unix the file is created with mode 0600
// - Every read goes to disk; caching is the SecretCache's job

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::SecretStoreConfig;
use crate::traits::{SecretStore, SecretStoreFactory};

/// File-backed secret store
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::secret::FileSecretStore;
/// use ddns_core::traits::SecretStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSecretStore::new("/var/lib/ddns/shared-token");
///
///     store.put_secret("abc").await?;
///     assert_eq!(store.get_secret().await?, "abc");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a store over `path`
    ///
    /// The file does not need to exist yet; reading a missing file fails,
    /// writing creates it along with its parent directories.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The secret locator
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    ///
    /// `.tmp` is appended to the whole file name, so `token.tmp` writes via
    /// `token.tmp.tmp` and `a.key` never shares a temp file with `a.pem`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_atomic(&self, value: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::secret_write(format!(
                        "Failed to create secret directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options.open(&temp_path).await.map_err(|e| {
                Error::secret_write(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(value.as_bytes()).await.map_err(|e| {
                Error::secret_write(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::secret_write(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::secret_write(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Secret written to file: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self) -> Result<String, Error> {
        fs::read_to_string(&self.path).await.map_err(|e| {
            Error::secret_fetch(format!(
                "Failed to read secret file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn put_secret(&self, value: &str) -> Result<(), Error> {
        self.write_atomic(value).await
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for [`FileSecretStore`]
pub struct FileSecretStoreFactory;

impl SecretStoreFactory for FileSecretStoreFactory {
    fn create(&self, config: &SecretStoreConfig) -> Result<Arc<dyn SecretStore>, Error> {
        match config {
            SecretStoreConfig::File { path } => {
                if path.trim().is_empty() {
                    return Err(Error::config("Secret file path is required"));
                }
                Ok(Arc::new(FileSecretStore::new(path)))
            }
            _ => Err(Error::config("Invalid config for file secret store")),
        }
    }
}
