//! Credential persistence.
//!
//! The gate only needs a synchronous key-value slot that survives restarts.
//! [`FileStore`] is the default durable backend, [`KeyringStore`] puts the
//! value in the platform's secure storage, and [`MemoryStore`] is the
//! in-process stand-in used by tests and embedders.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::ConsoleError;

/// Synchronous key-value slot backing the credential.
///
/// `set(key, None)` removes the entry.
pub trait CredentialStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError>;
    fn set(&self, key: &str, value: Option<&str>) -> Result<(), ConsoleError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), ConsoleError> {
        (**self).set(key, value)
    }
}

/// Shared in-memory store. Clones see the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ConsoleError::Store("memory store poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), ConsoleError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ConsoleError::Store("memory store poisoned".into()))?;
        match value {
            Some(v) => entries.insert(key.to_string(), v.to_string()),
            None => entries.remove(key),
        };
        Ok(())
    }
}

/// JSON file in the application data directory.
///
/// Every read goes back to disk so that a value cleared by another process
/// is noticed on the next evaluation.
pub struct FileStore {
    file_path: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            file_path: data_dir.as_ref().join("credentials.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&self) -> Result<HashMap<String, String>, ConsoleError> {
        match std::fs::read_to_string(&self.file_path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ConsoleError::Store(format!("{}: {e}", self.file_path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ConsoleError::Store(format!(
                "{}: {e}",
                self.file_path.display()
            ))),
        }
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), ConsoleError> {
        // A corrupt file is replaced rather than blocking the write.
        let mut entries = self.load().unwrap_or_else(|e| {
            tracing::warn!("discarding unreadable credential file: {e}");
            HashMap::new()
        });
        match value {
            Some(v) => entries.insert(key.to_string(), v.to_string()),
            None => entries.remove(key),
        };

        let parent = match self.file_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| ConsoleError::Store(format!("{}: {e}", parent.display())))?;
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| ConsoleError::Store(e.to_string()))?;

        // Write next to the target and rename over it, so a reader sees either
        // the old file or the new one, never a truncated one.
        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| ConsoleError::Store(format!("{}: {e}", parent.display())))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| ConsoleError::Store(format!("{}: {e}", staged.path().display())))?;
        staged
            .persist(&self.file_path)
            .map_err(|e| ConsoleError::Store(format!("{}: {}", self.file_path.display(), e.error)))?;
        Ok(())
    }
}

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub use keyring_store::KeyringStore;

#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod keyring_store {
    use super::CredentialStore;
    use crate::errors::ConsoleError;

    /// OS secure storage (Keychain, libsecret, Credential Manager).
    /// Each key is one entry under `service`.
    pub struct KeyringStore {
        service: String,
    }

    impl KeyringStore {
        pub fn new(service: impl Into<String>) -> Self {
            Self {
                service: service.into(),
            }
        }

        fn entry(&self, key: &str) -> Result<keyring::Entry, ConsoleError> {
            keyring::Entry::new(&self.service, key)
                .map_err(|e| ConsoleError::Store(format!("keyring: {e}")))
        }
    }

    impl CredentialStore for KeyringStore {
        fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
            match self.entry(key)?.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(ConsoleError::Store(format!("keyring: {e}"))),
            }
        }

        fn set(&self, key: &str, value: Option<&str>) -> Result<(), ConsoleError> {
            let entry = self.entry(key)?;
            let result = match value {
                Some(v) => entry.set_password(v),
                None => match entry.delete_credential() {
                    Err(keyring::Error::NoEntry) => Ok(()),
                    other => other,
                },
            };
            result.map_err(|e| ConsoleError::Store(format!("keyring: {e}")))
        }
    }
}
