//! Startup configuration.
//!
//! The access key variable must be present for the console to start at all.
//! Its absence is a deployment mistake, not a user state, so it aborts
//! initialization instead of degrading to the placeholder view.

use std::path::PathBuf;

use url::Url;

use crate::errors::ConsoleError;

pub const ACCESS_KEY_VAR: &str = "LIVECONSOLE_ACCESS_KEY";
pub const ENDPOINT_VAR: &str = "LIVECONSOLE_ENDPOINT";
pub const DATA_DIR_VAR: &str = "LIVECONSOLE_DATA_DIR";
pub const STORE_VAR: &str = "LIVECONSOLE_STORE";

pub const DEFAULT_HOST: &str = "generativelanguage.googleapis.com";
const DEFAULT_PATH: &str =
    "/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

/// Where the credential slot is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone)]
pub struct Config {
    endpoint: Url,
    data_dir: Option<PathBuf>,
    store: StoreBackend,
}

impl Config {
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConsoleError> {
        // Only its presence is checked.
        if lookup(ACCESS_KEY_VAR).is_none() {
            return Err(ConsoleError::Config(format!(
                "set {ACCESS_KEY_VAR} in the environment"
            )));
        }

        let endpoint = match lookup(ENDPOINT_VAR) {
            Some(raw) => parse_endpoint(&raw)?,
            None => default_endpoint()?,
        };

        let store = match lookup(STORE_VAR).as_deref() {
            None | Some("file") => StoreBackend::File,
            Some("keyring") => StoreBackend::Keyring,
            Some(other) => {
                return Err(ConsoleError::Config(format!(
                    "{STORE_VAR} must be 'file' or 'keyring', got '{other}'"
                )));
            }
        };

        Ok(Self {
            endpoint,
            data_dir: lookup(DATA_DIR_VAR).map(PathBuf::from),
            store,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    pub fn store(&self) -> StoreBackend {
        self.store
    }
}

pub fn default_endpoint() -> Result<Url, ConsoleError> {
    parse_endpoint(&format!("wss://{DEFAULT_HOST}{DEFAULT_PATH}"))
}

/// Parse a session endpoint, accepting only websocket schemes.
pub fn parse_endpoint(raw: &str) -> Result<Url, ConsoleError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConsoleError::Config(format!("invalid endpoint '{raw}': {e}")))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConsoleError::Config(format!(
            "endpoint must use ws:// or wss://, got '{other}://'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_access_key_aborts() {
        let err = Config::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
        assert!(err.to_string().contains(ACCESS_KEY_VAR));
    }

    #[test]
    fn defaults_when_only_access_key_set() {
        let config = Config::from_vars(vars(&[(ACCESS_KEY_VAR, "deploy-key")])).unwrap();
        assert_eq!(config.endpoint().scheme(), "wss");
        assert_eq!(config.endpoint().host_str(), Some(DEFAULT_HOST));
        assert!(config.endpoint().path().ends_with("BidiGenerateContent"));
        assert_eq!(config.store(), StoreBackend::File);
        assert!(config.data_dir().is_none());
    }

    #[test]
    fn empty_access_key_still_counts_as_present() {
        assert!(Config::from_vars(vars(&[(ACCESS_KEY_VAR, "")])).is_ok());
    }

    #[test]
    fn endpoint_override() {
        let config = Config::from_vars(vars(&[
            (ACCESS_KEY_VAR, "k"),
            (ENDPOINT_VAR, "ws://localhost:9000/live"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint().as_str(), "ws://localhost:9000/live");
    }

    #[test]
    fn endpoint_must_be_websocket() {
        let err = Config::from_vars(vars(&[
            (ACCESS_KEY_VAR, "k"),
            (ENDPOINT_VAR, "https://example.com/live"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn store_backend_selection() {
        let config =
            Config::from_vars(vars(&[(ACCESS_KEY_VAR, "k"), (STORE_VAR, "keyring")])).unwrap();
        assert_eq!(config.store(), StoreBackend::Keyring);
        assert!(Config::from_vars(vars(&[(ACCESS_KEY_VAR, "k"), (STORE_VAR, "disk")])).is_err());
    }

    #[test]
    fn data_dir_override() {
        let config =
            Config::from_vars(vars(&[(ACCESS_KEY_VAR, "k"), (DATA_DIR_VAR, "/tmp/lc")])).unwrap();
        assert_eq!(config.data_dir(), Some(&PathBuf::from("/tmp/lc")));
    }
}
