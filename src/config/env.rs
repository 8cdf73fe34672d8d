//! Values the node takes from its process environment.

use std::path::PathBuf;

/// Path to the JSON config file.
pub const CONFIG_ENV_VAR: &str = "ENV_CONFIG";
/// Path to the keystore file.
pub const KEYSTORE_ENV_VAR: &str = "ENV_KEYSTORE";
/// Passphrase for an encrypted keystore. Empty means plaintext.
pub const KEYSTORE_PASSPHRASE_ENV_VAR: &str = "ENV_KEYSTORE_PASSPHRASE";
/// Port the public API listens on and the overlay advertises.
pub const PORT_ENV_VAR: &str = "PORT";

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_KEYSTORE_PATH: &str = "keystore.json";
pub const DEFAULT_PORT: &str = "18514";

/// Startup inputs that come from the environment rather than the config file.
#[derive(Clone)]
pub struct NodeEnv {
    pub config_path: PathBuf,
    pub keystore_path: PathBuf,
    pub keystore_passphrase: String,
    pub port: String,
}

impl NodeEnv {
    /// Read every value from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or empty values take their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            config_path: get(CONFIG_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
                .into(),
            keystore_path: get(KEYSTORE_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_KEYSTORE_PATH.to_string())
                .into(),
            keystore_passphrase: lookup(KEYSTORE_PASSPHRASE_ENV_VAR).unwrap_or_default(),
            port: get(PORT_ENV_VAR).unwrap_or_else(|| DEFAULT_PORT.to_string()),
        }
    }
}

impl std::fmt::Debug for NodeEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEnv")
            .field("config_path", &self.config_path)
            .field("keystore_path", &self.keystore_path)
            .field("keystore_encrypted", &!self.keystore_passphrase.is_empty())
            .field("port", &self.port)
            .finish()
    }
}
