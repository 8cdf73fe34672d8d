//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment (ENV_CONFIG, ENV_KEYSTORE, ENV_KEYSTORE_PASSPHRASE, PORT)
//!     → env.rs (paths, passphrase, port)
//!
//! config file (JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NodeConfig (validated, immutable)
//!     → owned by the orchestrator for the process lifetime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - Optional sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::NodeEnv;
pub use loader::{load_config, ConfigError};
pub use schema::{
    EthereumConfig, IdentityConfig, IngressConfig, LogFormat, NodeConfig, ObservabilityConfig,
    OverlayConfig, ServerConfig,
};
