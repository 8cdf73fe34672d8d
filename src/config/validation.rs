//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacities > 0, gas price > 0)
//! - Validate URLs before anything dials them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NodeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::NodeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key, as written in the file.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for values serde cannot reject on its own.
pub fn validate_config(config: &NodeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let eth = &config.ethereum;
    if eth.network_name.trim().is_empty() {
        errors.push(ValidationError::new("ethereum.networkName", "must not be empty"));
    }
    if let Some(uri) = eth.rpc_uri() {
        if let Err(e) = url::Url::parse(uri) {
            errors.push(ValidationError::new("ethereum.rpcURI", format!("invalid URL '{}': {}", uri, e)));
        }
    }
    if eth.gas_price_wei == 0 {
        errors.push(ValidationError::new("ethereum.gasPriceWei", "must be greater than zero"));
    }
    if eth.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ethereum.rpcTimeoutSecs", "must be greater than zero"));
    }

    if let Err(e) = url::Url::parse(&config.identity.ip_lookup_url) {
        errors.push(ValidationError::new("identity.ipLookupUrl", format!("invalid URL: {}", e)));
    }
    if config.identity.lookup_timeout_secs == 0 {
        errors.push(ValidationError::new("identity.lookupTimeoutSecs", "must be greater than zero"));
    }

    let overlay = &config.overlay;
    if overlay.max_peers == 0 {
        errors.push(ValidationError::new("overlay.maxPeers", "must be greater than zero"));
    }
    if overlay.pool_size == 0 {
        errors.push(ValidationError::new("overlay.poolSize", "must be greater than zero"));
    }
    if overlay.bootstrap_timeout_secs == 0 {
        errors.push(ValidationError::new("overlay.bootstrapTimeoutSecs", "must be greater than zero"));
    }
    if overlay.request_timeout_secs == 0 {
        errors.push(ValidationError::new("overlay.requestTimeoutSecs", "must be greater than zero"));
    }

    if config.ingress.queue_capacity == 0 {
        errors.push(ValidationError::new("ingress.queueCapacity", "must be greater than zero"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.requestTimeoutSecs", "must be greater than zero"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.maxBodyBytes", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> NodeConfig {
        serde_json::from_str(r#"{ "ethereum": { "networkName": "nightly" } }"#).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = base_config();
        config.ethereum.network_name = " ".to_string();
        config.ethereum.rpc_uri = Some("not a url".to_string());
        config.overlay.pool_size = 0;
        config.server.request_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "ethereum.networkName",
                "ethereum.rpcURI",
                "overlay.poolSize",
                "server.requestTimeoutSecs"
            ]
        );
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("overlay.maxPeers", "must be greater than zero");
        assert_eq!(err.to_string(), "overlay.maxPeers: must be greater than zero");
    }
}
