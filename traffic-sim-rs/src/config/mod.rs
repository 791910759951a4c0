//! Configuration management for the traffic simulator
//!
//! Two configuration structs live here:
//!
//! - `SimulationConfig`: the fault rates, delays and query list that drive the
//!   simulation. These are fixed defaults and validated before use.
//! - `BackendConfig`: how to reach the assistant's collaborators (Qdrant, the
//!   LLM endpoint). Loaded through a `ConfigProvider`, normally the environment.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::error::{Result, SimError};
use crate::fault::FaultPolicy;

/// Probability that a vector search fails with a simulated timeout
pub const FAULT_ERROR_RATE: f64 = 0.2;

/// Probability that a vector search is delayed by `SLOW_QUERY_DELAY`
pub const FAULT_SLOW_RATE: f64 = 0.2;

/// Added latency for a simulated slow query
pub const SLOW_QUERY_DELAY: Duration = Duration::from_secs(3);

/// Pause between two simulated requests
pub const LOOP_INTERVAL: Duration = Duration::from_secs(2);

/// Navigation queries sent to the assistant
pub const DEFAULT_QUERIES: [&str; 5] = [
    "Can you calculate the jump to RaviHyral?",
    "What is the status of the jump drive?",
    "Can we get a navigation check?",
    "Is a course correction needed?",
    "Are we there yet?",
];

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_COLLECTION: &str = "art_navigation";
const DEFAULT_VECTOR_SIZE: i64 = 256;
const DEFAULT_HTTP_TIMEOUT_SECS: i64 = 30;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| SimError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(SimError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get an optional, non-empty string value
    fn get_optional(&self, key: &str) -> Option<String> {
        self.get_string(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                SimError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => SimError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| SimError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Settings of the simulation loop and its fault policy
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Probability of an injected timeout per vector search
    pub error_rate: f64,

    /// Probability of an injected slow search (applied after the error band)
    pub slow_rate: f64,

    /// Latency added to a slow search
    pub slow_delay: Duration,

    /// Pause between iterations
    pub loop_interval: Duration,

    /// Queries picked uniformly at random
    pub queries: Vec<String>,

    /// Stop after this many iterations (`None` runs until cancelled)
    pub max_iterations: Option<u64>,

    /// Seed for the query picker and fault rolls
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            error_rate: FAULT_ERROR_RATE,
            slow_rate: FAULT_SLOW_RATE,
            slow_delay: SLOW_QUERY_DELAY,
            loop_interval: LOOP_INTERVAL,
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            max_iterations: None,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Validate rates and the query list
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [("error_rate", self.error_rate), ("slow_rate", self.slow_rate)] {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(SimError::configuration(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, rate
                )));
            }
        }

        if self.error_rate + self.slow_rate > 1.0 {
            return Err(SimError::configuration(format!(
                "error_rate + slow_rate must not exceed 1.0, got {}",
                self.error_rate + self.slow_rate
            )));
        }

        if self.queries.is_empty() {
            return Err(SimError::configuration("query list must not be empty"));
        }

        if self.queries.iter().any(|q| q.trim().is_empty()) {
            return Err(SimError::configuration("queries must not be blank"));
        }

        Ok(())
    }

    /// Fault policy described by this configuration
    pub fn fault_policy(&self) -> FaultPolicy {
        FaultPolicy {
            error_rate: self.error_rate,
            slow_rate: self.slow_rate,
            slow_delay: self.slow_delay,
        }
    }

    /// Error rate as a whole percentage, for display
    pub fn error_percent(&self) -> u32 {
        (self.error_rate * 100.0).round() as u32
    }

    /// Slow rate as a whole percentage, for display
    pub fn slow_percent(&self) -> u32 {
        (self.slow_rate * 100.0).round() as u32
    }
}

/// Where the assistant's collaborators live
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Qdrant gRPC URL (e.g. http://localhost:6334); the seeded in-memory store is used when unset
    pub qdrant_url: Option<String>,

    /// Qdrant collection holding the navigation facts
    pub qdrant_collection: String,

    /// Run without any vector store
    pub vector_store_disabled: bool,

    /// Embedding dimension shared by the embedder and the collection
    pub vector_size: usize,

    /// OpenAI-compatible chat completions endpoint
    pub llm_api_url: String,

    /// Model requested from the LLM endpoint
    pub llm_model: String,

    /// API key; without one the assistant answers from retrieved context
    pub llm_api_key: Option<String>,

    /// Transport timeout for every HTTP call
    pub http_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            qdrant_url: None,
            qdrant_collection: DEFAULT_COLLECTION.to_string(),
            vector_store_disabled: false,
            vector_size: DEFAULT_VECTOR_SIZE as usize,
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS as u64),
        }
    }
}

impl BackendConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Result<Self> {
        let vector_size = provider.get_int_or("vector_size", DEFAULT_VECTOR_SIZE);
        let timeout_secs = provider.get_int_or("http_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS);

        if vector_size <= 0 {
            return Err(SimError::configuration(format!(
                "VECTOR_SIZE must be positive, got {}",
                vector_size
            )));
        }
        if timeout_secs <= 0 {
            return Err(SimError::configuration(format!(
                "HTTP_TIMEOUT_SECS must be positive, got {}",
                timeout_secs
            )));
        }

        let config = Self {
            qdrant_url: provider.get_optional("qdrant_url"),
            qdrant_collection: provider.get_string_or("qdrant_collection", DEFAULT_COLLECTION),
            vector_store_disabled: provider.get_bool_or("qdrant_disabled", false),
            vector_size: vector_size as usize,
            llm_api_url: provider.get_string_or("llm_api_url", DEFAULT_LLM_API_URL),
            llm_model: provider.get_string_or("llm_model", DEFAULT_LLM_MODEL),
            llm_api_key: provider.get_optional("llm_api_key"),
            http_timeout: Duration::from_secs(timeout_secs as u64),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_provider(&EnvConfigProvider::new())
    }

    /// Validate URLs and names
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.qdrant_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SimError::configuration(format!(
                    "QDRANT_URL must be an http(s) URL, got {}",
                    url
                )));
            }
        }

        if self.qdrant_collection.is_empty() {
            return Err(SimError::configuration("Qdrant collection name is required"));
        }

        if !(self.llm_api_url.starts_with("http://") || self.llm_api_url.starts_with("https://")) {
            return Err(SimError::configuration(format!(
                "LLM_API_URL must be an http(s) URL, got {}",
                self.llm_api_url
            )));
        }

        if self.llm_model.is_empty() {
            return Err(SimError::configuration("LLM model name is required"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("key1", "value1");
        provider.set("key2", "123");
        provider.set("flag", "yes");

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get_int("key2").unwrap(), 123);
        assert!(provider.get_bool("flag").unwrap());
        assert!(provider.get_string("key3").is_err());
        assert_eq!(provider.get_int_or("key3", 7), 7);
    }

    #[test]
    fn test_env_config_provider_format_key() {
        let provider = EnvConfigProvider::new().with_prefix("TRAFFIC");
        assert_eq!(provider.format_key("qdrant_url"), "TRAFFIC_QDRANT_URL");
        assert_eq!(provider.format_key("llm-model"), "TRAFFIC_LLM_MODEL");

        let bare = EnvConfigProvider::new();
        assert_eq!(bare.format_key("llm_api_key"), "LLM_API_KEY");
    }

    #[test]
    fn test_default_simulation_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.error_rate, 0.2);
        assert_eq!(config.slow_rate, 0.2);
        assert_eq!(config.slow_delay, Duration::from_secs(3));
        assert_eq!(config.loop_interval, Duration::from_secs(2));
        assert_eq!(config.queries.len(), 5);
        assert_eq!(config.queries[0], "Can you calculate the jump to RaviHyral?");
        assert!(config.validate().is_ok());
        assert_eq!(config.error_percent(), 20);
        assert_eq!(config.slow_percent(), 20);
    }

    #[test]
    fn test_backend_defaults_from_empty_provider() {
        let config = BackendConfig::from_provider(&MemoryConfigProvider::new()).unwrap();
        assert_eq!(config, BackendConfig::default());
    }
}
