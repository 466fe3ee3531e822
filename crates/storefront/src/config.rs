//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAGSEGURO_TOKEN` - Payment gateway API token
//!
//! ## Optional
//! - `MOVASE_HOST` - Bind address (default: 127.0.0.1)
//! - `MOVASE_PORT` - Listen port (default: 3000)
//! - `MOVASE_BASE_URL` - Public URL for the storefront (default: http://localhost:3000)
//! - `CORREIOS_CEP_ORIGEM` - Origin CEP for rate lookups (default: 01001000)
//! - `CORREIOS_UPSTREAM_URL` - Carrier rate endpoint
//! - `CORREIOS_PROXY_URL` - Rate proxy endpoint used by the quote client
//!   (default: `<MOVASE_BASE_URL>/api/correios`)
//! - `VIACEP_BASE_URL` - Address lookup base URL (default: https://viacep.com.br)
//! - `PAGSEGURO_SANDBOX` - Use the gateway sandbox (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use movase_core::Cep;

/// Default carrier rate endpoint.
const DEFAULT_CORREIOS_UPSTREAM: &str =
    "http://ws.correios.com.br/calculador/CalcPrecoPrazo.aspx";

/// Default origin CEP (São Paulo - SP).
const DEFAULT_ORIGIN_CEP: &str = "01001000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Carrier rate lookup configuration
    pub correios: CorreiosConfig,
    /// Address lookup configuration
    pub viacep: ViaCepConfig,
    /// Payment gateway configuration
    pub pagseguro: PagSeguroConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Correios rate lookup configuration.
#[derive(Debug, Clone)]
pub struct CorreiosConfig {
    /// Origin CEP for every quote (store warehouse).
    pub origin_cep: Cep,
    /// Carrier rate endpoint the proxy forwards to.
    pub upstream_url: String,
    /// Rate proxy endpoint the quote client calls.
    pub proxy_url: String,
}

/// ViaCEP address lookup configuration.
#[derive(Debug, Clone)]
pub struct ViaCepConfig {
    /// Lookup service base URL.
    pub base_url: String,
}

/// PagSeguro gateway configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct PagSeguroConfig {
    /// Gateway API token.
    pub token: SecretString,
    /// Whether to use the sandbox environment.
    pub sandbox: bool,
}

impl PagSeguroConfig {
    /// The API base URL for the configured environment.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        if self.sandbox {
            crate::services::pagseguro::SANDBOX_URL
        } else {
            crate::services::pagseguro::PRODUCTION_URL
        }
    }
}

impl std::fmt::Debug for PagSeguroConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagSeguroConfig")
            .field("token", &"[REDACTED]")
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("MOVASE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MOVASE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MOVASE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MOVASE_PORT".to_string(), e.to_string()))?;
        let base_url = get_validated_url("MOVASE_BASE_URL", "http://localhost:3000")?;

        let correios = CorreiosConfig::from_env(&base_url)?;
        let viacep = ViaCepConfig::from_env()?;
        let pagseguro = PagSeguroConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            correios,
            viacep,
            pagseguro,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CorreiosConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let origin_cep = get_env_or_default("CORREIOS_CEP_ORIGEM", DEFAULT_ORIGIN_CEP);
        let origin_cep = Cep::parse(&origin_cep).map_err(|e| {
            ConfigError::InvalidEnvVar("CORREIOS_CEP_ORIGEM".to_string(), e.to_string())
        })?;

        let upstream_url = get_validated_url("CORREIOS_UPSTREAM_URL", DEFAULT_CORREIOS_UPSTREAM)?;
        let default_proxy = format!("{base_url}/api/correios");
        let proxy_url = get_validated_url("CORREIOS_PROXY_URL", &default_proxy)?;

        Ok(Self {
            origin_cep,
            upstream_url,
            proxy_url,
        })
    }
}

impl ViaCepConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_validated_url("VIACEP_BASE_URL", "https://viacep.com.br")?,
        })
    }
}

impl PagSeguroConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token = SecretString::from(get_required_env("PAGSEGURO_TOKEN")?);
        let sandbox = get_env_or_default("PAGSEGURO_SANDBOX", "true")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PAGSEGURO_SANDBOX".to_string(), e.to_string())
            })?;

        Ok(Self { token, sandbox })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a URL-valued environment variable, validating its shape. The
/// trailing slash is trimmed so values compose cleanly with path
/// suffixes.
fn get_validated_url(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value.trim_end_matches('/').to_string())
}
