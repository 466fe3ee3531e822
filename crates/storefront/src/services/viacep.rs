//! ViaCEP address-lookup client.
//!
//! Resolves a CEP to a street address for address-step auto-fill. Lookups
//! are cached for 5 minutes; a miss is non-fatal to checkout (fields stay
//! editable for manual entry).

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use movase_core::Cep;

/// Request timeout for the lookup call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Lookup cache TTL.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when resolving a CEP.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The lookup service answered with a non-success status.
    #[error("address service returned status {0}")]
    Status(u16),

    /// The CEP is unknown to the lookup service.
    #[error("CEP not found: {0}")]
    NotFound(String),
}

/// A street address resolved from a CEP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetAddress {
    pub cep: String,
    pub street: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

/// ViaCEP response body. `erro: true` marks an unknown CEP.
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: bool,
}

impl From<ViaCepResponse> for StreetAddress {
    fn from(response: ViaCepResponse) -> Self {
        Self {
            cep: response.cep,
            street: response.logradouro,
            complement: response.complemento,
            district: response.bairro,
            city: response.localidade,
            state: response.uf,
        }
    }
}

/// CEP-to-address resolution, as required by the checkout workflow.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Resolve a CEP to a street address.
    async fn lookup(&self, cep: &Cep) -> Result<StreetAddress, LookupError>;
}

/// Client for the ViaCEP web service.
#[derive(Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, StreetAddress>,
}

impl ViaCepClient {
    /// Create a new lookup client against the given base URL
    /// (e.g. `https://viacep.com.br`).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            client,
            base_url: base_url.into(),
            cache,
        })
    }
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    #[instrument(skip(self), fields(cep = %cep))]
    async fn lookup(&self, cep: &Cep) -> Result<StreetAddress, LookupError> {
        if let Some(address) = self.cache.get(cep.as_str()).await {
            debug!("cache hit for CEP lookup");
            return Ok(address);
        }

        let url = format!("{}/ws/{}/json/", self.base_url, cep.as_str());
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: ViaCepResponse = response.json().await?;
        if body.erro {
            return Err(LookupError::NotFound(cep.to_string()));
        }

        let address = StreetAddress::from(body);
        self.cache
            .insert(cep.as_str().to_owned(), address.clone())
            .await;

        Ok(address)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_maps_to_address() {
        let response = ViaCepResponse {
            cep: "01001-000".to_string(),
            logradouro: "Praça da Sé".to_string(),
            complemento: "lado ímpar".to_string(),
            bairro: "Sé".to_string(),
            localidade: "São Paulo".to_string(),
            uf: "SP".to_string(),
            erro: false,
        };

        let address = StreetAddress::from(response);
        assert_eq!(address.street, "Praça da Sé");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "SP");
    }

    #[test]
    fn test_error_body_deserializes() {
        let body: ViaCepResponse = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(body.erro);
        assert!(body.cep.is_empty());
    }

    #[test]
    fn test_full_body_deserializes() {
        let json = r#"{
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP",
            "ibge": "3550308",
            "gia": "1004",
            "ddd": "11",
            "siafi": "7107"
        }"#;

        let body: ViaCepResponse = serde_json::from_str(json).unwrap();
        assert!(!body.erro);
        assert_eq!(body.uf, "SP");
    }
}
