//! Correios shipping-quote client.
//!
//! Computes delivery options for a destination CEP by querying the store's
//! rate proxy (see `routes::correios`), which forwards to the carrier and
//! absorbs carrier unreachability with synthetic quotes. Carrier-reported
//! business errors, in contrast, are surfaced to the caller.

mod parser;
mod types;

pub use parser::parse_rate_response;
pub use types::{QuoteSelection, ShippingQuote, select_quotes, service_codes, service_name};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use movase_core::{Cep, CepError};

/// Fixed package dimensions for every shipment (centimeters), per the
/// store's standard book packaging.
pub mod package {
    /// `nVlComprimento`.
    pub const LENGTH_CM: u32 = 16;
    /// `nVlAltura`.
    pub const HEIGHT_CM: u32 = 2;
    /// `nVlLargura`.
    pub const WIDTH_CM: u32 = 11;
    /// `nVlDiametro`.
    pub const DIAMETER_CM: u32 = 0;
    /// `nCdFormato` - box.
    pub const FORMAT_BOX: &str = "1";
}

/// Request timeout against the rate proxy.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when computing shipping quotes.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The destination is not a valid 8-digit CEP.
    #[error("invalid destination CEP: {0}")]
    InvalidInput(#[from] CepError),

    /// The HTTP call to the rate proxy failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The rate proxy answered with a non-success status.
    #[error("rate proxy returned status {0}")]
    Status(u16),

    /// The carrier reported a business error for at least one quote.
    /// Carries the concatenated non-empty carrier messages.
    #[error("carrier error: {0}")]
    Carrier(String),
}

/// Shipping-quote computation, as required by the checkout workflow.
#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Quotes for shipping `weight_kg` to `destination`.
    async fn quote(
        &self,
        destination: &str,
        weight_kg: f64,
    ) -> Result<Vec<ShippingQuote>, QuoteError>;
}

/// Fail the whole batch when any quote carries a non-zero error code,
/// concatenating every non-empty carrier message.
///
/// # Errors
///
/// Returns `QuoteError::Carrier` when at least one quote is erroneous.
pub fn validate_batch(quotes: &[ShippingQuote]) -> Result<(), QuoteError> {
    let messages: Vec<&str> = quotes
        .iter()
        .filter(|quote| !quote.is_success())
        .map(|quote| quote.error_message.as_str())
        .filter(|message| !message.is_empty())
        .collect();

    let has_errors = quotes.iter().any(|quote| !quote.is_success());
    if has_errors {
        return Err(QuoteError::Carrier(messages.join(", ")));
    }

    Ok(())
}

/// Client for the store's Correios rate proxy.
#[derive(Clone)]
pub struct CorreiosClient {
    client: reqwest::Client,
    proxy_url: String,
}

impl CorreiosClient {
    /// Create a new rate client pointing at the given proxy endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(proxy_url: impl Into<String>) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            proxy_url: proxy_url.into(),
        })
    }
}

#[async_trait]
impl QuoteService for CorreiosClient {
    #[instrument(skip(self), fields(destination = %destination, weight_kg = %weight_kg))]
    async fn quote(
        &self,
        destination: &str,
        weight_kg: f64,
    ) -> Result<Vec<ShippingQuote>, QuoteError> {
        let cep = Cep::parse(destination)?;

        let url = format!("{}?cep={}&peso={weight_kg}", self.proxy_url, cep.as_str());
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Status(status.as_u16()));
        }

        let xml = response.text().await?;
        let quotes = parse_rate_response(&xml);
        validate_batch(&quotes)?;

        Ok(quotes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ok_quote(code: &str) -> ShippingQuote {
        ShippingQuote {
            service_code: code.to_string(),
            error_code: "0".to_string(),
            ..ShippingQuote::default()
        }
    }

    fn failed_quote(code: &str, error_code: &str, message: &str) -> ShippingQuote {
        ShippingQuote {
            service_code: code.to_string(),
            error_code: error_code.to_string(),
            error_message: message.to_string(),
            ..ShippingQuote::default()
        }
    }

    #[test]
    fn test_validate_batch_all_ok() {
        let quotes = vec![ok_quote("04510"), ok_quote("04014")];
        assert!(validate_batch(&quotes).is_ok());
    }

    #[test]
    fn test_validate_batch_one_error_fails_whole_call() {
        let quotes = vec![
            ok_quote("04510"),
            failed_quote("04014", "1", "peso excede limite"),
        ];

        let err = validate_batch(&quotes).unwrap_err();
        assert!(matches!(err, QuoteError::Carrier(_)));
        assert!(err.to_string().contains("peso excede limite"));
    }

    #[test]
    fn test_validate_batch_joins_messages() {
        let quotes = vec![
            failed_quote("04510", "-888", "CEP invalido"),
            failed_quote("04014", "1", "peso excede limite"),
        ];

        let err = validate_batch(&quotes).unwrap_err();
        assert!(err.to_string().contains("CEP invalido, peso excede limite"));
    }

    #[test]
    fn test_validate_batch_error_without_message() {
        let quotes = vec![failed_quote("04510", "7", "")];
        assert!(validate_batch(&quotes).is_err());
    }

    #[test]
    fn test_validate_batch_empty_is_ok() {
        assert!(validate_batch(&[]).is_ok());
    }

    #[tokio::test]
    async fn test_quote_rejects_invalid_cep() {
        let client = CorreiosClient::new("http://127.0.0.1:1/api/correios").unwrap();
        let err = client.quote("1234", 0.5).await.unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput(_)));
    }
}
