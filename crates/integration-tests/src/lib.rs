//! Shared fixtures for Movase integration tests.
//!
//! In-memory implementations of the checkout workflow's service seams,
//! with failure injection, plus helpers for building carts and
//! application state.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;

use movase_core::{BookId, Cep};
use movase_storefront::cart::Book;
use movase_storefront::config::{
    CorreiosConfig, PagSeguroConfig, StorefrontConfig, ViaCepConfig,
};
use movase_storefront::services::correios::{QuoteError, QuoteService, ShippingQuote};
use movase_storefront::services::pagseguro::{
    CreatedOrder, GatewayError, OrderRequest, PaymentGateway, PaymentMethod,
};
use movase_storefront::services::viacep::{AddressLookup, LookupError, StreetAddress};

/// A catalog book for cart fixtures.
#[must_use]
pub fn book(id: i64, price: &str) -> Book {
    Book {
        id: BookId::new(id),
        title: format!("Book {id}"),
        author: "Author".to_string(),
        price: price.parse().expect("fixture price parses"),
        image_url: format!("/covers/{id}.jpg"),
    }
}

/// Storefront configuration pointing the carrier upstream at an
/// unroutable endpoint, for fallback tests.
#[must_use]
pub fn test_config(upstream_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("fixture host parses"),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        correios: CorreiosConfig {
            origin_cep: Cep::parse("01001000").expect("fixture CEP parses"),
            upstream_url: upstream_url.to_string(),
            proxy_url: "http://localhost:3000/api/correios".to_string(),
        },
        viacep: ViaCepConfig {
            base_url: "https://viacep.com.br".to_string(),
        },
        pagseguro: PagSeguroConfig {
            token: SecretString::from("test-token"),
            sandbox: true,
        },
        sentry_dsn: None,
    }
}

// =============================================================================
// Stub Services
// =============================================================================

/// Quote service answering a fixed PAC/SEDEX pair, with carrier-error
/// injection and a call counter.
#[derive(Default)]
pub struct StubQuoteService {
    calls: AtomicU32,
    fail: AtomicBool,
}

impl StubQuoteService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quote calls made so far.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Configure the service to report a carrier business error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuoteService for StubQuoteService {
    async fn quote(
        &self,
        _destination: &str,
        _weight_kg: f64,
    ) -> Result<Vec<ShippingQuote>, QuoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(QuoteError::Carrier("peso excede limite".to_string()));
        }

        Ok(vec![
            ShippingQuote {
                service_code: "04510".to_string(),
                value: "15,50".to_string(),
                delivery_days: "8".to_string(),
                home_delivery: "S".to_string(),
                saturday_delivery: "N".to_string(),
                error_code: "0".to_string(),
                ..ShippingQuote::default()
            },
            ShippingQuote {
                service_code: "04014".to_string(),
                value: "25,80".to_string(),
                delivery_days: "3".to_string(),
                home_delivery: "S".to_string(),
                saturday_delivery: "S".to_string(),
                error_code: "0".to_string(),
                ..ShippingQuote::default()
            },
        ])
    }
}

/// Address lookup answering a fixed São Paulo address, with miss
/// injection.
#[derive(Default)]
pub struct StubAddressLookup {
    miss: AtomicBool,
}

impl StubAddressLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the lookup to miss.
    pub fn set_miss(&self, miss: bool) {
        self.miss.store(miss, Ordering::SeqCst);
    }
}

#[async_trait]
impl AddressLookup for StubAddressLookup {
    async fn lookup(&self, cep: &Cep) -> Result<StreetAddress, LookupError> {
        if self.miss.load(Ordering::SeqCst) {
            return Err(LookupError::NotFound(cep.to_string()));
        }

        Ok(StreetAddress {
            cep: cep.formatted(),
            street: "Praça da Sé".to_string(),
            complement: String::new(),
            district: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        })
    }
}

/// Payment gateway recording the last submitted order, with decline
/// injection.
#[derive(Default)]
pub struct StubPaymentGateway {
    fail: AtomicBool,
    last: Mutex<Option<(OrderRequest, PaymentMethod)>>,
}

impl StubPaymentGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the gateway to decline.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// The last submitted order and payment method, if any.
    #[must_use]
    pub fn last_order(&self) -> Option<(OrderRequest, PaymentMethod)> {
        self.last
            .lock()
            .expect("gateway stub mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn create_order(
        &self,
        order: OrderRequest,
        method: PaymentMethod,
    ) -> Result<CreatedOrder, GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 400,
                message: "declined".to_string(),
            });
        }

        let reference_id = order.reference_id.clone();
        *self.last.lock().expect("gateway stub mutex poisoned") = Some((order, method));

        Ok(CreatedOrder {
            id: "ORDE_INTEGRATION".to_string(),
            reference_id,
            charges: vec![],
        })
    }
}
