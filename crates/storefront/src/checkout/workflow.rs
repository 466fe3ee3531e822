//! The checkout state machine.
//!
//! Progresses through the ordered wizard steps, gating each transition on
//! that step's validation, recomputing shipping quotes when the
//! destination changes, and dispatching the final submission to the
//! payment gateway. Collaborators are constructor-injected behind async
//! traits so the whole flow is testable with in-memory stubs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::instrument;

use movase_core::{Cep, Cpf};

use super::session::{
    AddressForm, CardForm, CheckoutSession, CheckoutStep, CustomerForm, PaymentSelection,
};
use super::validation::{
    ValidationError, validate_address, validate_payment, validate_personal_data, validate_shipping,
};
use crate::cart::{CartCommand, CartItem, CartService, CartStorage};
use crate::config::StorefrontConfig;
use crate::services::correios::{CorreiosClient, QuoteError, QuoteService, ShippingQuote};
use crate::services::pagseguro::{
    CardDetails, Customer, GatewayAddress, GatewayError, OrderItem, OrderRequest, PagSeguroClient,
    PaymentGateway, PaymentMethod, Phone, Shipping, order_reference,
};
use crate::services::viacep::{AddressLookup, LookupError, ViaCepClient};

/// Approximate shipping weight per book.
pub const ITEM_WEIGHT_KG: f64 = 0.5;

/// Per-item weight reported to the gateway, in grams.
pub const ITEM_WEIGHT_GRAMS: u32 = 500;

/// Phone country code for every order.
pub const PHONE_COUNTRY: &str = "55";

/// Errors surfaced by the workflow. The `Display` form is the message
/// shown to the shopper.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Quote computation failed with a carrier business error.
    #[error("Erro ao calcular frete. Verifique o CEP.")]
    QuoteFailed(#[source] QuoteError),

    /// Address auto-fill missed; fields are left for manual entry.
    #[error("CEP não encontrado. Preencha manualmente.")]
    AddressNotFound(#[source] LookupError),

    /// Payment dispatch failed; the shopper may retry from confirmation.
    #[error("Erro ao processar pagamento. Tente novamente.")]
    PaymentFailed(#[source] GatewayError),

    /// A submission is already in flight.
    #[error("Pagamento em processamento, aguarde")]
    AlreadyProcessing,

    /// Submission attempted before reaching the confirmation step.
    #[error("Finalize o pedido a partir da confirmação")]
    NotAtConfirmation,
}

/// Outcome of a CEP edit. Both effects are independent: an address miss
/// is a warning while quotes may still arrive, and vice versa.
#[derive(Debug, Default)]
pub struct CepChange {
    /// Set when auto-fill failed and the fields were left for manual entry.
    pub address_warning: Option<CheckoutError>,
    /// Set when the quote computation failed.
    pub quote_error: Option<CheckoutError>,
}

/// Errors building the production workflow wiring.
#[derive(Debug, Error)]
pub enum WorkflowBuildError {
    #[error("rate client: {0}")]
    Quote(#[from] QuoteError),
    #[error("address client: {0}")]
    Lookup(#[from] LookupError),
    #[error("gateway client: {0}")]
    Gateway(#[from] GatewayError),
}

/// The checkout workflow: session state plus injected collaborators.
pub struct CheckoutWorkflow {
    session: CheckoutSession,
    cart: CartService,
    quotes: Arc<dyn QuoteService>,
    addresses: Arc<dyn AddressLookup>,
    payments: Arc<dyn PaymentGateway>,
}

impl CheckoutWorkflow {
    /// Create a workflow over the given cart and service clients.
    #[must_use]
    pub fn new(
        cart: CartService,
        quotes: Arc<dyn QuoteService>,
        addresses: Arc<dyn AddressLookup>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            session: CheckoutSession::default(),
            cart,
            quotes,
            addresses,
            payments,
        }
    }

    /// Workflow wired to the production clients, with the cart loaded
    /// from the given storage.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowBuildError` if one of the HTTP clients fails to
    /// build.
    pub fn from_config(
        config: &StorefrontConfig,
        storage: Arc<dyn CartStorage>,
    ) -> Result<Self, WorkflowBuildError> {
        let quotes = CorreiosClient::new(config.correios.proxy_url.clone())?;
        let addresses = ViaCepClient::new(config.viacep.base_url.clone())?;
        let payments =
            PagSeguroClient::new(config.pagseguro.base_url(), config.pagseguro.token.clone())?;

        Ok(Self::new(
            CartService::load(storage),
            Arc::new(quotes),
            Arc::new(addresses),
            Arc::new(payments),
        ))
    }

    /// The current session state.
    #[must_use]
    pub const fn session(&self) -> &CheckoutSession {
        &self.session
    }

    /// The cart backing this checkout.
    #[must_use]
    pub const fn cart(&self) -> &CartService {
        &self.cart
    }

    /// Mutable cart access for add/remove actions outside the wizard.
    pub const fn cart_mut(&mut self) -> &mut CartService {
        &mut self.cart
    }

    /// Mutable access to the personal-data form.
    pub const fn customer_mut(&mut self) -> &mut CustomerForm {
        &mut self.session.customer
    }

    /// Mutable access to the address form.
    ///
    /// CEP edits must go through [`Self::update_cep`] so quote state stays
    /// consistent with the destination.
    pub const fn address_mut(&mut self) -> &mut AddressForm {
        &mut self.session.address
    }

    /// Mutable access to the card form.
    pub const fn card_mut(&mut self) -> &mut CardForm {
        &mut self.session.card
    }

    /// Choose the payment method.
    pub const fn set_payment_method(&mut self, method: PaymentSelection) {
        self.session.payment_method = method;
    }

    // =========================================================================
    // Step Transitions
    // =========================================================================

    /// Validate the current step and advance to the next one.
    ///
    /// On a validation failure the step is unchanged and the user-facing
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns the current step's `ValidationError` when its gate fails.
    pub fn next(&mut self) -> Result<CheckoutStep, ValidationError> {
        match self.session.step {
            CheckoutStep::PersonalData => validate_personal_data(&self.session.customer)?,
            CheckoutStep::Address => validate_address(&self.session.address)?,
            CheckoutStep::Shipping => validate_shipping(self.session.selected_quote.as_ref())?,
            CheckoutStep::Payment => {
                validate_payment(self.session.payment_method, &self.session.card)?;
            }
            CheckoutStep::Confirmation => {}
        }

        if let Some(next) = self.session.step.next() {
            self.session.step = next;
        }

        Ok(self.session.step)
    }

    /// Move to the previous step. Always succeeds; a no-op at the first
    /// step.
    pub fn back(&mut self) -> CheckoutStep {
        if let Some(previous) = self.session.step.previous() {
            self.session.step = previous;
        }
        self.session.step
    }

    // =========================================================================
    // Destination Changes
    // =========================================================================

    /// Record a CEP edit and run its side effects.
    ///
    /// Any edit clears the quotes, the selection, and the last-quoted CEP.
    /// Once the CEP reaches 8 digits the address is auto-filled and fresh
    /// quotes are requested; both outcomes are reported independently and
    /// neither blocks the other.
    pub async fn update_cep(&mut self, raw: &str) -> CepChange {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        self.session.address.cep = digits.clone();
        self.session.quotes.clear();
        self.session.selected_quote = None;
        self.session.last_quoted_cep = None;

        let mut change = CepChange::default();
        if digits.len() == Cep::LENGTH {
            if let Err(warning) = self.autofill_address().await {
                change.address_warning = Some(warning);
            }
            if let Err(error) = self.refresh_quotes().await {
                change.quote_error = Some(error);
            }
        }

        change
    }

    /// Auto-fill the address form from the current CEP.
    ///
    /// A miss leaves the fields untouched for manual entry. A response
    /// for a CEP that is no longer current is discarded.
    ///
    /// # Errors
    ///
    /// Returns `AddressNotFound` as the user-facing warning on a miss.
    pub async fn autofill_address(&mut self) -> Result<(), CheckoutError> {
        let Ok(cep) = Cep::parse(&self.session.address.cep) else {
            return Ok(());
        };

        self.session.is_looking_up_address = true;
        let result = self.addresses.lookup(&cep).await;
        self.session.is_looking_up_address = false;

        if self.session.address.cep != cep.as_str() {
            return Ok(());
        }

        match result {
            Ok(found) => {
                let form = &mut self.session.address;
                form.street = found.street;
                form.district = found.district;
                form.city = found.city;
                form.state = found.state;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("address lookup failed for {cep}: {e}");
                Err(CheckoutError::AddressNotFound(e))
            }
        }
    }

    /// Request quotes for the current CEP unless one is already in flight
    /// or the CEP was already quoted.
    ///
    /// The first arriving quote is auto-selected; the shopper may
    /// override it. A response for a CEP that is no longer current is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns `QuoteFailed` when the carrier reports a business error.
    #[instrument(skip(self), fields(cep = %self.session.address.cep))]
    pub async fn refresh_quotes(&mut self) -> Result<(), CheckoutError> {
        let cep = self.session.address.cep.clone();
        if cep.len() != Cep::LENGTH
            || self.session.is_calculating_shipping
            || self.session.last_quoted_cep.as_deref() == Some(cep.as_str())
        {
            return Ok(());
        }

        let weight_kg = f64::from(self.cart.cart().item_count()) * ITEM_WEIGHT_KG;

        self.session.is_calculating_shipping = true;
        let result = self.quotes.quote(&cep, weight_kg).await;
        self.session.is_calculating_shipping = false;

        if self.session.address.cep != cep {
            return Ok(());
        }

        match result {
            Ok(quotes) => {
                self.session.selected_quote = quotes.first().cloned();
                self.session.quotes = quotes;
                self.session.last_quoted_cep = Some(cep);
                Ok(())
            }
            Err(e) => Err(CheckoutError::QuoteFailed(e)),
        }
    }

    /// Select one of the available quotes by index.
    pub fn select_quote(&mut self, index: usize) -> bool {
        match self.session.quotes.get(index) {
            Some(quote) => {
                self.session.selected_quote = Some(quote.clone());
                true
            }
            None => false,
        }
    }

    /// Total presented to the shopper at payment: cart total plus the
    /// selected quote's normalized price.
    #[must_use]
    pub fn order_total(&self) -> Decimal {
        let shipping = self
            .session
            .selected_quote
            .as_ref()
            .and_then(ShippingQuote::price)
            .unwrap_or(Decimal::ZERO);

        self.cart.cart().total() + shipping
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit the order to the payment gateway.
    ///
    /// Only reachable from the confirmation step, with payment data
    /// re-validated and duplicate submissions rejected while one is in
    /// flight. On success the cart is cleared (and flushed to storage)
    /// and the created-order id is returned; on failure the cart and the
    /// step are untouched so the shopper can retry.
    ///
    /// # Errors
    ///
    /// Returns `NotAtConfirmation`, `AlreadyProcessing`, a
    /// `ValidationError`, or `PaymentFailed` with the gateway cause.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<String, CheckoutError> {
        if self.session.step != CheckoutStep::Confirmation {
            return Err(CheckoutError::NotAtConfirmation);
        }
        if self.session.is_processing {
            return Err(CheckoutError::AlreadyProcessing);
        }
        validate_payment(self.session.payment_method, &self.session.card)?;

        let cpf =
            Cpf::parse(&self.session.customer.cpf).map_err(|_| ValidationError::InvalidCpf)?;

        let now = Utc::now();
        let order = build_order_request(
            &self.session.customer,
            &cpf,
            &self.session.address,
            self.cart.cart().items(),
            now,
        );

        let method = match self.session.payment_method {
            PaymentSelection::CreditCard => {
                let card = &self.session.card;
                let phone = order.customer.phones.first().cloned().unwrap_or(Phone {
                    country: PHONE_COUNTRY.to_string(),
                    area: String::new(),
                    number: String::new(),
                });
                PaymentMethod::credit_card(
                    CardDetails {
                        number: card.number.clone(),
                        exp_month: card.exp_month.clone(),
                        exp_year: card.exp_year.clone(),
                        security_code: card.security_code.clone(),
                        holder_name: card.holder_name.clone(),
                        holder_birth_date: card.holder_birth_date.clone(),
                        holder_tax_id: card.holder_cpf.clone(),
                    },
                    order.customer.address.clone(),
                    phone,
                )
            }
            PaymentSelection::Boleto => PaymentMethod::boleto(&order.customer, now),
            PaymentSelection::Pix => PaymentMethod::pix(),
        };

        self.session.is_processing = true;
        let result = self.payments.create_order(order, method).await;
        self.session.is_processing = false;

        match result {
            Ok(created) => {
                self.cart.dispatch(CartCommand::Clear);
                self.cart.flush().await;
                Ok(created.id)
            }
            Err(e) => {
                tracing::error!("payment dispatch failed: {e}");
                Err(CheckoutError::PaymentFailed(e))
            }
        }
    }
}

// =============================================================================
// Payload Assembly
// =============================================================================

/// Build the gateway order payload from the session forms and cart items.
#[must_use]
pub fn build_order_request(
    customer: &CustomerForm,
    cpf: &Cpf,
    address: &AddressForm,
    items: &[CartItem],
    now: DateTime<Utc>,
) -> OrderRequest {
    let gateway_address = to_gateway_address(address);
    let (area, subscriber) = split_phone(&customer.phone);

    OrderRequest {
        reference_id: order_reference(now),
        customer: Customer {
            name: customer.name.clone(),
            email: customer.email.clone(),
            tax_id: cpf.as_str().to_owned(),
            phones: vec![Phone {
                country: PHONE_COUNTRY.to_string(),
                area,
                number: subscriber,
            }],
            address: gateway_address.clone(),
        },
        items: items
            .iter()
            .map(|item| OrderItem {
                id: item.id.to_string(),
                description: item.title.clone(),
                amount: centavos(item.price),
                quantity: item.quantity,
                weight: ITEM_WEIGHT_GRAMS,
            })
            .collect(),
        shipping: Shipping {
            address: gateway_address,
        },
    }
}

fn to_gateway_address(address: &AddressForm) -> GatewayAddress {
    GatewayAddress {
        street: address.street.clone(),
        number: address.number.clone(),
        complement: (!address.complement.is_empty()).then(|| address.complement.clone()),
        district: address.district.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        country: "BR".to_string(),
        postal_code: address.cep.clone(),
    }
}

/// Split a phone into its 2-digit area code and subscriber number,
/// stripping any formatting first.
fn split_phone(phone: &str) -> (String, String) {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 2 {
        return (digits, String::new());
    }
    let (area, number) = digits.split_at(2);
    (area.to_string(), number.to_string())
}

/// Price in integer centavos, rounded half-up from the decimal amount.
fn centavos(price: Decimal) -> i64 {
    (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
