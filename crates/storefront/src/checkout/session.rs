//! Checkout session state.
//!
//! The session aggregates everything the wizard collects: the current
//! step, the customer/address/card forms, the shipping quotes, and the
//! loading flags callers use to disable re-entrant actions.

use crate::services::correios::ShippingQuote;

/// The ordered steps of the checkout wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CheckoutStep {
    #[default]
    PersonalData,
    Address,
    Shipping,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// The step after this one, or `None` at the last step.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::PersonalData => Some(Self::Address),
            Self::Address => Some(Self::Shipping),
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    /// The step before this one, or `None` at the first step.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::PersonalData => None,
            Self::Address => Some(Self::PersonalData),
            Self::Shipping => Some(Self::Address),
            Self::Payment => Some(Self::Shipping),
            Self::Confirmation => Some(Self::Payment),
        }
    }
}

/// The shopper's payment-method choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentSelection {
    #[default]
    CreditCard,
    Boleto,
    Pix,
}

/// Personal data collected at the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerForm {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
}

/// Address fields collected at the second step. `cep` holds the bare
/// digits as typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
    pub cep: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

/// Card fields collected at the payment step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardForm {
    pub number: String,
    pub exp_month: String,
    pub exp_year: String,
    pub security_code: String,
    pub holder_name: String,
    pub holder_birth_date: String,
    pub holder_cpf: String,
}

/// The workflow's aggregate state for one checkout attempt.
///
/// Created when checkout begins and discarded on success or on
/// navigating away.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    pub step: CheckoutStep,
    pub customer: CustomerForm,
    pub address: AddressForm,
    pub quotes: Vec<ShippingQuote>,
    pub selected_quote: Option<ShippingQuote>,
    pub payment_method: PaymentSelection,
    pub card: CardForm,
    /// CEP of the last successful quote request; guards duplicate and
    /// stale requests.
    pub last_quoted_cep: Option<String>,
    pub is_calculating_shipping: bool,
    pub is_looking_up_address: bool,
    pub is_processing: bool,
}
