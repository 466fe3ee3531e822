//! Checkout orchestration.
//!
//! A linear five-step wizard: personal data, address, shipping, payment,
//! confirmation. Step transitions are gated by validation; the address
//! step drives shipping-quote computation; submission dispatches to the
//! payment gateway.

mod session;
mod validation;
mod workflow;

pub use session::{
    AddressForm, CardForm, CheckoutSession, CheckoutStep, CustomerForm, PaymentSelection,
};
pub use validation::{
    ValidationError, validate_address, validate_payment, validate_personal_data, validate_shipping,
};
pub use workflow::{
    CepChange, CheckoutError, CheckoutWorkflow, ITEM_WEIGHT_GRAMS, ITEM_WEIGHT_KG, PHONE_COUNTRY,
    WorkflowBuildError, build_order_request,
};
