//! PagSeguro order-creation client.
//!
//! Submits a checkout order (customer, items, shipping address, one
//! charge) to the payment gateway and returns the created order. The
//! charge carries a payment-method block: single-capture credit card,
//! boleto with a 3-day due date, or PIX with a 1-hour expiry window.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Sandbox API base URL.
pub const SANDBOX_URL: &str = "https://sandbox.api.pagseguro.com";

/// Production API base URL.
pub const PRODUCTION_URL: &str = "https://api.pagseguro.com";

/// Days until a boleto expires, counted from submission.
pub const BOLETO_DUE_DAYS: i64 = 3;

/// Seconds until a PIX charge expires.
pub const PIX_EXPIRY_SECONDS: u64 = 3600;

/// Request timeout for order submission.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the order.
    #[error("gateway error: {status} - {message}")]
    Api { status: u16, message: String },
}

// =============================================================================
// Wire Types
// =============================================================================

/// A postal address in the gateway's schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAddress {
    pub street: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// A phone number split into country, area, and subscriber parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Phone {
    pub country: String,
    pub area: String,
    pub number: String,
}

/// The buyer block of an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    #[serde(rename = "taxId")]
    pub tax_id: String,
    pub phones: Vec<Phone>,
    pub address: GatewayAddress,
}

/// One purchased item. `amount` is the unit price in centavos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub id: String,
    pub description: String,
    pub amount: i64,
    pub quantity: u32,
    /// Shipping weight in grams.
    pub weight: u32,
}

/// The shipping block of an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shipping {
    pub address: GatewayAddress,
}

/// An order before its charge is attached.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrderRequest {
    pub reference_id: String,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub shipping: Shipping,
}

/// A monetary amount in centavos with its currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Amount {
    pub value: i64,
    pub currency: String,
}

/// Card details for a credit-card charge.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub number: String,
    pub exp_month: String,
    pub exp_year: String,
    pub security_code: String,
    pub holder: CardHolder,
}

/// The card holder block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardHolder {
    pub name: String,
    pub birth_date: String,
    pub tax_id: String,
    pub billing_address: GatewayAddress,
    pub phone: Phone,
}

/// Boleto instruction lines printed on the slip.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstructionLines {
    pub line1: String,
    pub line2: String,
}

/// The boleto holder block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoletoHolder {
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub address: GatewayAddress,
}

/// Boleto payment data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Boleto {
    /// Due date in `YYYY-MM-DD`.
    pub due_date: String,
    pub instruction_lines: InstructionLines,
    pub holder: BoletoHolder,
}

/// PIX payment data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pix {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

/// The payment-method block of a charge.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum PaymentMethod {
    #[serde(rename = "CREDIT_CARD")]
    CreditCard {
        installments: u32,
        capture: bool,
        card: Card,
    },
    #[serde(rename = "BOLETO")]
    Boleto { boleto: Boleto },
    #[serde(rename = "PIX")]
    Pix { pix: Pix },
}

/// Card fields collected at the payment step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: String,
    pub exp_year: String,
    pub security_code: String,
    pub holder_name: String,
    pub holder_birth_date: String,
    pub holder_tax_id: String,
}

impl PaymentMethod {
    /// A single-installment, immediate-capture credit-card charge.
    ///
    /// Spaces are stripped from the card number and non-digits from the
    /// holder's tax id. Billing address and phone come from the buyer.
    #[must_use]
    pub fn credit_card(details: CardDetails, billing_address: GatewayAddress, phone: Phone) -> Self {
        Self::CreditCard {
            installments: 1,
            capture: true,
            card: Card {
                number: details.number.replace(' ', ""),
                exp_month: details.exp_month,
                exp_year: details.exp_year,
                security_code: details.security_code,
                holder: CardHolder {
                    name: details.holder_name,
                    birth_date: details.holder_birth_date,
                    tax_id: details
                        .holder_tax_id
                        .chars()
                        .filter(char::is_ascii_digit)
                        .collect(),
                    billing_address,
                    phone,
                },
            },
        }
    }

    /// A boleto charge due [`BOLETO_DUE_DAYS`] days after `now`.
    #[must_use]
    pub fn boleto(customer: &Customer, now: DateTime<Utc>) -> Self {
        Self::Boleto {
            boleto: Boleto {
                due_date: boleto_due_date(now),
                instruction_lines: InstructionLines {
                    line1: "Pagamento processado via PagSeguro".to_string(),
                    line2: "Após o pagamento, seu pedido será processado".to_string(),
                },
                holder: BoletoHolder {
                    name: customer.name.clone(),
                    tax_id: customer.tax_id.clone(),
                    email: customer.email.clone(),
                    address: customer.address.clone(),
                },
            },
        }
    }

    /// A PIX charge expiring [`PIX_EXPIRY_SECONDS`] seconds after creation.
    #[must_use]
    pub const fn pix() -> Self {
        Self::Pix {
            pix: Pix {
                expires_in: PIX_EXPIRY_SECONDS,
            },
        }
    }
}

/// One charge of an order: the full order total with its payment method.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Charge {
    pub reference_id: String,
    pub description: String,
    pub amount: Amount,
    pub payment_method: PaymentMethod,
}

/// The complete payload sent to the gateway.
#[derive(Debug, Serialize)]
struct OrderPayload {
    #[serde(flatten)]
    order: OrderRequest,
    charges: Vec<Charge>,
}

/// The created order returned by the gateway. The full schema is owned by
/// the gateway; only the fields the store consumes are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    pub id: String,
    pub reference_id: String,
    #[serde(default)]
    pub charges: Vec<CreatedCharge>,
}

/// A charge of a created order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCharge {
    pub id: String,
    pub status: String,
}

/// Gateway error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_messages: Vec<serde_json::Value>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Time-based order reference, unique per submission.
#[must_use]
pub fn order_reference(now: DateTime<Utc>) -> String {
    format!("PED-{}", now.timestamp_millis())
}

/// Boleto due date: [`BOLETO_DUE_DAYS`] days after `now`, as `YYYY-MM-DD`.
#[must_use]
pub fn boleto_due_date(now: DateTime<Utc>) -> String {
    (now + chrono::Duration::days(BOLETO_DUE_DAYS))
        .format("%Y-%m-%d")
        .to_string()
}

/// Order total in centavos: sum of unit amount times quantity.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> i64 {
    items
        .iter()
        .map(|item| item.amount * i64::from(item.quantity))
        .sum()
}

// =============================================================================
// PagSeguroClient
// =============================================================================

/// Order submission, as required by the checkout workflow.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order carrying one charge with the given payment method.
    async fn create_order(
        &self,
        order: OrderRequest,
        method: PaymentMethod,
    ) -> Result<CreatedOrder, GatewayError>;
}

/// Client for the PagSeguro orders API.
#[derive(Clone)]
pub struct PagSeguroClient {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl PagSeguroClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }
}

#[async_trait]
impl PaymentGateway for PagSeguroClient {
    #[instrument(skip(self, order, method), fields(reference_id = %order.reference_id))]
    async fn create_order(
        &self,
        order: OrderRequest,
        method: PaymentMethod,
    ) -> Result<CreatedOrder, GatewayError> {
        let reference_id = order.reference_id.clone();
        let total = order_total(&order.items);

        let payload = OrderPayload {
            charges: vec![Charge {
                reference_id: reference_id.clone(),
                description: format!("Pedido {reference_id}"),
                amount: Amount {
                    value: total,
                    currency: "BRL".to_string(),
                },
                payment_method: method,
            }],
            order,
        };

        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .bearer_auth(self.token.expose_secret())
            // The reference doubles as the idempotency key so a retried
            // submission cannot create a second order.
            .header("x-idempotency-key", &reference_id)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| {
                    body.error_messages
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn address() -> GatewayAddress {
        GatewayAddress {
            street: "Praça da Sé".to_string(),
            number: "100".to_string(),
            complement: None,
            district: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            country: "BR".to_string(),
            postal_code: "01001000".to_string(),
        }
    }

    fn customer() -> Customer {
        Customer {
            name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            tax_id: "52998224725".to_string(),
            phones: vec![Phone {
                country: "55".to_string(),
                area: "11".to_string(),
                number: "999998888".to_string(),
            }],
            address: address(),
        }
    }

    #[test]
    fn test_order_reference_is_time_based() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(order_reference(now), format!("PED-{}", now.timestamp_millis()));
    }

    #[test]
    fn test_boleto_due_date_three_days_out() {
        let now = Utc.with_ymd_and_hms(2024, 2, 28, 23, 0, 0).unwrap();
        assert_eq!(boleto_due_date(now), "2024-03-02");
    }

    #[test]
    fn test_order_total_sums_line_amounts() {
        let items = vec![
            OrderItem {
                id: "1".to_string(),
                description: "Book".to_string(),
                amount: 3500,
                quantity: 2,
                weight: 500,
            },
            OrderItem {
                id: "2".to_string(),
                description: "Other".to_string(),
                amount: 1990,
                quantity: 1,
                weight: 500,
            },
        ];

        assert_eq!(order_total(&items), 8990);
    }

    #[test]
    fn test_credit_card_method_normalizes_inputs() {
        let details = CardDetails {
            number: "4111 1111 1111 1111".to_string(),
            exp_month: "12".to_string(),
            exp_year: "2030".to_string(),
            security_code: "123".to_string(),
            holder_name: "MARIA SILVA".to_string(),
            holder_birth_date: "1990-01-01".to_string(),
            holder_tax_id: "529.982.247-25".to_string(),
        };

        let method = PaymentMethod::credit_card(
            details,
            address(),
            Phone {
                country: "55".to_string(),
                area: "11".to_string(),
                number: "999998888".to_string(),
            },
        );

        let PaymentMethod::CreditCard {
            installments,
            capture,
            card,
        } = method
        else {
            panic!("expected credit card method");
        };

        assert_eq!(installments, 1);
        assert!(capture);
        assert_eq!(card.number, "4111111111111111");
        assert_eq!(card.holder.tax_id, "52998224725");
    }

    #[test]
    fn test_payment_method_wire_format() {
        let json = serde_json::to_value(PaymentMethod::pix()).unwrap();
        assert_eq!(json["type"], "PIX");
        assert_eq!(json["pix"]["expiresIn"], 3600);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(PaymentMethod::boleto(&customer(), now)).unwrap();
        assert_eq!(json["type"], "BOLETO");
        assert_eq!(json["boleto"]["dueDate"], "2024-03-04");
        assert_eq!(json["boleto"]["holder"]["taxId"], "52998224725");
    }

    #[test]
    fn test_charge_serializes_snake_and_camel_fields() {
        let charge = Charge {
            reference_id: "PED-1".to_string(),
            description: "Pedido PED-1".to_string(),
            amount: Amount {
                value: 8550,
                currency: "BRL".to_string(),
            },
            payment_method: PaymentMethod::pix(),
        };

        let json = serde_json::to_value(&charge).unwrap();
        assert_eq!(json["reference_id"], "PED-1");
        assert_eq!(json["amount"]["value"], 8550);
        assert_eq!(json["payment_method"]["type"], "PIX");
    }

    #[test]
    fn test_address_serializes_postal_code_camel_case() {
        let json = serde_json::to_value(address()).unwrap();
        assert_eq!(json["postalCode"], "01001000");
        assert!(json.get("complement").is_none());
    }

    #[test]
    fn test_created_order_deserializes_minimal_body() {
        let body = r#"{
            "id": "ORDE_ABC",
            "reference_id": "PED-1",
            "charges": [{"id": "CHAR_X", "status": "PAID", "extra": 1}],
            "unmodeled": {"field": true}
        }"#;

        let order: CreatedOrder = serde_json::from_str(body).unwrap();
        assert_eq!(order.id, "ORDE_ABC");
        assert_eq!(order.charges[0].status, "PAID");
    }
}
