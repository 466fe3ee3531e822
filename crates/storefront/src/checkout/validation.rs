//! Per-step validation gates.
//!
//! A failed validation blocks the step transition and carries the message
//! shown to the shopper; it never corrupts session state.

use thiserror::Error;

use movase_core::{Cep, Cpf, Uf};

use super::session::{AddressForm, CardForm, CustomerForm, PaymentSelection};
use crate::services::correios::ShippingQuote;

/// User-facing validation failures, one per gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Preencha todos os dados pessoais")]
    MissingPersonalData,
    #[error("CPF inválido")]
    InvalidCpf,
    #[error("Preencha todos os dados do endereço")]
    MissingAddressData,
    #[error("CEP inválido")]
    InvalidCep,
    #[error("UF inválida")]
    InvalidState,
    #[error("Selecione uma opção de frete")]
    ShippingNotSelected,
    #[error("Preencha todos os dados do cartão")]
    MissingCardData,
}

/// Personal-data gate: all four fields present and a CPF that passes the
/// check-digit validation.
///
/// # Errors
///
/// Returns the first failed check as a user-facing `ValidationError`.
pub fn validate_personal_data(form: &CustomerForm) -> Result<(), ValidationError> {
    if form.name.is_empty() || form.email.is_empty() || form.cpf.is_empty() || form.phone.is_empty()
    {
        return Err(ValidationError::MissingPersonalData);
    }

    if Cpf::parse(&form.cpf).is_err() {
        return Err(ValidationError::InvalidCpf);
    }

    Ok(())
}

/// Address gate: every field but the complement present, a well-formed
/// CEP, and a two-letter uppercase state code.
///
/// # Errors
///
/// Returns the first failed check as a user-facing `ValidationError`.
pub fn validate_address(form: &AddressForm) -> Result<(), ValidationError> {
    if form.cep.is_empty()
        || form.street.is_empty()
        || form.number.is_empty()
        || form.district.is_empty()
        || form.city.is_empty()
        || form.state.is_empty()
    {
        return Err(ValidationError::MissingAddressData);
    }

    if Cep::parse(&form.cep).is_err() {
        return Err(ValidationError::InvalidCep);
    }

    if Uf::parse(&form.state).is_err() {
        return Err(ValidationError::InvalidState);
    }

    Ok(())
}

/// Shipping gate: a quote must be selected.
///
/// # Errors
///
/// Returns `ShippingNotSelected` when no quote is selected.
pub fn validate_shipping(selected: Option<&ShippingQuote>) -> Result<(), ValidationError> {
    if selected.is_none() {
        return Err(ValidationError::ShippingNotSelected);
    }
    Ok(())
}

/// Payment gate: card payments require the full card form; boleto and
/// PIX need nothing further.
///
/// # Errors
///
/// Returns `MissingCardData` when a required card field is empty.
pub fn validate_payment(
    method: PaymentSelection,
    card: &CardForm,
) -> Result<(), ValidationError> {
    if method == PaymentSelection::CreditCard
        && (card.number.is_empty()
            || card.exp_month.is_empty()
            || card.exp_year.is_empty()
            || card.security_code.is_empty()
            || card.holder_name.is_empty())
    {
        return Err(ValidationError::MissingCardData);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_customer() -> CustomerForm {
        CustomerForm {
            name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            cpf: "529.982.247-25".to_string(),
            phone: "11999998888".to_string(),
        }
    }

    fn valid_address() -> AddressForm {
        AddressForm {
            cep: "01001000".to_string(),
            street: "Praça da Sé".to_string(),
            number: "100".to_string(),
            complement: String::new(),
            district: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        }
    }

    #[test]
    fn test_personal_data_valid() {
        assert!(validate_personal_data(&valid_customer()).is_ok());
    }

    #[test]
    fn test_personal_data_empty_email() {
        let mut form = valid_customer();
        form.email = String::new();
        assert_eq!(
            validate_personal_data(&form),
            Err(ValidationError::MissingPersonalData)
        );
    }

    #[test]
    fn test_personal_data_repeated_digit_cpf() {
        let mut form = valid_customer();
        form.cpf = "111.111.111-11".to_string();
        assert_eq!(
            validate_personal_data(&form),
            Err(ValidationError::InvalidCpf)
        );
    }

    #[test]
    fn test_personal_data_tampered_cpf() {
        let mut form = valid_customer();
        form.cpf = "529.982.247-24".to_string();
        assert_eq!(
            validate_personal_data(&form),
            Err(ValidationError::InvalidCpf)
        );
    }

    #[test]
    fn test_address_valid() {
        assert!(validate_address(&valid_address()).is_ok());
    }

    #[test]
    fn test_address_complement_is_optional() {
        let form = valid_address();
        assert!(form.complement.is_empty());
        assert!(validate_address(&form).is_ok());
    }

    #[test]
    fn test_address_missing_district() {
        let mut form = valid_address();
        form.district = String::new();
        assert_eq!(
            validate_address(&form),
            Err(ValidationError::MissingAddressData)
        );
    }

    #[test]
    fn test_address_short_cep() {
        let mut form = valid_address();
        form.cep = "0100100".to_string();
        assert_eq!(validate_address(&form), Err(ValidationError::InvalidCep));
    }

    #[test]
    fn test_address_lowercase_state() {
        let mut form = valid_address();
        form.state = "sp".to_string();
        assert_eq!(validate_address(&form), Err(ValidationError::InvalidState));
    }

    #[test]
    fn test_shipping_requires_selection() {
        assert_eq!(
            validate_shipping(None),
            Err(ValidationError::ShippingNotSelected)
        );

        let quote = ShippingQuote {
            error_code: "0".to_string(),
            ..ShippingQuote::default()
        };
        assert!(validate_shipping(Some(&quote)).is_ok());
    }

    #[test]
    fn test_payment_card_requires_all_fields() {
        let card = CardForm {
            number: "4111111111111111".to_string(),
            exp_month: "12".to_string(),
            exp_year: "2030".to_string(),
            security_code: "123".to_string(),
            holder_name: "MARIA SILVA".to_string(),
            ..CardForm::default()
        };
        assert!(validate_payment(PaymentSelection::CreditCard, &card).is_ok());

        let mut missing = card;
        missing.security_code = String::new();
        assert_eq!(
            validate_payment(PaymentSelection::CreditCard, &missing),
            Err(ValidationError::MissingCardData)
        );
    }

    #[test]
    fn test_payment_boleto_and_pix_need_no_card() {
        let empty = CardForm::default();
        assert!(validate_payment(PaymentSelection::Boleto, &empty).is_ok());
        assert!(validate_payment(PaymentSelection::Pix, &empty).is_ok());
    }
}
