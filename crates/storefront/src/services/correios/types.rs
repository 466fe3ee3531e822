//! Correios rate-lookup types and presentation helpers.

use rust_decimal::Decimal;

/// Correios service codes requested by the store.
pub mod service_codes {
    /// PAC (economy).
    pub const PAC: &str = "04510";
    /// SEDEX (express).
    pub const SEDEX: &str = "04014";
    /// SEDEX 10.
    pub const SEDEX_10: &str = "40215";
    /// SEDEX 12.
    pub const SEDEX_12: &str = "40290";
    /// SEDEX Hoje.
    pub const SEDEX_HOJE: &str = "40886";
}

/// Display name for a Correios service code.
#[must_use]
pub fn service_name(code: &str) -> &'static str {
    match code {
        service_codes::PAC => "PAC",
        service_codes::SEDEX => "SEDEX",
        service_codes::SEDEX_10 => "SEDEX 10",
        service_codes::SEDEX_12 => "SEDEX 12",
        service_codes::SEDEX_HOJE => "SEDEX Hoje",
        _ => "Serviço não identificado",
    }
}

/// A single carrier quote, one per `<cServico>` block.
///
/// Fields hold the literal element text as extracted from the XML; a
/// missing element is represented by an empty string. Typed accessors
/// normalize values before arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingQuote {
    /// `Codigo` - carrier service code.
    pub service_code: String,
    /// `Valor` - price with a locale comma separator (e.g. `15,50`).
    pub value: String,
    /// `PrazoEntrega` - delivery estimate in business days.
    pub delivery_days: String,
    /// `ValorSemAdicionais`.
    pub value_without_extras: String,
    /// `ValorMaoPropria`.
    pub own_hands_value: String,
    /// `ValorAvisoRecebimento`.
    pub receipt_notice_value: String,
    /// `ValorDeclarado`.
    pub declared_value: String,
    /// `EntregaDomiciliar` - `S`/`N` home-delivery flag.
    pub home_delivery: String,
    /// `EntregaSabado` - `S`/`N` Saturday-delivery flag.
    pub saturday_delivery: String,
    /// `Erro` - `0` means success; anything else makes the quote unusable.
    pub error_code: String,
    /// `MsgErro` - carrier message for a non-zero error code.
    pub error_message: String,
}

impl ShippingQuote {
    /// True when the carrier reported no error for this quote.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error_code == "0"
    }

    /// Price normalized from the locale comma form (`15,50` -> `15.50`).
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        self.value.replace(',', ".").parse().ok()
    }

    /// Delivery estimate in business days.
    #[must_use]
    pub fn days(&self) -> Option<u32> {
        self.delivery_days.parse().ok()
    }

    /// True when the service delivers to the door.
    #[must_use]
    pub fn delivers_home(&self) -> bool {
        self.home_delivery == "S"
    }

    /// True when the service delivers on Saturdays.
    #[must_use]
    pub fn delivers_saturday(&self) -> bool {
        self.saturday_delivery == "S"
    }

    /// Display name of the service.
    #[must_use]
    pub fn service_name(&self) -> &'static str {
        service_name(&self.service_code)
    }
}

/// How quote options are presented to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteSelection {
    /// Two fastest options (ascending delivery days).
    #[default]
    Fastest,
    /// Two cheapest options (ascending price).
    Cheapest,
    /// Every returned option.
    All,
}

/// Subset of quotes for presentation under the given selection mode.
///
/// `Fastest` and `Cheapest` return the top 2 options; `All` returns the
/// full set in carrier order.
#[must_use]
pub fn select_quotes(quotes: &[ShippingQuote], selection: QuoteSelection) -> Vec<ShippingQuote> {
    match selection {
        QuoteSelection::Fastest => {
            let mut sorted = quotes.to_vec();
            sorted.sort_by_key(|quote| quote.days().unwrap_or(u32::MAX));
            sorted.truncate(2);
            sorted
        }
        QuoteSelection::Cheapest => {
            let mut sorted = quotes.to_vec();
            sorted.sort_by_key(|quote| quote.price().unwrap_or(Decimal::MAX));
            sorted.truncate(2);
            sorted
        }
        QuoteSelection::All => quotes.to_vec(),
    }
}
