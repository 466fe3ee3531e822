//! Correios XML response parsing.
//!
//! The rate endpoint answers with a sequence of `<cServico>` blocks. The
//! format is bounded and trusted, so fields are pulled out by literal
//! sub-element extraction: a missing element yields an empty string for
//! that field, never a structural failure.

use std::sync::OnceLock;

use regex::Regex;

use super::types::ShippingQuote;

/// Matches one `<cServico>` block, across lines.
fn service_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<cServico>(.*?)</cServico>").expect("service block regex is valid")
    })
}

/// Literal text of the first `<name>...</name>` element in the block, or
/// an empty string when the element is absent.
fn extract_field(block: &str, name: &str) -> String {
    let open = format!("<{name}>");
    let close = format!("</{name}>");

    let Some(start) = block.find(&open) else {
        return String::new();
    };
    let rest = &block[start + open.len()..];
    let Some(end) = rest.find(&close) else {
        return String::new();
    };

    rest[..end].to_string()
}

/// One quote from one `<cServico>` block.
fn extract_quote(block: &str) -> ShippingQuote {
    ShippingQuote {
        service_code: extract_field(block, "Codigo"),
        value: extract_field(block, "Valor"),
        delivery_days: extract_field(block, "PrazoEntrega"),
        value_without_extras: extract_field(block, "ValorSemAdicionais"),
        own_hands_value: extract_field(block, "ValorMaoPropria"),
        receipt_notice_value: extract_field(block, "ValorAvisoRecebimento"),
        declared_value: extract_field(block, "ValorDeclarado"),
        home_delivery: extract_field(block, "EntregaDomiciliar"),
        saturday_delivery: extract_field(block, "EntregaSabado"),
        error_code: extract_field(block, "Erro"),
        error_message: extract_field(block, "MsgErro"),
    }
}

/// Parse a rate response body into its quotes, one per `<cServico>`
/// block. A body without blocks parses to an empty list.
#[must_use]
pub fn parse_rate_response(xml: &str) -> Vec<ShippingQuote> {
    service_block_regex()
        .captures_iter(xml)
        .filter_map(|captures| captures.get(1))
        .map(|block| extract_quote(block.as_str()))
        .collect()
}
