//! Carrier rate proxy.
//!
//! `GET /api/correios?cep=<8 digits>&peso=<kg>` forwards a rate lookup to
//! the Correios calculator and passes the XML response through. When the
//! carrier itself is unreachable the proxy answers `200` with a synthetic
//! two-quote body instead of propagating the failure: checkout must never
//! be blocked solely by the carrier being down.

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::services::correios::{package, service_codes};
use crate::state::AppState;

/// Synthetic rate response used when the carrier is unreachable: one PAC
/// and one SEDEX quote with plausible price and lead time.
pub const FALLBACK_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Servicos>
  <cServico>
    <Codigo>04510</Codigo>
    <Valor>15,50</Valor>
    <PrazoEntrega>8</PrazoEntrega>
    <ValorSemAdicionais>15,50</ValorSemAdicionais>
    <ValorMaoPropria>0,00</ValorMaoPropria>
    <ValorAvisoRecebimento>0,00</ValorAvisoRecebimento>
    <ValorDeclarado>0,00</ValorDeclarado>
    <EntregaDomiciliar>S</EntregaDomiciliar>
    <EntregaSabado>N</EntregaSabado>
    <Erro>0</Erro>
    <MsgErro></MsgErro>
  </cServico>
  <cServico>
    <Codigo>04014</Codigo>
    <Valor>25,80</Valor>
    <PrazoEntrega>3</PrazoEntrega>
    <ValorSemAdicionais>25,80</ValorSemAdicionais>
    <ValorMaoPropria>0,00</ValorMaoPropria>
    <ValorAvisoRecebimento>0,00</ValorAvisoRecebimento>
    <ValorDeclarado>0,00</ValorDeclarado>
    <EntregaDomiciliar>S</EntregaDomiciliar>
    <EntregaSabado>N</EntregaSabado>
    <Erro>0</Erro>
    <MsgErro></MsgErro>
  </cServico>
</Servicos>"#;

/// Query parameters of the rate proxy.
#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub cep: Option<String>,
    pub peso: Option<String>,
}

/// Rate proxy handler.
///
/// # Errors
///
/// Returns `400` JSON when `cep`/`peso` are missing or the CEP is not 8
/// digits. Carrier unreachability is absorbed with [`FALLBACK_BODY`].
#[instrument(skip(state))]
pub async fn rate_lookup(
    State(state): State<AppState>,
    Query(query): Query<RateQuery>,
) -> Result<Response, AppError> {
    let (Some(cep), Some(peso)) = (query.cep, query.peso) else {
        return Err(AppError::BadRequest(
            "CEP e peso são obrigatórios".to_string(),
        ));
    };

    if cep.len() != 8 || !cep.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("CEP deve ter 8 dígitos".to_string()));
    }

    let url = upstream_url(&state, &cep, &peso);

    match fetch_upstream(&state, &url).await {
        Ok(xml) => {
            tracing::debug!(bytes = xml.len(), "carrier response received");
            Ok(xml_response(xml))
        }
        Err(e) => {
            tracing::warn!("carrier unreachable, answering with synthetic quotes: {e}");
            Ok(xml_response(FALLBACK_BODY.to_string()))
        }
    }
}

/// The full calculator URL for one lookup: both service tiers in one
/// call, fixed box dimensions, XML return format.
fn upstream_url(state: &AppState, cep: &str, peso: &str) -> String {
    let config = &state.config().correios;

    format!(
        "{}?nCdServico={},{}&sCepOrigem={}&sCepDestino={cep}&nVlPeso={peso}\
         &nCdFormato={}&nVlComprimento={}&nVlAltura={}&nVlLargura={}&nVlDiametro={}\
         &sCdMaoPropria=n&sCdAvisoRecebimento=n&nVlValorDeclarado=0&StrRetorno=xml",
        config.upstream_url,
        service_codes::PAC,
        service_codes::SEDEX,
        config.origin_cep.as_str(),
        package::FORMAT_BOX,
        package::LENGTH_CM,
        package::HEIGHT_CM,
        package::WIDTH_CM,
        package::DIAMETER_CM,
    )
}

/// Fetch the carrier response body; any transport failure or non-success
/// status is an error the caller absorbs with the fallback body.
async fn fetch_upstream(state: &AppState, url: &str) -> Result<String, reqwest::Error> {
    let response = state.upstream().get(url).send().await?;
    let response = response.error_for_status()?;
    response.text().await
}

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        body,
    )
        .into_response()
}
