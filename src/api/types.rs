//! Tipos de dados trocados com a Diagnostic Tools API.
//!
//! Inclui o código de erro normalizado ([`ErrorCode`]), o job de tradução
//! criado pelo servidor ([`Job`]), a resposta bruta de qualquer chamada
//! ([`ApiResponse`]) e os corpos JSON enviados nos endpoints POST.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;

/// Segundos somados ao `retryAfter` do servidor antes de cada consulta.
pub const POLL_INTERVAL_PADDING_SECS: u64 = 1;

/// Código de erro produzido por um edge server, já sem o `#` inicial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(String);

impl ErrorCode {
    /// Normaliza a entrada removendo os `#` iniciais. Nenhuma outra validação é feita.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim_start_matches('#').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Corpo retornado pelo servidor ao aceitar um pedido de tradução (HTTP 202).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    /// Token opaco usado para consultar o pedido.
    pub request_id: String,
    /// Link de polling sugerido pelo servidor.
    #[serde(default)]
    pub link: Option<String>,
    /// Intervalo sugerido, em segundos, antes da próxima consulta.
    #[serde(default)]
    pub retry_after: u64,
}

/// Um pedido de tradução aceito pelo servidor.
///
/// Criado uma única vez por execução e nunca alterado depois.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub retry_after_secs: u64,
    pub created_status: u16,
    pub link: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn from_request(request: TranslationRequest, created_status: u16) -> Self {
        Self {
            id: request.request_id,
            retry_after_secs: request.retry_after,
            created_status,
            link: request.link,
            submitted_at: Utc::now(),
        }
    }

    /// Intervalo fixo entre consultas: `retryAfter + 1` segundos.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs.saturating_add(POLL_INTERVAL_PADDING_SECS))
    }
}

/// Status e corpo de qualquer chamada que chegou a receber resposta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// Valor do cabeçalho `X-RateLimit-Remaining`, quando presente.
    pub rate_limit_remaining: Option<u64>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            rate_limit_remaining: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodifica o corpo JSON no tipo pedido.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Extrai um único campo de nível superior do corpo JSON.
    pub fn field(&self, name: &str) -> Result<Value, ApiError> {
        let mut value: Value = self.json()?;
        value
            .get_mut(name)
            .map(Value::take)
            .ok_or_else(|| ApiError::Parse {
                detail: format!("missing field `{name}` in response"),
            })
    }
}

/// Resultado do `submit`: a resposta bruta e, se o servidor aceitou, o job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub response: ApiResponse,
    pub job: Option<Job>,
}

impl Submission {
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// O servidor sinalizou limite de requisições: HTTP 429 ou
    /// `X-RateLimit-Remaining: 0`.
    pub fn is_rate_limited(&self) -> bool {
        self.response.status == 429 || self.response.rate_limit_remaining == Some(0)
    }
}

/// Payload final de uma tradução, repassado sem alterações.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslatedResult(pub Value);

impl TranslatedResult {
    /// Motivo da falha informado pelo servidor, se houver.
    pub fn reason_for_failure(&self) -> Option<&str> {
        self.0
            .pointer("/translatedError/reasonForFailure")
            .or_else(|| self.0.get("reasonForFailure"))
            .and_then(Value::as_str)
    }
}

/// Origem de um teste de dig/mtr/curl: um IP da rede ou uma ghost location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    IpAddress(std::net::Ipv4Addr),
    GhostLocation(String),
}

impl Target {
    pub(crate) fn collection(&self) -> &'static str {
        match self {
            Target::IpAddress(_) => "ip-addresses",
            Target::GhostLocation(_) => "ghost-locations",
        }
    }

    pub(crate) fn id(&self) -> String {
        match self {
            Target::IpAddress(ip) => ip.to_string(),
            Target::GhostLocation(location) => location.clone(),
        }
    }
}

/// Corpo do POST de `curl-results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurlRequest {
    pub url: String,
    pub user_agent: String,
}

/// Corpo do POST de `diagnostic-url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticLinkRequest {
    pub end_user_name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_strips_leading_hash() {
        assert_eq!(ErrorCode::new("#404-error").as_str(), "404-error");
        assert_eq!(ErrorCode::new("404-error").as_str(), "404-error");
        assert_eq!(
            ErrorCode::new("#30.7c6c1302.1570807092.2b1c5e34").to_string(),
            "30.7c6c1302.1570807092.2b1c5e34"
        );
    }

    #[test]
    fn translation_request_deserialize_from_api_format() {
        let api_json = r#"{
            "requestId": "8f3f6a9c",
            "link": "/diagnostic-tools/v2/translate-error-requests/8f3f6a9c",
            "retryAfter": 5
        }"#;
        let req: TranslationRequest = serde_json::from_str(api_json).unwrap();
        assert_eq!(req.request_id, "8f3f6a9c");
        assert_eq!(req.retry_after, 5);
        assert!(req.link.unwrap().ends_with("8f3f6a9c"));
    }

    #[test]
    fn translation_request_missing_retry_after_defaults_to_zero() {
        let req: TranslationRequest = serde_json::from_str(r#"{"requestId":"x"}"#).unwrap();
        assert_eq!(req.retry_after, 0);
        assert!(req.link.is_none());
    }

    #[test]
    fn job_poll_interval_adds_padding() {
        let job = Job::from_request(
            TranslationRequest {
                request_id: "abc".into(),
                link: None,
                retry_after: 5,
            },
            202,
        );
        assert_eq!(job.poll_interval(), Duration::from_secs(6));
        assert_eq!(job.created_status, 202);
    }

    #[test]
    fn submission_rate_limit_signals() {
        let throttled = Submission {
            response: ApiResponse::new(429, "{}"),
            job: None,
        };
        assert!(throttled.is_rate_limited());

        let mut response = ApiResponse::new(202, "{}");
        response.rate_limit_remaining = Some(0);
        let last_slot = Submission {
            response,
            job: None,
        };
        assert!(last_slot.is_rate_limited());

        let mut response = ApiResponse::new(202, "{}");
        response.rate_limit_remaining = Some(12);
        let plenty = Submission {
            response,
            job: None,
        };
        assert!(!plenty.is_rate_limited());
    }

    #[test]
    fn response_field_extraction() {
        let resp = ApiResponse::new(200, r#"{"geoLocation":{"city":"TOKYO"},"other":1}"#);
        let geo = resp.field("geoLocation").unwrap();
        assert_eq!(geo["city"], "TOKYO");

        let missing = resp.field("locations").unwrap_err();
        assert!(missing.to_string().contains("locations"));
    }

    #[test]
    fn curl_request_uses_camel_case() {
        let body = CurlRequest {
            url: "https://example.com".into(),
            user_agent: "Chrome".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""userAgent":"Chrome""#));
    }

    #[test]
    fn translated_result_reason_lookup() {
        let nested = TranslatedResult(serde_json::json!({
            "translatedError": {"reasonForFailure": "Connection timed out"}
        }));
        assert_eq!(nested.reason_for_failure(), Some("Connection timed out"));

        let opaque = TranslatedResult(serde_json::json!({"anything": true}));
        assert_eq!(opaque.reason_for_failure(), None);
    }
}
