//! Tipos de erro para o cliente da Diagnostic Tools API.
//!
//! [`ApiError`] cobre apenas falhas de transporte: a chamada não chegou a
//! produzir uma resposta utilizável. Qualquer status HTTP retornado pelo
//! servidor (inclusive 4xx/5xx) é devolvido ao chamador como
//! [`ApiResponse`](super::ApiResponse) para que ele decida o que fazer.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com a Diagnostic Tools API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Falha de rede subjacente (DNS, conexão recusada, corpo truncado).
    #[error("network error: {detail}")]
    Network { detail: String },

    /// A requisição excedeu o timeout configurado.
    #[error("request timed out: {detail}")]
    Timeout { detail: String },

    /// O servidor respondeu com um corpo que não pôde ser decodificado.
    #[error("failed to parse API response: {detail}")]
    Parse { detail: String },

    /// O endpoint não pôde ser montado a partir do host configurado.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                detail: err.to_string(),
            }
        } else {
            ApiError::Network {
                detail: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_display() {
        let err = ApiError::Network {
            detail: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "network error: connection refused");
    }

    #[test]
    fn parse_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = ApiError::from(serde_err);
        assert!(matches!(err, ApiError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse API response"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
