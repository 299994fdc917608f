use thiserror::Error;

use crate::api::ApiError;
use crate::orchestrator::TranslateError;

/// Process exit codes.
pub mod codes {
    /// Transport, configuration or any unclassified failure.
    pub const FAILURE: u8 = 1;
    /// The server rejected the request or never produced a result.
    pub const REJECTED: u8 = 2;
    /// The input was refused: bad error code, bad IP, access denied.
    pub const INVALID_INPUT: u8 = 3;
    /// A required option is missing or malformed.
    pub const INVALID_ARGUMENT: u8 = 4;
}

#[derive(Debug, Error)]
pub enum DiagError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Diagnostic API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("Something went wrong, re-run with --debug. Response code: {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("translation for request {request_id} is not available (status {status})")]
    TranslationUnavailable { request_id: String, status: u16 },

    #[error("Provided IP address is not a valid IPv4 address: {0}")]
    InvalidIp(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiagError {
    pub fn exit_code(&self) -> u8 {
        match self {
            DiagError::Translate(err) => match err {
                TranslateError::SubmitRejected { .. } | TranslateError::Exhausted { .. } => {
                    codes::REJECTED
                }
                TranslateError::InvalidErrorCode { .. } | TranslateError::AccessDenied { .. } => {
                    codes::INVALID_INPUT
                }
                TranslateError::Transport(_) | TranslateError::MalformedResult(_) => {
                    codes::FAILURE
                }
            },
            DiagError::UnexpectedStatus { .. } => codes::REJECTED,
            DiagError::TranslationUnavailable { .. } | DiagError::InvalidIp(_) => {
                codes::INVALID_INPUT
            }
            DiagError::InvalidArgument(_) => codes::INVALID_ARGUMENT,
            DiagError::Config(_)
            | DiagError::Api(_)
            | DiagError::Io(_)
            | DiagError::Json(_) => codes::FAILURE,
        }
    }

    /// Body the server sent with the failure, to be shown to the user verbatim.
    pub fn server_body(&self) -> Option<&str> {
        match self {
            DiagError::Translate(err) => err.server_body(),
            DiagError::UnexpectedStatus { body, .. } if !body.is_empty() => Some(body.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_failures_map_to_exit_codes() {
        let cases = [
            (
                TranslateError::SubmitRejected {
                    status: 500,
                    body: String::new(),
                },
                2,
            ),
            (TranslateError::Exhausted { attempts: 49 }, 2),
            (
                TranslateError::InvalidErrorCode {
                    body: String::new(),
                },
                3,
            ),
            (
                TranslateError::AccessDenied {
                    body: String::new(),
                },
                3,
            ),
            (
                TranslateError::Transport(ApiError::Network {
                    detail: "down".into(),
                }),
                1,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(DiagError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn validation_errors_map_to_exit_codes() {
        assert_eq!(DiagError::InvalidIp("1.2.3".into()).exit_code(), 3);
        assert_eq!(DiagError::InvalidArgument("x".into()).exit_code(), 4);
        assert_eq!(DiagError::Config("x".into()).exit_code(), 1);
        let unavailable = DiagError::TranslationUnavailable {
            request_id: "req-1".into(),
            status: 404,
        };
        assert_eq!(unavailable.exit_code(), 3);
        assert_eq!(unavailable.server_body(), None);
    }

    #[test]
    fn unexpected_status_surfaces_body() {
        let err = DiagError::UnexpectedStatus {
            status: 404,
            body: r#"{"title":"Not Found"}"#.into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.server_body(), Some(r#"{"title":"Not Found"}"#));
        assert_eq!(
            err.to_string(),
            "Something went wrong, re-run with --debug. Response code: 404"
        );

        let empty = DiagError::UnexpectedStatus {
            status: 500,
            body: String::new(),
        };
        assert_eq!(empty.server_body(), None);
    }

    #[test]
    fn translate_display_is_transparent() {
        let err = DiagError::from(TranslateError::Exhausted { attempts: 3 });
        assert_eq!(
            err.to_string(),
            "operation took too long: no translation after 3 attempts"
        );
    }
}
