pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::{Credentials, DEFAULT_MAX_BODY};
pub use client::{DiagnosticClient, TranslationApi};
pub use error::ApiError;
pub use types::{
    ApiResponse, CurlRequest, DiagnosticLinkRequest, ErrorCode, Job, Submission, Target,
    TranslatedResult,
};
