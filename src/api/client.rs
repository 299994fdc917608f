use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, redirect};
use serde::Serialize;
use url::Url;

use super::auth::{Credentials, EdgeGridSigner};
use super::error::ApiError;
use super::types::{
    ApiResponse, CurlRequest, DiagnosticLinkRequest, ErrorCode, Job, Submission, Target,
    TranslationRequest,
};

const API_PREFIX: [&str; 2] = ["diagnostic-tools", "v2"];
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const LOG_BODY_LIMIT: usize = 512;

/// The three calls that make up an asynchronous error translation.
///
/// Implementations only map requests to responses: no retries, no sleeping,
/// no interpretation of the status beyond decoding an accepted submit.
pub trait TranslationApi {
    /// Launches a translation request for `code`.
    async fn submit(&self, code: &ErrorCode) -> Result<Submission, ApiError>;

    /// Checks whether a launched request has finished processing.
    async fn check(&self, request_id: &str) -> Result<ApiResponse, ApiError>;

    /// Retrieves the translated error for a launched request.
    async fn fetch(&self, request_id: &str) -> Result<ApiResponse, ApiError>;
}

/// HTTP client for the diagnostic tools API, signing every request with EdgeGrid.
pub struct DiagnosticClient {
    client: Client,
    base_url: Url,
    signer: EdgeGridSigner,
}

impl DiagnosticClient {
    /// Create a client for the host named in the credentials.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, ApiError> {
        let host = credentials.host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Self::with_base_url(credentials, &base_url, timeout)
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(
        credentials: Credentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(base_url.to_string()));
        }

        // A 303 from the status endpoint means "ready"; following it would hide that.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .user_agent(concat!("edgediag/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            signer: EdgeGridSigner::new(credentials),
        })
    }

    /// Checks whether the IP address belongs to the edge network.
    pub async fn cdn_status(&self, ip: std::net::Ipv4Addr) -> Result<ApiResponse, ApiError> {
        let ip = ip.to_string();
        self.get(&["ip-addresses", &ip, "is-cdn-ip"], &[]).await
    }

    /// Geolocation of an edge IP address.
    pub async fn geolocation(&self, ip: std::net::Ipv4Addr) -> Result<ApiResponse, ApiError> {
        let ip = ip.to_string();
        self.get(&["ip-addresses", &ip, "geo-location"], &[]).await
    }

    pub async fn dig(
        &self,
        target: &Target,
        hostname: &str,
        query_type: &str,
    ) -> Result<ApiResponse, ApiError> {
        let id = target.id();
        self.get(
            &[target.collection(), &id, "dig-info"],
            &[("hostName", hostname), ("queryType", query_type)],
        )
        .await
    }

    pub async fn mtr(
        &self,
        target: &Target,
        destination_domain: &str,
        resolve_dns: bool,
    ) -> Result<ApiResponse, ApiError> {
        let id = target.id();
        let resolve_dns = if resolve_dns { "true" } else { "false" };
        self.get(
            &[target.collection(), &id, "mtr-data"],
            &[
                ("destinationDomain", destination_domain),
                ("resolveDns", resolve_dns),
            ],
        )
        .await
    }

    pub async fn curl(&self, target: &Target, request: &CurlRequest) -> Result<ApiResponse, ApiError> {
        let id = target.id();
        self.post(&[target.collection(), &id, "curl-results"], request)
            .await
    }

    /// Lists the edge server locations that can run diagnostics.
    pub async fn ghost_locations(&self) -> Result<ApiResponse, ApiError> {
        self.get(&["ghost-locations", "available"], &[]).await
    }

    pub async fn gtm_properties(&self) -> Result<ApiResponse, ApiError> {
        self.get(&["gtm", "gtm-properties"], &[]).await
    }

    pub async fn gtm_property_ips(
        &self,
        property: &str,
        domain: &str,
    ) -> Result<ApiResponse, ApiError> {
        self.get(&["gtm", property, domain, "gtm-property-ips"], &[])
            .await
    }

    /// Generates a link an end user can load to report their network details.
    pub async fn generate_diagnostic_link(
        &self,
        request: &DiagnosticLinkRequest,
    ) -> Result<ApiResponse, ApiError> {
        self.post(&["end-users", "diagnostic-url"], request).await
    }

    pub async fn diagnostic_link_requests(&self) -> Result<ApiResponse, ApiError> {
        self.get(&["end-users", "ip-requests"], &[]).await
    }

    pub async fn diagnostic_link_details(&self, request_id: &str) -> Result<ApiResponse, ApiError> {
        self.get(&["end-users", "ip-requests", request_id, "ip-details"], &[])
            .await
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(segments, query)?;
        self.send(Method::GET, url, None).await
    }

    async fn post<T: Serialize>(&self, segments: &[&str], payload: &T) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(segments, &[])?;
        let body = serde_json::to_vec(payload)?;
        self.send(Method::POST, url, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ApiError> {
        tracing::debug!(%method, %url, "diagnostic api request");

        let authorization = self.signer.authorization(&method, &url, body.as_deref());
        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, authorization);
        if let Some(bytes) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let rate_limit_remaining = response
            .headers()
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await?;

        tracing::debug!(
            status,
            ?rate_limit_remaining,
            body = truncate_for_log(&body),
            "diagnostic api response"
        );

        Ok(ApiResponse {
            status,
            body,
            rate_limit_remaining,
        })
    }
}

impl TranslationApi for DiagnosticClient {
    async fn submit(&self, code: &ErrorCode) -> Result<Submission, ApiError> {
        let url = self.endpoint(&["errors", code.as_str(), "translate-error"], &[])?;
        let response = self.send(Method::POST, url, None).await?;

        let job = if response.status == 202 {
            let request: TranslationRequest = response.json()?;
            Some(Job::from_request(request, response.status))
        } else {
            None
        };

        Ok(Submission { response, job })
    }

    async fn check(&self, request_id: &str) -> Result<ApiResponse, ApiError> {
        self.get(&["translate-error-requests", request_id], &[])
            .await
    }

    async fn fetch(&self, request_id: &str) -> Result<ApiResponse, ApiError> {
        self.get(&["translate-error-requests", request_id, "translation"], &[])
            .await
    }
}

impl<T: TranslationApi> TranslationApi for &T {
    async fn submit(&self, code: &ErrorCode) -> Result<Submission, ApiError> {
        (**self).submit(code).await
    }

    async fn check(&self, request_id: &str) -> Result<ApiResponse, ApiError> {
        (**self).check(request_id).await
    }

    async fn fetch(&self, request_id: &str) -> Result<ApiResponse, ApiError> {
        (**self).fetch(request_id).await
    }
}

fn truncate_for_log(body: &str) -> &str {
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
