//! EdgeGrid (`EG1-HMAC-SHA256`) request signing.
//!
//! Every call to the diagnostic API carries an `Authorization` header built
//! from the client credentials, a timestamp, a random nonce and an HMAC over
//! the request line and body hash.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "EG1-HMAC-SHA256";

/// Largest request body prefix included in the content hash.
pub const DEFAULT_MAX_BODY: usize = 131_072;

/// API client credentials, as found in an `.edgerc` section.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub client_token: String,
    pub client_secret: String,
    pub access_token: String,
    pub max_body: usize,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("client_token", &self.client_token)
            .field("client_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("max_body", &self.max_body)
            .finish()
    }
}

/// Builds `Authorization` headers for outgoing requests.
#[derive(Debug, Clone)]
pub struct EdgeGridSigner {
    credentials: Credentials,
}

impl EdgeGridSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Signs a request with a fresh timestamp and nonce.
    pub fn authorization(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> String {
        let timestamp = Utc::now().format("%Y%m%dT%H:%M:%S+0000").to_string();
        let nonce = Uuid::new_v4().to_string();
        self.sign(method, url, body, &timestamp, &nonce)
    }

    pub(crate) fn sign(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        timestamp: &str,
        nonce: &str,
    ) -> String {
        let auth_header = format!(
            "{ALGORITHM} client_token={};access_token={};timestamp={timestamp};nonce={nonce};",
            self.credentials.client_token, self.credentials.access_token
        );

        let host = match url.port() {
            Some(port) => format!("{}:{port}", url.host_str().unwrap_or_default()),
            None => url.host_str().unwrap_or_default().to_string(),
        };
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        // Signed headers are not used by the diagnostic API, so that slot stays empty.
        let data_to_sign = [
            method.as_str(),
            url.scheme(),
            &host,
            &path,
            "",
            &self.content_hash(method, body),
            &auth_header,
        ]
        .join("\t");

        tracing::trace!(%data_to_sign, "edgegrid data to sign");

        let signing_key = BASE64.encode(hmac_sha256(
            self.credentials.client_secret.as_bytes(),
            timestamp.as_bytes(),
        ));
        let signature = BASE64.encode(hmac_sha256(
            signing_key.as_bytes(),
            data_to_sign.as_bytes(),
        ));

        format!("{auth_header}signature={signature}")
    }

    fn content_hash(&self, method: &Method, body: Option<&[u8]>) -> String {
        match body {
            Some(bytes) if *method == Method::POST && !bytes.is_empty() => {
                let end = bytes.len().min(self.credentials.max_body);
                BASE64.encode(Sha256::digest(&bytes[..end]))
            }
            _ => String::new(),
        }
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMESTAMP: &str = "20261016T12:00:00+0000";
    const NONCE: &str = "nonce-xx-xx";

    fn signer() -> EdgeGridSigner {
        EdgeGridSigner::new(Credentials {
            host: "akab-test.luna.akamaiapis.net".into(),
            client_token: "akab-client-token".into(),
            client_secret: "c2VjcmV0".into(),
            access_token: "akab-access-token".into(),
            max_body: DEFAULT_MAX_BODY,
        })
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://akab-test.luna.akamaiapis.net{path}")).unwrap()
    }

    fn signature_of(header: &str) -> &str {
        header
            .split("signature=")
            .nth(1)
            .expect("missing signature= in header")
    }

    #[test]
    fn header_carries_tokens_timestamp_and_nonce() {
        let header = signer().sign(&Method::GET, &url("/x"), None, TIMESTAMP, NONCE);
        assert!(header.starts_with("EG1-HMAC-SHA256 client_token=akab-client-token;"));
        assert!(header.contains("access_token=akab-access-token;"));
        assert!(header.contains(&format!("timestamp={TIMESTAMP};")));
        assert!(header.contains(&format!("nonce={NONCE};")));
        assert!(!signature_of(&header).is_empty());
    }

    #[test]
    fn signing_is_deterministic_for_fixed_inputs() {
        let a = signer().sign(&Method::GET, &url("/x?y=1"), None, TIMESTAMP, NONCE);
        let b = signer().sign(&Method::GET, &url("/x?y=1"), None, TIMESTAMP, NONCE);
        assert_eq!(a, b);
    }

    #[test]
    fn query_string_is_part_of_signature() {
        let plain = signer().sign(&Method::GET, &url("/dig-info"), None, TIMESTAMP, NONCE);
        let query = signer().sign(
            &Method::GET,
            &url("/dig-info?hostName=example.com"),
            None,
            TIMESTAMP,
            NONCE,
        );
        assert_ne!(signature_of(&plain), signature_of(&query));
    }

    #[test]
    fn post_body_changes_signature() {
        let a = signer().sign(&Method::POST, &url("/c"), Some(b"{\"a\":1}"), TIMESTAMP, NONCE);
        let b = signer().sign(&Method::POST, &url("/c"), Some(b"{\"a\":2}"), TIMESTAMP, NONCE);
        assert_ne!(signature_of(&a), signature_of(&b));
    }

    #[test]
    fn body_hash_only_applies_to_post() {
        let s = signer();
        assert!(s.content_hash(&Method::GET, Some(b"ignored")).is_empty());
        assert!(s.content_hash(&Method::POST, Some(b"")).is_empty());
        assert!(s.content_hash(&Method::POST, None).is_empty());
        assert_eq!(
            s.content_hash(&Method::POST, Some(b"abc")),
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        );
    }

    #[test]
    fn body_hash_truncates_to_max_body() {
        let mut creds = signer().credentials;
        creds.max_body = 3;
        let s = EdgeGridSigner::new(creds);
        assert_eq!(
            s.content_hash(&Method::POST, Some(b"abcdef")),
            s.content_hash(&Method::POST, Some(b"abc"))
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let creds = signer().credentials;
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("c2VjcmV0"));
    }
}
