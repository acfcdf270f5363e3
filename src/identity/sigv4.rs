//! AWS Signature Version 4 request signing
//!
//! Only what the Cognito JSON API needs: requests without query strings,
//! headers supplied by the caller plus `host`, `x-amz-date` and the optional
//! session token.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Static AWS credentials
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
    pub security_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl RequestSigner {
    #[must_use]
    pub fn new(credentials: AwsCredentials, region: &str, service: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Sign a request
    ///
    /// `headers` are the caller's own headers (lowercase names); `host`,
    /// `x-amz-date` and `x-amz-security-token` are added here.
    #[must_use]
    pub fn sign(
        &self,
        method: &str,
        host: &str,
        path: &str,
        headers: &[(&str, &str)],
        payload: &[u8],
        time: DateTime<Utc>,
    ) -> SignedHeaders {
        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = time.format("%Y%m%d").to_string();

        let mut canonical: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        canonical.push(("host".to_string(), host.to_string()));
        canonical.push(("x-amz-date".to_string(), amz_date.clone()));
        if let Some(token) = &self.credentials.session_token {
            canonical.push(("x-amz-security-token".to_string(), token.clone()));
        }
        canonical.sort();

        let canonical_headers: String = canonical
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        let signed_headers = canonical
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{method}\n{path}\n\n{canonical_headers}\n{signed_headers}\n{}",
            sha256_hex(payload)
        );

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = self.signing_key(&date);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        SignedHeaders {
            authorization: format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
                self.credentials.access_key_id
            ),
            amz_date,
            security_token: self.credentials.session_token.clone(),
        }
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        derive_signing_key(
            &self.credentials.secret_access_key,
            date,
            &self.region,
            &self.service,
        )
    }
}

/// Derive the per-day signing key
#[must_use]
pub fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
