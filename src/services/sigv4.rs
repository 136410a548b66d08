//! AWS Signature Version 4.
//!
//! Header signing is used for the JSON/REST collaborators (search index, label
//! detection, slot resolution); query presigning issues time-limited object
//! URLs.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::{env, fmt};
use thiserror::Error;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const SHORT_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("missing credential `{0}`")]
    MissingCredential(&'static str),
    #[error("url `{0}` has no host")]
    MissingHost(String),
    #[error("presign expiry must be between 1 and 604800 seconds, got {0}")]
    InvalidExpiry(u64),
    #[error("invalid signing key length")]
    InvalidKey,
}

/// Static credentials used to sign every outgoing request.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self, SigningError> {
        let access_key_id = non_empty_var("AWS_ACCESS_KEY_ID")
            .ok_or(SigningError::MissingCredential("AWS_ACCESS_KEY_ID"))?;
        let secret_access_key = non_empty_var("AWS_SECRET_ACCESS_KEY")
            .ok_or(SigningError::MissingCredential("AWS_SECRET_ACCESS_KEY"))?;
        let session_token = non_empty_var("AWS_SESSION_TOKEN");

        Ok(Self::new(access_key_id, secret_access_key, session_token))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Signs requests for a single region. Service names vary per call.
#[derive(Clone, Debug)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
}

impl SigV4Signer {
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Compute the signing headers for a request carrying `payload`.
    ///
    /// `extra_headers` are included in the signature and must also be sent.
    /// The returned list holds `x-amz-date`, `x-amz-content-sha256`, the
    /// optional `x-amz-security-token` and `authorization`; `host` is derived
    /// from the URL and left to the HTTP client.
    pub fn sign_request(
        &self,
        service: &str,
        method: &str,
        url: &Url,
        extra_headers: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, SigningError> {
        let amz_date = now.format(AMZ_DATE_FORMAT).to_string();
        let short_date = now.format(SHORT_DATE_FORMAT).to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let mut generated = vec![
            ("x-amz-date".to_string(), amz_date.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
        ];
        if let Some(token) = &self.credentials.session_token {
            generated.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let mut signed: Vec<(String, String)> = vec![("host".to_string(), host_header(url)?)];
        signed.extend(
            extra_headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string())),
        );
        signed.extend(generated.iter().cloned());
        signed.sort();

        let signed_headers = signed
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = signed
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.to_ascii_uppercase(),
            canonical_uri(url, service),
            canonical_query(url),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let scope = self.scope(&short_date, service);
        let signature =
            self.signature(&canonical_request, &amz_date, &short_date, &scope, service)?;

        generated.push((
            "authorization".to_string(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
                self.credentials.access_key_id
            ),
        ));
        Ok(generated)
    }

    /// Produce a query-string signed URL valid for `expires_in_secs`.
    pub fn presign_url(
        &self,
        service: &str,
        method: &str,
        url: &Url,
        expires_in_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Url, SigningError> {
        if expires_in_secs == 0 || expires_in_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(SigningError::InvalidExpiry(expires_in_secs));
        }

        let amz_date = now.format(AMZ_DATE_FORMAT).to_string();
        let short_date = now.format(SHORT_DATE_FORMAT).to_string();
        let scope = self.scope(&short_date, service);
        let host = host_header(url)?;

        let mut presigned = url.clone();
        {
            let mut pairs = presigned.query_pairs_mut();
            pairs
                .append_pair("X-Amz-Algorithm", ALGORITHM)
                .append_pair(
                    "X-Amz-Credential",
                    &format!("{}/{scope}", self.credentials.access_key_id),
                )
                .append_pair("X-Amz-Date", &amz_date)
                .append_pair("X-Amz-Expires", &expires_in_secs.to_string())
                .append_pair("X-Amz-SignedHeaders", "host");
            if let Some(token) = &self.credentials.session_token {
                pairs.append_pair("X-Amz-Security-Token", token);
            }
        }

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{host}\n\nhost\n{UNSIGNED_PAYLOAD}",
            method.to_ascii_uppercase(),
            canonical_uri(&presigned, service),
            canonical_query(&presigned),
        );

        let signature =
            self.signature(&canonical_request, &amz_date, &short_date, &scope, service)?;
        presigned
            .query_pairs_mut()
            .append_pair("X-Amz-Signature", &signature);
        Ok(presigned)
    }

    fn scope(&self, short_date: &str, service: &str) -> String {
        format!("{short_date}/{}/{service}/aws4_request", self.region)
    }

    fn signature(
        &self,
        canonical_request: &str,
        amz_date: &str,
        short_date: &str,
        scope: &str,
        service: &str,
    ) -> Result<String, SigningError> {
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        let key = signing_key(
            &self.credentials.secret_access_key,
            short_date,
            &self.region,
            service,
        )?;
        Ok(hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?))
    }
}

/// Derive the per-day, per-service signing key.
pub fn signing_key(
    secret: &str,
    short_date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), short_date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `host[:port]`, omitting the scheme's default port.
fn host_header(url: &Url) -> Result<String, SigningError> {
    let host = url
        .host_str()
        .ok_or_else(|| SigningError::MissingHost(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// S3 signs the encoded object key with `/` left bare, whether or not the
/// request encoded it; every other service signs the path encoded twice.
fn canonical_uri(url: &Url, service: &str) -> String {
    let path = match url.path() {
        "" => "/",
        path => path,
    };
    if service == "s3" {
        return path.replace("%2F", "/");
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            (
                urlencoding::encode(&key).into_owned(),
                urlencoding::encode(&value).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}
