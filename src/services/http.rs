//! Shared plumbing for signed calls to the collaborators.
//!
//! One `reqwest::Client` (and its connection pool) plus one signer are built
//! at startup and cloned by reference into every client.

use crate::{
    errors::{ClientError, ClientResult},
    services::sigv4::SigV4Signer,
};
use chrono::Utc;
use reqwest::{Method, Response, header::HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::debug;
use url::Url;

#[derive(Clone, Debug)]
pub struct SignedClient {
    http: reqwest::Client,
    signer: Arc<SigV4Signer>,
}

impl SignedClient {
    pub fn new(http: reqwest::Client, signer: Arc<SigV4Signer>) -> Self {
        Self { http, signer }
    }

    pub fn signer(&self) -> &SigV4Signer {
        &self.signer
    }

    /// Send a header-signed request and fail on any non-2xx status.
    ///
    /// `label` names the collaborator in errors; `service` is the signing
    /// service name.
    pub async fn send(
        &self,
        label: &'static str,
        service: &str,
        method: Method,
        url: Url,
        extra_headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> ClientResult<Response> {
        let signed = self.signer.sign_request(
            service,
            method.as_str(),
            &url,
            extra_headers,
            &body,
            Utc::now(),
        )?;

        debug!("{} {} {}", label, method, url);

        let mut request = self.http.request(method, url);
        for (name, value) in extra_headers.iter().copied() {
            request = request.header(name, value);
        }
        for (name, value) in signed {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Http {
                service: label,
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            debug!("{} {} returned {}", label, response.url(), status);
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                service: label,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, R>(
        &self,
        label: &'static str,
        service: &str,
        url: Url,
        extra_headers: &[(&str, &str)],
        body: &B,
    ) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|source| ClientError::Decode {
            service: label,
            source,
        })?;
        let response = self
            .send(label, service, Method::POST, url, extra_headers, payload)
            .await?;
        decode_json(label, response).await
    }
}

/// Read the body as text first so decode failures report serde's message.
pub async fn decode_json<R: DeserializeOwned>(
    label: &'static str,
    response: Response,
) -> ClientResult<R> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ClientError::Http {
            service: label,
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
        service: label,
        source,
    })
}

/// Segments that URL path parsing resolves away. Percent-encoding leaves dots
/// alone, so these cannot be sent as standalone segments.
pub fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Parse a configured endpoint and append path segments, each percent-encoded.
///
/// Dot segments are rejected rather than letting the URL resolve them.
pub fn endpoint_url(label: &'static str, base: &str, segments: &[&str]) -> ClientResult<Url> {
    let mut url = Url::parse(base).map_err(|source| ClientError::Url {
        service: label,
        source,
    })?;
    let mut path = url.path().trim_end_matches('/').to_string();
    for segment in segments {
        if is_dot_segment(segment) {
            return Err(ClientError::DotSegment {
                service: label,
                segment: segment.to_string(),
            });
        }
        path.push('/');
        path.push_str(&urlencoding::encode(segment));
    }
    if path.is_empty() {
        path.push('/');
    }
    url.set_path(&path);
    Ok(url)
}

/// Header value lookup that tolerates non-UTF-8 values.
pub fn header_str(value: Option<&HeaderValue>) -> Option<String> {
    value
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
