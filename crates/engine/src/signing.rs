//! SigV4-style request signing for the Selling Partner API.
//!
//! The signer is a pure function of the request, the signing identity, and
//! a caller-supplied timestamp: no clock, no randomness, no side effects.
//! Callers stamp the timestamp per attempt so retried requests are
//! re-signed, and unit tests pin it to reproduce reference vectors
//! byte-for-byte.

use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::config::SigningConfig;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// SHA-256 of an empty body; all signed calls here are bodiless GETs.
const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Format `now` as a SigV4 request timestamp (`YYYYMMDDTHHMMSSZ`).
#[must_use]
pub fn request_timestamp(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Build the canonical query string: keys and values percent-encoded
/// (RFC 3986 unreserved set) and pairs sorted lexicographically by key.
///
/// The caller sends this exact string on the wire so the signed and
/// transmitted queries can never drift apart.
#[must_use]
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the `Authorization` header value for a bodiless GET.
///
/// `headers` must contain every header that travels with the request and
/// participates in signing (`host`, `user-agent`, `x-amz-access-token`,
/// `x-amz-date`); `timestamp` must equal the `x-amz-date` value.
#[must_use]
pub fn authorization_header(
    method: &str,
    path: &str,
    params: &[(String, String)],
    headers: &[(&str, &str)],
    signing: &SigningConfig,
    timestamp: &str,
) -> String {
    let date = timestamp.get(..8).unwrap_or(timestamp);
    let scope = format!(
        "{date}/{region}/{service}/aws4_request",
        region = signing.region,
        service = signing.service
    );

    let canonical = canonical_request(method, path, params, headers);
    let signed_headers = signed_header_list(headers);
    let string_to_sign = format!(
        "{ALGORITHM}\n{timestamp}\n{scope}\n{hash}",
        hash = sha256_hex(canonical.as_bytes())
    );

    let key = derive_signing_key(
        signing.secret_access_key.expose_secret(),
        date,
        &signing.region,
        &signing.service,
    );
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    format!(
        "{ALGORITHM} Credential={id}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        id = signing.access_key_id
    )
}

/// Assemble the canonical request string.
fn canonical_request(
    method: &str,
    path: &str,
    params: &[(String, String)],
    headers: &[(&str, &str)],
) -> String {
    let mut sorted: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.trim().to_string()))
        .collect();
    sorted.sort();

    let canonical_headers: String = sorted
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    format!(
        "{method}\n{path}\n{query}\n{canonical_headers}\n{signed}\n{EMPTY_PAYLOAD_HASH}",
        query = canonical_query(params),
        signed = signed_header_list(headers)
    )
}

/// Lower-cased, sorted, semicolon-joined header names.
fn signed_header_list(headers: &[(&str, &str)]) -> String {
    let mut names: Vec<String> = headers.iter().map(|(name, _)| name.to_lowercase()).collect();
    names.sort();
    names.join(";")
}

/// Derive the signing key: four chained keyed hashes over date, region,
/// service, and the terminal literal.
fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let key = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let key = hmac_sha256(&key, region.as_bytes());
    let key = hmac_sha256(&key, service.as_bytes());
    hmac_sha256(&key, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
