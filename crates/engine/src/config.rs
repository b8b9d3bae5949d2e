//! The durable credential/watermark document.
//!
//! A single JSON document on disk, keyed by platform, holds every credential,
//! the static platform settings (endpoints, marketplace ids, signing scope),
//! and the Amazon sync watermark. It is read once at process start and
//! rewritten atomically after every credential refresh and after every
//! successful sync run that advances a watermark.
//!
//! There is no ambient global: [`crate::credentials::CredentialStore`] owns
//! the in-memory document and the path, with an explicit load/persist
//! contract.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur loading or persisting the config document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Document could not be read.
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Document could not be written back.
    #[error("cannot write config {}: {source}", .path.display())]
    Write {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Document is not valid JSON or is missing required fields.
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The on-disk document, keyed the same way the `platform` column is.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Connection string for the normalized store.
    #[serde(serialize_with = "expose")]
    pub database_url: SecretString,
    /// eBay Fulfillment API settings and credential.
    pub ebay: EbayConfig,
    /// Amazon Selling Partner API settings, credential, and watermark.
    pub amazon: AmazonConfig,
    /// WooCommerce settings and consumer keys.
    pub wc: WooConfig,
}

/// An OAuth credential set for one platform.
///
/// `expires_at` already includes the refresh-time safety margin, so the
/// expiry check is a plain comparison against now. Only the refresh
/// operation mutates these fields, and every refresh is persisted before
/// the new token is used.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthCredential {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    #[serde(serialize_with = "expose")]
    pub client_secret: SecretString,
    /// Current access token.
    #[serde(serialize_with = "expose")]
    pub access_token: SecretString,
    /// Long-lived refresh token; rotated only when the refresh response
    /// supplies a replacement.
    #[serde(serialize_with = "expose")]
    pub refresh_token: SecretString,
    /// Margin-adjusted expiry of `access_token`, UTC.
    pub expires_at: DateTime<Utc>,
    /// Token refresh endpoint.
    pub refresh_endpoint: String,
    /// OAuth scope sent with the refresh request (eBay only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl std::fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("refresh_endpoint", &self.refresh_endpoint)
            .field("scope", &self.scope)
            .finish()
    }
}

/// eBay platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbayConfig {
    /// OAuth credential (Basic-auth refresh with scope).
    #[serde(flatten)]
    pub credential: OAuthCredential,
    /// API base URL, e.g. `https://api.ebay.com`.
    pub api_base: String,
}

/// Amazon Selling Partner API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmazonConfig {
    /// LWA credential (form-field refresh, no Basic header).
    #[serde(flatten)]
    pub credential: OAuthCredential,
    /// API base URL, e.g. `https://sellingpartnerapi-na.amazon.com`.
    pub api_base: String,
    /// Marketplaces to pull orders for.
    pub marketplace_ids: Vec<String>,
    /// SigV4 signing identity and scope.
    pub signing: SigningConfig,
    /// High-water `CreatedAfter` watermark; absent before the first
    /// successful run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_orders_after: Option<DateTime<Utc>>,
}

/// SigV4 signing identity for the Selling Partner API.
#[derive(Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    #[serde(serialize_with = "expose")]
    pub secret_access_key: SecretString,
    /// Signing region, e.g. `us-east-1`.
    pub region: String,
    /// Signing service, e.g. `execute-api`.
    pub service: String,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

/// WooCommerce settings.
///
/// WooCommerce authenticates every request with consumer keys in the query
/// string; there is no token lifecycle for this platform.
#[derive(Clone, Serialize, Deserialize)]
pub struct WooConfig {
    /// Store base URL, e.g. `https://shop.example.com`.
    pub api_base: String,
    /// REST API consumer key.
    pub consumer_key: String,
    /// REST API consumer secret.
    #[serde(serialize_with = "expose")]
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooConfig")
            .field("api_base", &self.api_base)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

impl ConfigDocument {
    /// Load the document from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed. This is
    /// the one failure that aborts an entire run at startup.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the document atomically: write a sibling temp file, then
    /// rename over the original so a crash mid-write never truncates the
    /// credential store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization or either filesystem step fails.
    pub fn persist(&self, path: &Path) -> Result<(), ConfigError> {
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp, body).map_err(|source| ConfigError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for ConfigDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDocument")
            .field("database_url", &"[REDACTED]")
            .field("ebay", &self.ebay)
            .field("amazon", &self.amazon)
            .field("wc", &self.wc)
            .finish()
    }
}

/// Serialize a secret by exposing it.
///
/// The document IS the durable credential store: refreshed tokens must
/// round-trip back to disk, so this serializer is the one sanctioned place
/// a secret leaves memory.
fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::ConfigDocument;

    /// A fully-populated document for unit tests across the crate.
    pub(crate) fn sample_document() -> ConfigDocument {
        serde_json::from_str(SAMPLE_JSON).expect("sample document parses")
    }

    const SAMPLE_JSON: &str = r#"{
        "database_url": "postgres://orderdeck:pw@localhost/orderdeck",
        "ebay": {
            "client_id": "ebay-app-id",
            "client_secret": "ebay-cert-id",
            "access_token": "v^1.1#ebay-access",
            "refresh_token": "v^1.1#ebay-refresh",
            "expires_at": "2024-03-01T12:00:00Z",
            "refresh_endpoint": "https://api.ebay.com/identity/v1/oauth2/token",
            "scope": "https://api.ebay.com/oauth/api_scope/sell.fulfillment",
            "api_base": "https://api.ebay.com"
        },
        "amazon": {
            "client_id": "amzn1.application-oa2-client.x",
            "client_secret": "lwa-secret",
            "access_token": "Atza|access",
            "refresh_token": "Atzr|refresh",
            "expires_at": "2024-03-01T12:00:00Z",
            "refresh_endpoint": "https://api.amazon.com/auth/o2/token",
            "api_base": "https://sellingpartnerapi-na.amazon.com",
            "marketplace_ids": ["ATVPDKIKX0DER"],
            "signing": {
                "access_key_id": "AKIDEXAMPLE",
                "secret_access_key": "sigv4-secret",
                "region": "us-east-1",
                "service": "execute-api"
            },
            "get_orders_after": "2024-02-20T00:00:00Z"
        },
        "wc": {
            "api_base": "https://shop.example.com",
            "consumer_key": "ck_test",
            "consumer_secret": "cs_test"
        }
    }"#;
}

#[cfg(test)]
mod tests {
    use super::test_support::sample_document;
    use super::*;

    #[test]
    fn test_document_round_trips() {
        let doc = sample_document();
        let json = serde_json::to_string(&doc).expect("serializes");
        let reparsed: ConfigDocument = serde_json::from_str(&json).expect("reparses");

        assert_eq!(reparsed.ebay.credential.client_id, "ebay-app-id");
        assert_eq!(
            reparsed.ebay.credential.access_token.expose_secret(),
            "v^1.1#ebay-access"
        );
        assert_eq!(
            reparsed.amazon.get_orders_after,
            "2024-02-20T00:00:00Z".parse().ok()
        );
        assert_eq!(reparsed.wc.consumer_secret.expose_secret(), "cs_test");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let doc = sample_document();
        let debug_output = format!("{doc:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("ebay-app-id"));
        assert!(!debug_output.contains("lwa-secret"));
        assert!(!debug_output.contains("Atzr|refresh"));
        assert!(!debug_output.contains("cs_test"));
        assert!(!debug_output.contains("postgres://"));
    }

    #[test]
    fn test_missing_watermark_defaults_to_none() {
        let mut doc = sample_document();
        doc.amazon.get_orders_after = None;
        let json = serde_json::to_string(&doc).expect("serializes");
        assert!(!json.contains("get_orders_after"));

        let reparsed: ConfigDocument = serde_json::from_str(&json).expect("reparses");
        assert!(reparsed.amazon.get_orders_after.is_none());
    }

    #[test]
    fn test_persist_is_atomic_rename() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("orderdeck-config-test-{}.json", std::process::id()));
        let doc = sample_document();

        doc.persist(&path).expect("persists");
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = ConfigDocument::load(&path).expect("reloads");
        assert_eq!(reloaded.ebay.credential.client_id, "ebay-app-id");

        let _ = fs::remove_file(&path);
    }
}
