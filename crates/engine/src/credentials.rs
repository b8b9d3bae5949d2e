//! Credential lifecycle: lazy refresh with durable persistence.
//!
//! [`CredentialStore`] owns the config document for the lifetime of a run.
//! Callers ask for a valid access token; the store compares the stored
//! expiry (already margin-adjusted) against now and, when expired, performs
//! the platform's refresh exchange, rewrites the document to disk, and only
//! then hands the token out. A refresh must never be lost on a crash
//! between refresh and next use.
//!
//! Refresh is mutually exclusive by construction: `access_token` takes
//! `&mut self`, so a single run can never race two refreshes for the same
//! platform.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use orderdeck_core::Platform;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::config::{AmazonConfig, ConfigDocument, ConfigError, EbayConfig, OAuthCredential, WooConfig};
use crate::error::SyncError;

/// Seconds subtracted from `expires_in` when recording a refreshed token,
/// so a token is never handed out moments before the server rejects it.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 300;

/// How a platform's refresh endpoint wants the client identity.
#[derive(Debug, Clone, Copy)]
enum RefreshScheme {
    /// HTTP Basic `client_id:client_secret`, scope in the form body (eBay).
    BasicWithScope,
    /// `client_id`/`client_secret` as form fields, no Basic header
    /// (Amazon Login-with-Amazon token exchange).
    ClientFields,
}

/// Body of a successful refresh exchange.
#[derive(Debug, Deserialize)]
struct RefreshGrant {
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Token lifetime in seconds.
    expires_in: i64,
}

impl OAuthCredential {
    /// Whether the stored token is past its (margin-adjusted) expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Fold a refresh grant into the credential. The refresh token rotates
    /// only when the response supplies a replacement; otherwise the old one
    /// stays valid and is kept.
    fn apply_refresh(&mut self, grant: &RefreshGrant, now: DateTime<Utc>) {
        if let Some(token) = &grant.access_token {
            self.access_token = SecretString::from(token.clone());
        }
        if let Some(rotated) = &grant.refresh_token {
            self.refresh_token = SecretString::from(rotated.clone());
        }
        self.expires_at = now + Duration::seconds(grant.expires_in - TOKEN_SAFETY_MARGIN_SECS);
    }
}

/// Owner of the durable credential document.
pub struct CredentialStore {
    path: PathBuf,
    doc: ConfigDocument,
}

impl CredentialStore {
    /// Load the document from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let doc = ConfigDocument::load(&path)?;
        Ok(Self { path, doc })
    }

    /// Write the in-memory document back to disk atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization or the filesystem write fails.
    pub fn persist(&self) -> Result<(), ConfigError> {
        self.doc.persist(&self.path)
    }

    /// Path the document was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// eBay settings.
    #[must_use]
    pub const fn ebay(&self) -> &EbayConfig {
        &self.doc.ebay
    }

    /// Amazon settings.
    #[must_use]
    pub const fn amazon(&self) -> &AmazonConfig {
        &self.doc.amazon
    }

    /// WooCommerce settings.
    #[must_use]
    pub const fn woocommerce(&self) -> &WooConfig {
        &self.doc.wc
    }

    /// Connection string for the normalized store.
    #[must_use]
    pub const fn database_url(&self) -> &SecretString {
        &self.doc.database_url
    }

    /// The Amazon `CreatedAfter` watermark, or the epoch before the first
    /// successful run.
    #[must_use]
    pub fn orders_after(&self) -> DateTime<Utc> {
        self.doc
            .amazon
            .get_orders_after
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Advance the Amazon watermark. Never moves backwards; the caller
    /// persists after the run's insertion succeeded.
    pub fn advance_orders_after(&mut self, to: DateTime<Utc>) {
        let current = self.doc.amazon.get_orders_after;
        self.doc.amazon.get_orders_after = Some(current.map_or(to, |cur| cur.max(to)));
    }

    /// Return a valid (unexpired) access token for `platform`, refreshing
    /// and persisting first when necessary.
    ///
    /// A credential with `expires_at` in the future triggers zero refresh
    /// calls; an expired one triggers exactly one before the token is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::AuthRefresh` if the refresh exchange fails or
    /// returns no access token, `SyncError::Config` if the refreshed
    /// document cannot be persisted.
    #[instrument(skip(self, http))]
    pub async fn access_token(
        &mut self,
        http: &reqwest::Client,
        platform: Platform,
    ) -> Result<String, SyncError> {
        match platform {
            Platform::Ebay => {
                let refreshed = ensure_fresh(
                    http,
                    platform,
                    RefreshScheme::BasicWithScope,
                    &mut self.doc.ebay.credential,
                )
                .await?;
                if refreshed {
                    self.persist()?;
                    tracing::info!(%platform, "access token refreshed");
                }
                Ok(self.doc.ebay.credential.access_token.expose_secret().to_string())
            }
            Platform::Amazon => {
                let refreshed = ensure_fresh(
                    http,
                    platform,
                    RefreshScheme::ClientFields,
                    &mut self.doc.amazon.credential,
                )
                .await?;
                if refreshed {
                    self.persist()?;
                    tracing::info!(%platform, "access token refreshed");
                }
                Ok(self.doc.amazon.credential.access_token.expose_secret().to_string())
            }
            Platform::WooCommerce => Err(SyncError::AuthRefresh {
                platform,
                reason: "WooCommerce authenticates with consumer keys; there is no token to refresh"
                    .to_string(),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_document(path: impl Into<PathBuf>, doc: ConfigDocument) -> Self {
        Self {
            path: path.into(),
            doc,
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .field("doc", &self.doc)
            .finish()
    }
}

/// Refresh `cred` in place when expired. Returns whether a refresh happened.
async fn ensure_fresh(
    http: &reqwest::Client,
    platform: Platform,
    scheme: RefreshScheme,
    cred: &mut OAuthCredential,
) -> Result<bool, SyncError> {
    let now = Utc::now();
    if !cred.is_expired(now) {
        return Ok(false);
    }
    let grant = request_refresh(http, platform, scheme, cred).await?;
    cred.apply_refresh(&grant, now);
    Ok(true)
}

/// Perform the platform's refresh exchange.
async fn request_refresh(
    http: &reqwest::Client,
    platform: Platform,
    scheme: RefreshScheme,
    cred: &OAuthCredential,
) -> Result<RefreshGrant, SyncError> {
    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", cred.refresh_token.expose_secret()),
    ];

    let request = match scheme {
        RefreshScheme::BasicWithScope => {
            if let Some(scope) = &cred.scope {
                form.push(("scope", scope.as_str()));
            }
            http.post(&cred.refresh_endpoint)
                .basic_auth(&cred.client_id, Some(cred.client_secret.expose_secret()))
                .form(&form)
        }
        RefreshScheme::ClientFields => {
            form.push(("client_id", cred.client_id.as_str()));
            form.push(("client_secret", cred.client_secret.expose_secret()));
            http.post(&cred.refresh_endpoint).form(&form)
        }
    };

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::AuthRefresh {
            platform,
            reason: format!("HTTP {status}: {body}"),
        });
    }

    let grant: RefreshGrant = response.json().await?;
    if grant.access_token.is_none() {
        return Err(SyncError::AuthRefresh {
            platform,
            reason: "refresh response carried no access_token".to_string(),
        });
    }
    Ok(grant)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::test_support::sample_document;

    fn grant(access: &str, refresh: Option<&str>, expires_in: i64) -> RefreshGrant {
        RefreshGrant {
            access_token: Some(access.to_string()),
            refresh_token: refresh.map(String::from),
            expires_in,
        }
    }

    #[test]
    fn test_is_expired_boundary() {
        let mut cred = sample_document().ebay.credential;
        let now = Utc::now();

        cred.expires_at = now + Duration::hours(1);
        assert!(!cred.is_expired(now));

        cred.expires_at = now - Duration::seconds(1);
        assert!(cred.is_expired(now));

        // Exactly at expiry counts as expired.
        cred.expires_at = now;
        assert!(cred.is_expired(now));
    }

    #[test]
    fn test_apply_refresh_subtracts_safety_margin() {
        let mut cred = sample_document().ebay.credential;
        let now = Utc::now();

        cred.apply_refresh(&grant("new-access", None, 7200), now);

        assert_eq!(cred.access_token.expose_secret(), "new-access");
        assert_eq!(
            cred.expires_at,
            now + Duration::seconds(7200 - TOKEN_SAFETY_MARGIN_SECS)
        );
    }

    #[test]
    fn test_refresh_token_rotates_only_when_supplied() {
        let mut cred = sample_document().ebay.credential;
        let now = Utc::now();
        let original_refresh = cred.refresh_token.expose_secret().to_string();

        cred.apply_refresh(&grant("a1", None, 3600), now);
        assert_eq!(cred.refresh_token.expose_secret(), original_refresh);

        cred.apply_refresh(&grant("a2", Some("rotated"), 3600), now);
        assert_eq!(cred.refresh_token.expose_secret(), "rotated");
    }

    #[tokio::test]
    async fn test_fresh_token_skips_refresh() {
        // A credential with a future expiry must be returned as-is with no
        // network traffic; nothing is listening on the refresh endpoint, so
        // any attempted refresh would error.
        let mut doc = sample_document();
        doc.ebay.credential.expires_at = Utc::now() + Duration::hours(2);
        doc.ebay.credential.refresh_endpoint = "http://127.0.0.1:1/token".to_string();
        let mut store = CredentialStore::from_document("/nonexistent/config.json", doc);

        let token = store
            .access_token(&reqwest::Client::new(), Platform::Ebay)
            .await
            .expect("fresh token returned without refresh");
        assert_eq!(token, "v^1.1#ebay-access");
    }

    #[tokio::test]
    async fn test_woocommerce_has_no_token_lifecycle() {
        let mut store =
            CredentialStore::from_document("/nonexistent/config.json", sample_document());
        let err = store
            .access_token(&reqwest::Client::new(), Platform::WooCommerce)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::AuthRefresh {
                platform: Platform::WooCommerce,
                ..
            }
        ));
    }

    #[test]
    fn test_watermark_never_moves_backwards() {
        let mut store =
            CredentialStore::from_document("/nonexistent/config.json", sample_document());
        let earlier: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().expect("parses");
        let later: DateTime<Utc> = "2024-03-01T00:00:00Z".parse().expect("parses");

        store.advance_orders_after(later);
        assert_eq!(store.orders_after(), later);

        store.advance_orders_after(earlier);
        assert_eq!(store.orders_after(), later);
    }

    #[test]
    fn test_missing_watermark_defaults_to_epoch() {
        let mut doc = sample_document();
        doc.amazon.get_orders_after = None;
        let store = CredentialStore::from_document("/nonexistent/config.json", doc);
        assert_eq!(store.orders_after(), DateTime::UNIX_EPOCH);
    }
}
