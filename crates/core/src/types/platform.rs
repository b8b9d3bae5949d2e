//! Source platform enumeration.
//!
//! Every synchronized order is tagged with the platform it came from; the
//! `(order_id, platform)` pair is the canonical identity of a row.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An e-commerce platform Orderdeck synchronizes orders from.
///
/// The string forms (`ebay`, `amazon`, `wc`) are what gets persisted in the
/// `platform` column and used as keys in the config document, so they must
/// stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// eBay Fulfillment API (bearer OAuth, cursor pagination).
    #[serde(rename = "ebay")]
    Ebay,
    /// Amazon Selling Partner API (LWA token + SigV4, `NextToken` pagination).
    #[serde(rename = "amazon")]
    Amazon,
    /// WooCommerce REST API (consumer-key auth, offset pagination).
    #[serde(rename = "wc")]
    WooCommerce,
}

/// Error returned when parsing an unknown platform string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct PlatformParseError(String);

impl Platform {
    /// All platforms, in the order a sync run visits them.
    pub const ALL: [Self; 3] = [Self::Ebay, Self::Amazon, Self::WooCommerce];

    /// The stable string form used in storage and configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ebay => "ebay",
            Self::Amazon => "amazon",
            Self::WooCommerce => "wc",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ebay" => Ok(Self::Ebay),
            "amazon" => Ok(Self::Amazon),
            "wc" => Ok(Self::WooCommerce),
            other => Err(PlatformParseError(other.to_string())),
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Platform {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Platform {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'_, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Platform {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<Self>()?)
    }
}
