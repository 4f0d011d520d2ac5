//! Strongly-typed local identifiers.
//!
//! Remote identifiers (Magento entity ids, product identifiers) are kept as the
//! plain values the remote API hands out; only local records get these types.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConnectorError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered), so ids created later sort later.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = ConnectorError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| ConnectorError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// A configured sale channel (remote storefront destination).
    ChannelId,
    "ChannelId"
);
uuid_id!(
    /// A local product (variant).
    ProductId,
    "ProductId"
);
uuid_id!(
    /// A local product category.
    CategoryId,
    "CategoryId"
);
uuid_id!(
    /// A product listing on a channel.
    ListingId,
    "ListingId"
);
uuid_id!(
    /// A price tier attached to a listing.
    PriceTierId,
    "PriceTierId"
);
uuid_id!(
    /// A remote payment method mapped onto a local gateway.
    PaymentGatewayId,
    "PaymentGatewayId"
);
uuid_id!(
    /// A local payment gateway (the processor, not the remote mapping).
    GatewayId,
    "GatewayId"
);
uuid_id!(PaymentId, "PaymentId");
uuid_id!(SaleId, "SaleId");
uuid_id!(
    /// A unit of measure.
    UomId,
    "UomId"
);
uuid_id!(PriceListId, "PriceListId");
