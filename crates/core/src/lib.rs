//! `magesync-core`: building blocks shared by every connector crate.
//!
//! Identifiers, the error taxonomy and the channel-scoped record store. No
//! remote IO lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod store;

pub use entity::{ChannelScoped, Entity};
pub use error::{ConnectorError, ConnectorResult, RemoteError};
pub use id::{
    CategoryId, ChannelId, GatewayId, ListingId, PaymentGatewayId, PaymentId, PriceListId,
    PriceTierId, ProductId, SaleId, UomId,
};
pub use store::{ChannelStore, InMemoryChannelStore};
