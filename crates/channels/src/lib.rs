//! Sale channels: the remote storefront destinations the connector talks to.

pub mod carrier;
pub mod channel;
pub mod context;
pub mod repository;

pub use carrier::{MagentoCarrierMapping, SaleChannelCarrier};
pub use channel::{Channel, ChannelSource, RemoteStore, RemoteWebsite};
pub use context::ChannelContext;
pub use repository::{ChannelRepository, InMemoryChannelRepository};
