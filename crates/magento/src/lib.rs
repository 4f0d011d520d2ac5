//! Remote storefront API seam.
//!
//! This crate describes what the connector needs from the Magento API (wire
//! types plus the [`MagentoApi`] and [`ApiConnector`] traits) without choosing a
//! transport. The HTTP client lives in `magesync-infra`; [`mock`] provides a
//! scripted in-memory implementation for tests and dry runs.

pub mod api;
pub mod de;
pub mod mock;
pub mod types;

pub use api::{ApiConnector, MagentoApi};
pub use types::{
    AttributeSet, CategoryData, Credentials, IdentifierType, InventoryUpdate, ProductData,
    ProductType, StockData, StoreData, UpdateResult, WebsiteData, FAULT_PRODUCT_NOT_FOUND,
};
