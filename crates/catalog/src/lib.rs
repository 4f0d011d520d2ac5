//! Catalog synchronization: categories, products, channel listings, price
//! tiers and the bulk inventory export.
//!
//! Everything here runs against repository traits; the in-memory
//! implementations back tests and dry runs.

pub mod catalog;
pub mod category;
pub mod default_ops;
pub mod inventory;
pub mod listing;
pub mod price_tier;
pub mod product;

pub use catalog::{Catalog, InMemoryCatalog};
pub use category::{
    Category, CategoryMapping, CategoryRepository, InMemoryCategoryRepository,
    UNCLASSIFIED_CATEGORY,
};
pub use default_ops::{DefaultChannelOps, NoDefaultChannel};
pub use inventory::{ExportSummary, InventoryExporter, INVENTORY_BATCH_SIZE};
pub use listing::{InMemoryListingRepository, Listing, ListingRepository, ListingState};
pub use price_tier::{InMemoryPriceTierRepository, PriceList, PriceTier, PriceTierRepository};
pub use product::{
    InMemoryProductRepository, Product, ProductExportValues, ProductKind, ProductRepository,
    ProductValues,
};
