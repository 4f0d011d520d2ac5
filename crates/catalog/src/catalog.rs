use crate::category::{CategoryRepository, InMemoryCategoryRepository};
use crate::default_ops::{DefaultChannelOps, NoDefaultChannel};
use crate::listing::{InMemoryListingRepository, ListingRepository};
use crate::product::{InMemoryProductRepository, ProductRepository};

/// The catalog repositories an import or update operation works against.
///
/// Import operations are implemented as methods on this type, spread over the
/// `category` and `product` modules.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    pub products: &'a dyn ProductRepository,
    pub listings: &'a dyn ListingRepository,
    pub categories: &'a dyn CategoryRepository,
    /// Handles products and listings of non-Magento channels.
    pub fallback: &'a dyn DefaultChannelOps,
}

/// Owns in-memory repositories and hands out [`Catalog`] views over them.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    pub products: InMemoryProductRepository,
    pub listings: InMemoryListingRepository,
    pub categories: InMemoryCategoryRepository,
    pub fallback: NoDefaultChannel,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog {
            products: &self.products,
            listings: &self.listings,
            categories: &self.categories,
            fallback: &self.fallback,
        }
    }
}
