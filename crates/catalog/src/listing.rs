use serde::{Deserialize, Serialize};

use magesync_core::{
    ChannelId, ChannelScoped, ChannelStore, ConnectorError, ConnectorResult, Entity,
    InMemoryChannelStore, ListingId, ProductId,
};
use magesync_magento::{InventoryUpdate, ProductType};

/// Lifecycle of a listing on its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingState {
    #[default]
    Active,
    /// The remote side no longer knows the product; it is skipped by updates.
    Disabled,
}

/// A product as listed on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub channel: ChannelId,
    pub product: ProductId,
    /// Remote product id. Never the SKU: numeric SKUs are ambiguous remotely.
    pub product_identifier: String,
    /// Local quantity available for this channel.
    pub quantity: f64,
    pub state: ListingState,
    pub magento_product_type: Option<ProductType>,
}

impl Listing {
    pub fn new(
        channel: ChannelId,
        product: ProductId,
        product_identifier: impl Into<String>,
        magento_product_type: Option<ProductType>,
    ) -> Self {
        Self {
            id: ListingId::new(),
            channel,
            product,
            product_identifier: product_identifier.into(),
            quantity: 0.0,
            state: ListingState::Active,
            magento_product_type,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn is_active(&self) -> bool {
        self.state == ListingState::Active
    }

    /// Stock update pushed to the remote side for this listing.
    pub fn inventory_update(&self) -> InventoryUpdate {
        InventoryUpdate::new(
            self.product_identifier.clone(),
            self.quantity,
            self.magento_product_type,
        )
    }
}

impl Entity for Listing {
    type Id = ListingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ChannelScoped for Listing {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }
}

/// Persistence for listings.
///
/// A product is listed at most once per channel; `insert` enforces it.
pub trait ListingRepository: Send + Sync {
    fn get(&self, channel: ChannelId, id: ListingId) -> Option<Listing>;
    fn find_by_identifier(&self, channel: ChannelId, product_identifier: &str) -> Option<Listing>;
    fn find_by_product(&self, channel: ChannelId, product: ProductId) -> Option<Listing>;
    fn list_by_channel(&self, channel: ChannelId) -> Vec<Listing>;
    fn insert(&self, listing: Listing) -> ConnectorResult<()>;
    /// Persist changes to an existing listing.
    fn save(&self, listing: Listing) -> ConnectorResult<()>;
}

/// In-memory listing repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryListingRepository {
    store: InMemoryChannelStore<ListingId, Listing>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListingRepository for InMemoryListingRepository {
    fn get(&self, channel: ChannelId, id: ListingId) -> Option<Listing> {
        self.store.get(channel, &id)
    }

    fn find_by_identifier(&self, channel: ChannelId, product_identifier: &str) -> Option<Listing> {
        self.store
            .find(channel, &|l: &Listing| l.product_identifier == product_identifier)
    }

    fn find_by_product(&self, channel: ChannelId, product: ProductId) -> Option<Listing> {
        self.store.find(channel, &|l: &Listing| l.product == product)
    }

    fn list_by_channel(&self, channel: ChannelId) -> Vec<Listing> {
        let mut listings = self.store.list(channel);
        listings.sort_by_key(|l| l.id);
        listings
    }

    fn insert(&self, listing: Listing) -> ConnectorResult<()> {
        let channel = listing.channel_id();
        let product = listing.product;
        if !self
            .store
            .insert_unless(channel, listing.id, listing, &|l: &Listing| l.product == product)
        {
            return Err(ConnectorError::conflict(format!(
                "product {product} is already listed on channel {channel}"
            )));
        }
        Ok(())
    }

    fn save(&self, listing: Listing) -> ConnectorResult<()> {
        let channel = listing.channel_id();
        if self.store.get(channel, &listing.id).is_none() {
            return Err(ConnectorError::not_found(format!("listing {}", listing.id)));
        }
        self.store.upsert(channel, listing.id, listing);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_product_is_listed_once_per_channel() {
        let repo = InMemoryListingRepository::new();
        let channel = ChannelId::new();
        let product = ProductId::new();

        repo.insert(Listing::new(channel, product, "10", Some(ProductType::Simple)))
            .unwrap();
        let err = repo
            .insert(Listing::new(channel, product, "11", Some(ProductType::Simple)))
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Conflict(_)));

        // Same product on another channel is fine.
        repo.insert(Listing::new(ChannelId::new(), product, "10", None))
            .unwrap();
    }

    #[test]
    fn concurrent_inserts_of_one_product_keep_a_single_listing() {
        let repo = InMemoryListingRepository::new();
        let channel = ChannelId::new();
        let product = ProductId::new();

        let accepted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let repo = &repo;
                    scope.spawn(move || {
                        repo.insert(Listing::new(channel, product, i.to_string(), None))
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(accepted, 1);
        assert_eq!(repo.list_by_channel(channel).len(), 1);
    }

    #[test]
    fn lookups_are_scoped_to_the_channel() {
        let repo = InMemoryListingRepository::new();
        let a = ChannelId::new();
        let b = ChannelId::new();
        let listing = Listing::new(a, ProductId::new(), "77", None);
        repo.insert(listing.clone()).unwrap();

        assert_eq!(repo.find_by_identifier(a, "77"), Some(listing));
        assert_eq!(repo.find_by_identifier(b, "77"), None);
    }

    #[test]
    fn saving_an_unknown_listing_fails() {
        let repo = InMemoryListingRepository::new();
        let listing = Listing::new(ChannelId::new(), ProductId::new(), "1", None);
        assert!(matches!(repo.save(listing), Err(ConnectorError::NotFound(_))));
    }

    #[test]
    fn untyped_listings_are_reported_in_stock() {
        let listing = Listing::new(ChannelId::new(), ProductId::new(), "5", None).with_quantity(0.0);
        assert!(listing.inventory_update().stock.is_in_stock);
    }
}
