//! Quantity-based price tiers published with a listing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use magesync_channels::ChannelContext;
use magesync_core::{
    ChannelId, ChannelScoped, ChannelStore, ConnectorError, ConnectorResult, Entity,
    InMemoryChannelStore, ListingId, PriceListId, PriceTierId, UomId,
};

use crate::listing::Listing;
use crate::product::Product;

/// Price list evaluation, owned by the sales side of the application.
pub trait PriceList: Send + Sync {
    fn compute(
        &self,
        price_list: PriceListId,
        product: &Product,
        unit_price: Decimal,
        quantity: f64,
        uom: UomId,
    ) -> ConnectorResult<Decimal>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub id: PriceTierId,
    pub listing: ListingId,
    pub channel: ChannelId,
    pub quantity: f64,
}

impl PriceTier {
    pub fn new(listing: &Listing, quantity: f64) -> Self {
        Self {
            id: PriceTierId::new(),
            listing: listing.id,
            channel: listing.channel,
            quantity,
        }
    }

    /// Unit price at this tier's quantity.
    ///
    /// Zero without a current channel. A channel without a price list sells
    /// at the product's list price.
    pub fn price(
        &self,
        ctx: Option<ChannelContext<'_>>,
        product: &Product,
        price_lists: &dyn PriceList,
    ) -> ConnectorResult<Decimal> {
        let Some(ctx) = ctx else {
            return Ok(Decimal::ZERO);
        };
        let channel = ctx.channel();
        match channel.price_list {
            Some(price_list) => price_lists.compute(
                price_list,
                product,
                product.list_price,
                self.quantity,
                channel.default_uom,
            ),
            None => Ok(product.list_price),
        }
    }
}

impl Entity for PriceTier {
    type Id = PriceTierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ChannelScoped for PriceTier {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }
}

pub trait PriceTierRepository: Send + Sync {
    /// Fails with a conflict when the listing already has a tier at this
    /// quantity.
    fn insert(&self, tier: PriceTier) -> ConnectorResult<()>;
    fn list_by_listing(&self, channel: ChannelId, listing: ListingId) -> Vec<PriceTier>;
}

#[derive(Debug, Default)]
pub struct InMemoryPriceTierRepository {
    store: InMemoryChannelStore<PriceTierId, PriceTier>,
}

impl InMemoryPriceTierRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceTierRepository for InMemoryPriceTierRepository {
    fn insert(&self, tier: PriceTier) -> ConnectorResult<()> {
        let channel = tier.channel_id();
        let (listing, quantity) = (tier.listing, tier.quantity);
        if !self.store.insert_unless(channel, tier.id, tier, &|t: &PriceTier| {
            t.listing == listing && t.quantity == quantity
        }) {
            return Err(ConnectorError::conflict(
                "Quantity in price tiers must be unique",
            ));
        }
        Ok(())
    }

    fn list_by_listing(&self, channel: ChannelId, listing: ListingId) -> Vec<PriceTier> {
        let mut tiers: Vec<PriceTier> = self
            .store
            .list(channel)
            .into_iter()
            .filter(|t| t.listing == listing)
            .collect();
        tiers.sort_by(|a, b| a.quantity.total_cmp(&b.quantity));
        tiers
    }
}
