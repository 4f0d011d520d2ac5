use magesync_catalog::Catalog;
use magesync_channels::{Channel, ChannelContext};
use magesync_core::{ConnectorError, ProductId};
use magesync_magento::ApiConnector;

use crate::error::WizardResult;

/// Refreshes every product already imported on a channel.
pub struct UpdateMagentoCatalog<'a, C: ApiConnector> {
    connector: &'a C,
    catalog: Catalog<'a>,
}

impl<'a, C: ApiConnector> UpdateMagentoCatalog<'a, C> {
    pub fn new(connector: &'a C, catalog: Catalog<'a>) -> Self {
        Self { connector, catalog }
    }

    /// Update the product of each active listing of `channel` from Magento.
    ///
    /// Returns the updated product ids in listing order.
    pub fn update_products(&self, channel: &Channel) -> WizardResult<Vec<ProductId>> {
        channel.validate_magento_channel()?;
        let session = channel.connect(self.connector)?;
        let ctx = ChannelContext::new(channel);

        let mut updated = Vec::new();
        for listing in self.catalog.listings.list_by_channel(channel.id) {
            if !listing.is_active() {
                continue;
            }
            let product = self.catalog.products.get(listing.product).ok_or_else(|| {
                ConnectorError::not_found(format!("product {}", listing.product))
            })?;
            let product = self
                .catalog
                .update_product_from_magento(ctx, &session, &product)?;
            updated.push(product.id);
        }
        tracing::info!(channel = %channel.id, count = updated.len(), "updated magento catalog");
        Ok(updated)
    }
}
