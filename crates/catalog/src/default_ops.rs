//! Behaviour for channels this connector does not own.

use magesync_channels::Channel;
use magesync_core::{ConnectorError, ConnectorResult};
use magesync_magento::ProductData;

use crate::listing::Listing;
use crate::product::Product;

/// Generic channel behaviour used for every non-Magento channel.
///
/// The connector only handles Magento channels itself. Anything else it is
/// handed (a POS listing in a mixed inventory export, say) is forwarded here.
pub trait DefaultChannelOps: Send + Sync {
    fn create_product(&self, channel: &Channel, data: &ProductData) -> ConnectorResult<Product>;

    fn create_listing(&self, channel: &Channel, data: &ProductData) -> ConnectorResult<Listing>;

    fn export_bulk_inventory(&self, listings: &[Listing]) -> ConnectorResult<()>;

    fn export_inventory(&self, listing: &Listing) -> ConnectorResult<()> {
        self.export_bulk_inventory(std::slice::from_ref(listing))
    }
}

/// Rejects every non-Magento operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDefaultChannel;

impl NoDefaultChannel {
    fn reject<T>(channel: &str) -> ConnectorResult<T> {
        Err(ConnectorError::unsupported(format!(
            "no integration handles channel {channel}"
        )))
    }
}

impl DefaultChannelOps for NoDefaultChannel {
    fn create_product(&self, channel: &Channel, _data: &ProductData) -> ConnectorResult<Product> {
        Self::reject(&channel.name)
    }

    fn create_listing(&self, channel: &Channel, _data: &ProductData) -> ConnectorResult<Listing> {
        Self::reject(&channel.name)
    }

    fn export_bulk_inventory(&self, listings: &[Listing]) -> ConnectorResult<()> {
        match listings.first() {
            None => Ok(()),
            Some(listing) => Self::reject(&listing.channel.to_string()),
        }
    }
}
