//! Bulk inventory export to Magento.
//!
//! Listings are grouped by channel in order of first appearance and pushed in
//! fixed-size batches through one remote session per channel. The bulk API
//! reports faults inline, one result per request:
//!
//! - success: nothing to do
//! - fault `101` (product unknown remotely): the listing is disabled locally
//! - any other fault: the export stops with [`ConnectorError::InventoryUpdateFault`]
//!
//! Listings of non-Magento channels never reach the remote side; they are
//! handed to [`DefaultChannelOps::export_bulk_inventory`].

use magesync_channels::{Channel, ChannelRepository};
use magesync_core::{ChannelId, ConnectorError, ConnectorResult, ListingId};
use magesync_magento::{ApiConnector, InventoryUpdate, MagentoApi, UpdateResult};

use crate::default_ops::DefaultChannelOps;
use crate::listing::{Listing, ListingRepository, ListingState};

/// Maximum number of products per remote inventory call.
pub const INVENTORY_BATCH_SIZE: usize = 50;

/// What an export did. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Remote inventory calls made.
    pub batches: usize,
    /// Update requests sent across all batches.
    pub pushed: usize,
    /// Listings disabled because the remote side does not know them.
    pub disabled: Vec<ListingId>,
    /// Listings handed to the default channel behaviour.
    pub delegated: usize,
}

pub struct InventoryExporter<'a, C: ApiConnector> {
    connector: &'a C,
    channels: &'a dyn ChannelRepository,
    listings: &'a dyn ListingRepository,
    fallback: &'a dyn DefaultChannelOps,
    batch_size: usize,
}

impl<'a, C: ApiConnector> InventoryExporter<'a, C> {
    pub fn new(
        connector: &'a C,
        channels: &'a dyn ChannelRepository,
        listings: &'a dyn ListingRepository,
        fallback: &'a dyn DefaultChannelOps,
    ) -> Self {
        Self {
            connector,
            channels,
            listings,
            fallback,
            batch_size: INVENTORY_BATCH_SIZE,
        }
    }

    /// Override the batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Export the inventory of a single listing.
    pub fn export_inventory(&self, listing: &Listing) -> ConnectorResult<ExportSummary> {
        self.export_bulk_inventory(std::slice::from_ref(listing))
    }

    /// Export the inventory of `listings`, in order.
    ///
    /// Disabled listings are persisted as they are found, so a fatal fault in
    /// a later batch does not undo them.
    pub fn export_bulk_inventory(&self, listings: &[Listing]) -> ConnectorResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        if listings.is_empty() {
            return Ok(summary);
        }

        let mut magento: Vec<(Channel, Vec<&Listing>)> = Vec::new();
        let mut delegated: Vec<Listing> = Vec::new();
        for (channel_id, group) in group_by_channel(listings) {
            let channel = self.channels.require(channel_id)?;
            if channel.is_magento() {
                magento.push((channel, group));
            } else {
                delegated.extend(group.into_iter().cloned());
            }
        }

        if !delegated.is_empty() {
            tracing::debug!(count = delegated.len(), "delegating non-magento listings");
            self.fallback.export_bulk_inventory(&delegated)?;
            summary.delegated = delegated.len();
        }

        for (channel, group) in magento {
            self.export_channel(&channel, &group, &mut summary)?;
        }
        Ok(summary)
    }

    fn export_channel(
        &self,
        channel: &Channel,
        listings: &[&Listing],
        summary: &mut ExportSummary,
    ) -> ConnectorResult<()> {
        let session = channel.connect(self.connector)?;

        tracing::info!(channel = %channel.id, "Fetching inventory of {} magento listings", listings.len());
        for batch in listings.chunks(self.batch_size) {
            let updates: Vec<InventoryUpdate> =
                batch.iter().map(|l| l.inventory_update()).collect();

            tracing::info!(channel = %channel.id, "Pushing inventory of {} products to magento", updates.len());
            let results = session.update_inventory(&updates)?;
            summary.batches += 1;
            summary.pushed += updates.len();

            if results.len() != updates.len() {
                return Err(ConnectorError::ResponseMismatch {
                    expected: updates.len(),
                    actual: results.len(),
                });
            }

            for (update, result) in updates.iter().zip(results) {
                match result {
                    UpdateResult::Success => {}
                    ref fault if fault.is_product_not_found() => {
                        if let Some(id) = self.disable(channel.id, &update.product_identifier)? {
                            summary.disabled.push(id);
                        }
                    }
                    UpdateResult::Fault { code, message } => {
                        return Err(ConnectorError::InventoryUpdateFault { code, message });
                    }
                    UpdateResult::Unrecognized(raw) => {
                        return Err(ConnectorError::InventoryUpdateFault {
                            code: "unrecognized".to_string(),
                            message: raw,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn disable(&self, channel: ChannelId, identifier: &str) -> ConnectorResult<Option<ListingId>> {
        let Some(mut listing) = self.listings.find_by_identifier(channel, identifier) else {
            tracing::warn!(%channel, identifier, "remote product not found and no local listing matches");
            return Ok(None);
        };
        tracing::debug!(listing = %listing.id, identifier, "disabling listing unknown to magento");
        listing.state = ListingState::Disabled;
        let id = listing.id;
        self.listings.save(listing)?;
        Ok(Some(id))
    }
}

/// Group listings by channel, keeping first-appearance order of channels and
/// input order within each channel.
fn group_by_channel(listings: &[Listing]) -> Vec<(ChannelId, Vec<&Listing>)> {
    let mut groups: Vec<(ChannelId, Vec<&Listing>)> = Vec::new();
    for listing in listings {
        match groups.iter_mut().find(|(c, _)| *c == listing.channel) {
            Some((_, group)) => group.push(listing),
            None => groups.push((listing.channel, vec![listing])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use magesync_channels::InMemoryChannelRepository;
    use magesync_core::{ProductId, RemoteError, UomId};
    use magesync_magento::mock::ScriptedMagento;
    use magesync_magento::{Credentials, ProductData, ProductType};
    use proptest::prelude::*;

    use crate::default_ops::NoDefaultChannel;
    use crate::listing::InMemoryListingRepository;
    use crate::product::Product;

    #[derive(Default)]
    struct RecordingFallback {
        exported: Mutex<Vec<ListingId>>,
    }

    impl DefaultChannelOps for RecordingFallback {
        fn create_product(&self, _: &Channel, _: &ProductData) -> ConnectorResult<Product> {
            Err(ConnectorError::unsupported("test"))
        }

        fn create_listing(&self, _: &Channel, _: &ProductData) -> ConnectorResult<Listing> {
            Err(ConnectorError::unsupported("test"))
        }

        fn export_bulk_inventory(&self, listings: &[Listing]) -> ConnectorResult<()> {
            self.exported
                .lock()
                .unwrap()
                .extend(listings.iter().map(|l| l.id));
            Ok(())
        }
    }

    /// Listing repository that counts how often listings are saved.
    struct CountingListings {
        inner: InMemoryListingRepository,
        saves: Mutex<usize>,
    }

    impl CountingListings {
        fn saves(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    impl ListingRepository for CountingListings {
        fn get(&self, channel: ChannelId, id: ListingId) -> Option<Listing> {
            self.inner.get(channel, id)
        }

        fn find_by_identifier(&self, channel: ChannelId, product_identifier: &str) -> Option<Listing> {
            self.inner.find_by_identifier(channel, product_identifier)
        }

        fn find_by_product(&self, channel: ChannelId, product: ProductId) -> Option<Listing> {
            self.inner.find_by_product(channel, product)
        }

        fn list_by_channel(&self, channel: ChannelId) -> Vec<Listing> {
            self.inner.list_by_channel(channel)
        }

        fn insert(&self, listing: Listing) -> ConnectorResult<()> {
            self.inner.insert(listing)
        }

        fn save(&self, listing: Listing) -> ConnectorResult<()> {
            *self.saves.lock().unwrap() += 1;
            self.inner.save(listing)
        }
    }

    struct Fixture {
        remote: ScriptedMagento,
        channels: InMemoryChannelRepository,
        listings: InMemoryListingRepository,
        channel: Channel,
    }

    impl Fixture {
        fn new() -> Self {
            let channels = InMemoryChannelRepository::new();
            let channel = Channel::magento(
                "Shop",
                Credentials::new("https://shop.example", "api", "key"),
                UomId::new(),
            );
            channels.save(channel.clone());
            Self {
                remote: ScriptedMagento::new(),
                channels,
                listings: InMemoryListingRepository::new(),
                channel,
            }
        }

        fn listing(&self, identifier: &str, qty: f64, product_type: Option<ProductType>) -> Listing {
            let listing = Listing::new(self.channel.id, ProductId::new(), identifier, product_type)
                .with_quantity(qty);
            self.listings.insert(listing.clone()).unwrap();
            listing
        }

        fn listings(&self, n: usize) -> Vec<Listing> {
            (0..n)
                .map(|i| self.listing(&i.to_string(), i as f64, Some(ProductType::Simple)))
                .collect()
        }

        fn exporter<'a>(&'a self, fallback: &'a dyn DefaultChannelOps) -> InventoryExporter<'a, ScriptedMagento> {
            InventoryExporter::new(&self.remote, &self.channels, &self.listings, fallback)
        }
    }

    #[test]
    fn not_found_fault_disables_only_that_listing() {
        let fx = Fixture::new();
        let l1 = fx.listing("1", 5.0, Some(ProductType::Simple));
        let l2 = fx.listing("2", 0.0, Some(ProductType::Configurable));
        fx.remote.push_inventory_response(Ok(vec![
            UpdateResult::Success,
            UpdateResult::fault("101", "Product not exists."),
        ]));

        let summary = fx
            .exporter(&NoDefaultChannel)
            .export_bulk_inventory(&[l1.clone(), l2.clone()])
            .unwrap();

        let calls = fx.remote.inventory_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], InventoryUpdate::new("1", 5.0, Some(ProductType::Simple)));
        assert!(calls[0][1].stock.is_in_stock);
        assert_eq!(summary.disabled, vec![l2.id]);
        assert!(fx.listings.get(fx.channel.id, l1.id).unwrap().is_active());
        assert_eq!(
            fx.listings.get(fx.channel.id, l2.id).unwrap().state,
            ListingState::Disabled
        );
    }

    #[test]
    fn each_not_found_fault_saves_its_listing_once() {
        let fx = Fixture::new();
        let counting = CountingListings {
            inner: InMemoryListingRepository::new(),
            saves: Mutex::new(0),
        };
        let listings: Vec<Listing> = (0..4)
            .map(|i| {
                let listing = Listing::new(fx.channel.id, ProductId::new(), i.to_string(), Some(ProductType::Simple))
                    .with_quantity(1.0);
                counting.inner.insert(listing.clone()).unwrap();
                listing
            })
            .collect();
        fx.remote.push_inventory_response(Ok(vec![
            UpdateResult::Success,
            UpdateResult::fault("101", "Product not exists."),
            UpdateResult::fault("101", "Product not exists."),
            UpdateResult::Success,
        ]));

        let summary = InventoryExporter::new(&fx.remote, &fx.channels, &counting, &NoDefaultChannel)
            .export_bulk_inventory(&listings)
            .unwrap();

        assert_eq!(counting.saves(), 2);
        assert_eq!(summary.disabled, vec![listings[1].id, listings[2].id]);
        for (i, listing) in listings.iter().enumerate() {
            let state = counting.get(fx.channel.id, listing.id).unwrap().state;
            if i == 1 || i == 2 {
                assert_eq!(state, ListingState::Disabled);
            } else {
                assert_eq!(state, ListingState::Active);
            }
        }
    }

    #[test]
    fn zero_stock_is_out_of_stock_only_for_simple_products() {
        let fx = Fixture::new();
        let a = fx.listing("A", 0.0, Some(ProductType::Simple));
        let b = fx.listing("B", 0.0, Some(ProductType::Bundle));

        fx.exporter(&NoDefaultChannel)
            .export_bulk_inventory(&[a, b])
            .unwrap();

        let calls = fx.remote.inventory_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            serde_json::to_value(&calls[0]).unwrap(),
            serde_json::json!([
                ["A", {"qty": 0.0, "is_in_stock": "0"}],
                ["B", {"qty": 0.0, "is_in_stock": "1"}],
            ])
        );
    }

    #[test]
    fn other_fault_aborts_remaining_batches() {
        let fx = Fixture::new();
        let listings = fx.listings(120);
        let mut first = vec![UpdateResult::Success; 50];
        first[10] = UpdateResult::fault("101", "Product not exists.");
        let mut second = vec![UpdateResult::Success; 50];
        second[3] = UpdateResult::fault("102", "Stock not updated");
        second[4] = UpdateResult::fault("101", "Product not exists.");
        fx.remote.push_inventory_response(Ok(first));
        fx.remote.push_inventory_response(Ok(second));

        let err = fx
            .exporter(&NoDefaultChannel)
            .export_bulk_inventory(&listings)
            .unwrap_err();

        assert_eq!(err.to_string(), "FaultCode: 102, FaultMessage: Stock not updated");
        assert_eq!(fx.remote.inventory_calls().len(), 2);
        // The first batch's disable stays; nothing after the fatal fault runs.
        assert_eq!(
            fx.listings.get(fx.channel.id, listings[10].id).unwrap().state,
            ListingState::Disabled
        );
        assert!(fx.listings.get(fx.channel.id, listings[54].id).unwrap().is_active());
    }

    #[test]
    fn unrecognized_result_is_fatal() {
        let fx = Fixture::new();
        let l = fx.listing("1", 1.0, None);
        fx.remote
            .push_inventory_response(Ok(vec![UpdateResult::Unrecognized("\"weird\"".into())]));

        let err = fx.exporter(&NoDefaultChannel).export_inventory(&l).unwrap_err();
        assert_eq!(
            err,
            ConnectorError::InventoryUpdateFault {
                code: "unrecognized".into(),
                message: "\"weird\"".into(),
            }
        );
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let fx = Fixture::new();
        let listings = fx.listings(3);
        fx.remote.push_inventory_response(Ok(vec![UpdateResult::Success]));

        let err = fx
            .exporter(&NoDefaultChannel)
            .export_bulk_inventory(&listings)
            .unwrap_err();
        assert_eq!(err, ConnectorError::ResponseMismatch { expected: 3, actual: 1 });
    }

    #[test]
    fn empty_input_makes_no_remote_call() {
        let fx = Fixture::new();
        let summary = fx.exporter(&NoDefaultChannel).export_bulk_inventory(&[]).unwrap();
        assert_eq!(summary, ExportSummary::default());
        assert!(fx.remote.connections().is_empty());
        assert!(fx.remote.inventory_calls().is_empty());
    }

    #[test]
    fn unknown_listing_in_not_found_fault_is_skipped() {
        let fx = Fixture::new();
        // Not inserted into the repository.
        let stray = Listing::new(fx.channel.id, ProductId::new(), "404", None);
        fx.remote
            .push_inventory_response(Ok(vec![UpdateResult::fault("101", "Product not exists.")]));

        let summary = fx.exporter(&NoDefaultChannel).export_inventory(&stray).unwrap();
        assert!(summary.disabled.is_empty());
        assert_eq!(summary.pushed, 1);
    }

    #[test]
    fn transport_errors_propagate() {
        let fx = Fixture::new();
        let l = fx.listing("1", 1.0, None);
        fx.remote
            .push_inventory_response(Err(RemoteError::Transport("connection reset".into())));

        let err = fx.exporter(&NoDefaultChannel).export_inventory(&l).unwrap_err();
        assert!(matches!(err, ConnectorError::Remote(RemoteError::Transport(_))));
    }

    #[test]
    fn non_magento_listings_are_delegated() {
        let fx = Fixture::new();
        let pos = Channel::other("Counter", "pos", UomId::new());
        fx.channels.save(pos.clone());
        let local = Listing::new(pos.id, ProductId::new(), "p-1", None);
        let remote = fx.listing("1", 2.0, Some(ProductType::Simple));
        let fallback = RecordingFallback::default();

        let summary = fx
            .exporter(&fallback)
            .export_bulk_inventory(&[local.clone(), remote])
            .unwrap();

        assert_eq!(summary.delegated, 1);
        assert_eq!(*fallback.exported.lock().unwrap(), vec![local.id]);
        let calls = fx.remote.inventory_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].product_identifier, "1");
    }

    #[test]
    fn channels_are_exported_in_order_of_first_appearance() {
        let fx = Fixture::new();
        let other = Channel::magento(
            "Outlet",
            Credentials::new("https://outlet.example", "api", "key"),
            UomId::new(),
        );
        fx.channels.save(other.clone());
        let a = fx.listing("a", 1.0, None);
        let b = Listing::new(other.id, ProductId::new(), "b", None);
        let c = fx.listing("c", 1.0, None);

        fx.exporter(&NoDefaultChannel)
            .export_bulk_inventory(&[b, a, c])
            .unwrap();

        assert_eq!(
            fx.remote.connections(),
            vec!["https://outlet.example".to_string(), "https://shop.example".to_string()]
        );
        let calls = fx.remote.inventory_calls();
        let identifiers: Vec<Vec<&str>> = calls
            .iter()
            .map(|batch| batch.iter().map(|u| u.product_identifier.as_str()).collect())
            .collect();
        assert_eq!(identifiers, vec![vec!["b"], vec!["a", "c"]]);
    }

    proptest! {
        #[test]
        fn batches_cover_input_in_order(n in 1usize..260, size in 1usize..80) {
            let fx = Fixture::new();
            let listings = fx.listings(n);

            let summary = fx
                .exporter(&NoDefaultChannel)
                .with_batch_size(size)
                .export_bulk_inventory(&listings)
                .unwrap();

            let calls = fx.remote.inventory_calls();
            prop_assert_eq!(calls.len(), n.div_ceil(size));
            prop_assert_eq!(summary.batches, calls.len());
            prop_assert!(calls.iter().all(|b| b.len() <= size));
            let sent: Vec<String> = calls.into_iter().flatten().map(|u| u.product_identifier).collect();
            let expected: Vec<String> = listings.iter().map(|l| l.product_identifier.clone()).collect();
            prop_assert_eq!(sent, expected);
        }
    }
}
