use serde::{Deserialize, Serialize};

use magesync_channels::{Channel, ChannelContext};
use magesync_core::{
    ChannelId, ChannelScoped, ChannelStore, ConnectorError, ConnectorResult, Entity, GatewayId,
    InMemoryChannelStore, PaymentGatewayId,
};

/// A payment method as reported by Magento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayData {
    pub name: String,
    pub title: String,
}

/// Maps a Magento payment method to a local payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentGateway {
    pub id: PaymentGatewayId,
    /// Remote method code, unique per channel.
    pub name: String,
    pub title: String,
    pub gateway: GatewayId,
    pub channel: ChannelId,
}

impl Entity for PaymentGateway {
    type Id = PaymentGatewayId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ChannelScoped for PaymentGateway {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }
}

/// Picks the local gateway a new remote payment method is mapped to.
///
/// The connector has no opinion on this; each deployment supplies one.
pub trait GatewayResolver: Send + Sync {
    fn resolve(&self, channel: &Channel, data: &GatewayData) -> ConnectorResult<GatewayId>;
}

pub trait PaymentGatewayRepository: Send + Sync {
    fn find_by_name(&self, channel: ChannelId, name: &str) -> Option<PaymentGateway>;
    fn list_by_channel(&self, channel: ChannelId) -> Vec<PaymentGateway>;
    fn insert(&self, gateway: PaymentGateway) -> ConnectorResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentGatewayRepository {
    store: InMemoryChannelStore<PaymentGatewayId, PaymentGateway>,
}

impl InMemoryPaymentGatewayRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentGatewayRepository for InMemoryPaymentGatewayRepository {
    fn find_by_name(&self, channel: ChannelId, name: &str) -> Option<PaymentGateway> {
        self.store.find(channel, &|g: &PaymentGateway| g.name == name)
    }

    fn list_by_channel(&self, channel: ChannelId) -> Vec<PaymentGateway> {
        let mut gateways = self.store.list(channel);
        gateways.sort_by(|a, b| a.name.cmp(&b.name));
        gateways
    }

    fn insert(&self, gateway: PaymentGateway) -> ConnectorResult<()> {
        let channel = gateway.channel_id();
        let name = gateway.name.clone();
        if !self
            .store
            .insert_unless(channel, gateway.id, gateway, &|g: &PaymentGateway| g.name == name)
        {
            return Err(ConnectorError::conflict(
                "Payment gateway already exist for this channel",
            ));
        }
        Ok(())
    }
}

/// Gateway import operations for the current channel.
#[derive(Clone, Copy)]
pub struct PaymentGateways<'a> {
    pub repository: &'a dyn PaymentGatewayRepository,
    pub resolver: &'a dyn GatewayResolver,
}

impl PaymentGateways<'_> {
    /// Map every remote method, reusing existing mappings by name.
    pub fn create_all_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        data: &[GatewayData],
    ) -> ConnectorResult<Vec<PaymentGateway>> {
        data.iter()
            .map(|d| match self.find_using_magento_data(ctx, d) {
                Some(gateway) => Ok(gateway),
                None => self.create_using_magento_data(ctx, d),
            })
            .collect()
    }

    pub fn find_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        data: &GatewayData,
    ) -> Option<PaymentGateway> {
        self.repository.find_by_name(ctx.channel_id(), &data.name)
    }

    pub fn create_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        data: &GatewayData,
    ) -> ConnectorResult<PaymentGateway> {
        let channel = ctx.channel();
        if !channel.is_magento() {
            return Err(ConnectorError::user(format!(
                "channel \"{}\" is not a Magento channel",
                channel.name
            )));
        }

        let gateway = PaymentGateway {
            id: PaymentGatewayId::new(),
            name: data.name.clone(),
            title: data.title.clone(),
            gateway: self.resolver.resolve(channel, data)?,
            channel: channel.id,
        };
        self.repository.insert(gateway.clone())?;
        tracing::debug!(gateway = %gateway.id, name = %gateway.name, "mapped magento payment method");
        Ok(gateway)
    }
}
