use serde::{Deserialize, Serialize};

use magesync_core::{
    ChannelId, ChannelScoped, ChannelStore, ConnectorError, ConnectorResult, Entity,
    InMemoryChannelStore, PaymentId, SaleId,
};

/// A sale payment, optionally linked to its Magento counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub sale: SaleId,
    pub channel: ChannelId,
    pub magento_id: Option<i64>,
}

impl Payment {
    pub fn new(sale: SaleId, channel: ChannelId) -> Self {
        Self {
            id: PaymentId::new(),
            sale,
            channel,
            magento_id: None,
        }
    }

    pub fn with_magento_id(mut self, magento_id: i64) -> Self {
        self.magento_id = Some(magento_id);
        self
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ChannelScoped for Payment {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }
}

/// Persistence for payments. A remote id is used at most once per channel.
pub trait PaymentRepository: Send + Sync {
    fn get(&self, channel: ChannelId, id: PaymentId) -> Option<Payment>;
    fn find_by_magento_id(&self, channel: ChannelId, magento_id: i64) -> Option<Payment>;
    /// Insert or update.
    fn save(&self, payment: Payment) -> ConnectorResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    store: InMemoryChannelStore<PaymentId, Payment>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentRepository for InMemoryPaymentRepository {
    fn get(&self, channel: ChannelId, id: PaymentId) -> Option<Payment> {
        self.store.get(channel, &id)
    }

    fn find_by_magento_id(&self, channel: ChannelId, magento_id: i64) -> Option<Payment> {
        self.store
            .find(channel, &|p: &Payment| p.magento_id == Some(magento_id))
    }

    fn save(&self, payment: Payment) -> ConnectorResult<()> {
        let channel = payment.channel_id();
        let (id, magento_id) = (payment.id, payment.magento_id);
        let taken = |other: &Payment| {
            other.id != id && magento_id.is_some() && other.magento_id == magento_id
        };
        if !self.store.insert_unless(channel, id, payment, &taken) {
            return Err(ConnectorError::conflict(format!(
                "magento payment {} is already linked on channel {channel}",
                magento_id.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_id_is_unique_per_channel() {
        let repo = InMemoryPaymentRepository::new();
        let channel = ChannelId::new();
        let first = Payment::new(SaleId::new(), channel).with_magento_id(7);
        repo.save(first.clone()).unwrap();

        let err = repo
            .save(Payment::new(SaleId::new(), channel).with_magento_id(7))
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Conflict(_)));

        // Saving the same payment again is an update.
        repo.save(first.clone()).unwrap();
        // Other channels may reuse the id.
        repo.save(Payment::new(SaleId::new(), ChannelId::new()).with_magento_id(7))
            .unwrap();

        assert_eq!(repo.find_by_magento_id(channel, 7), Some(first));
    }

    #[test]
    fn payments_without_remote_id_never_conflict() {
        let repo = InMemoryPaymentRepository::new();
        let channel = ChannelId::new();
        let sale = SaleId::new();
        let a = Payment::new(sale, channel);
        let b = Payment::new(sale, channel);
        repo.save(a.clone()).unwrap();
        repo.save(b.clone()).unwrap();
        assert_eq!(repo.get(channel, b.id), Some(b));
        assert!(repo.find_by_magento_id(channel, 0).is_none());
    }
}
