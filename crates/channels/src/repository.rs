use std::collections::HashMap;
use std::sync::RwLock;

use magesync_core::{ChannelId, ConnectorError, ConnectorResult};

use crate::channel::Channel;

/// Persistence for channel records.
pub trait ChannelRepository: Send + Sync {
    fn get(&self, id: ChannelId) -> Option<Channel>;
    fn save(&self, channel: Channel);
    fn list(&self) -> Vec<Channel>;

    /// Like [`ChannelRepository::get`], but a missing channel is an error.
    fn require(&self, id: ChannelId) -> ConnectorResult<Channel> {
        self.get(id)
            .ok_or_else(|| ConnectorError::not_found(format!("channel {id}")))
    }
}

impl<R> ChannelRepository for std::sync::Arc<R>
where
    R: ChannelRepository + ?Sized,
{
    fn get(&self, id: ChannelId) -> Option<Channel> {
        (**self).get(id)
    }

    fn save(&self, channel: Channel) {
        (**self).save(channel)
    }

    fn list(&self) -> Vec<Channel> {
        (**self).list()
    }
}

/// In-memory channel repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryChannelRepository {
    inner: RwLock<HashMap<ChannelId, Channel>>,
}

impl InMemoryChannelRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelRepository for InMemoryChannelRepository {
    fn get(&self, id: ChannelId) -> Option<Channel> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn save(&self, channel: Channel) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(channel.id, channel);
        }
    }

    fn list(&self) -> Vec<Channel> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut channels: Vec<Channel> = map.values().cloned().collect();
        channels.sort_by_key(|c| c.id);
        channels
    }
}
