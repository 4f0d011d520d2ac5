//! Explicit "current channel" for import and pricing operations.

use magesync_core::ChannelId;

use crate::channel::Channel;

/// The channel an operation runs against.
///
/// Remote ids are resolved relative to this channel: a category id of `4`
/// means different things on different Magento instances.
#[derive(Debug, Clone, Copy)]
pub struct ChannelContext<'a> {
    channel: &'a Channel,
}

impl<'a> ChannelContext<'a> {
    pub fn new(channel: &'a Channel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &'a Channel {
        self.channel
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel.id
    }
}
