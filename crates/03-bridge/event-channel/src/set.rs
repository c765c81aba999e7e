use msg_abi::{MsgGroup, MsgKind};

use crate::channel::{EventChannel, Notification, Subscription};
use crate::stamp::Stamp;

/// One channel per catalog entry, all created up front so subscribers can
/// attach before the first occurrence.
#[derive(Debug)]
pub struct ChannelSet {
    channels: Box<[EventChannel]>,
}

impl ChannelSet {
    /// Creates every channel up front, each at zero.
    pub fn new() -> Self {
        let channels = MsgKind::ALL
            .iter()
            .copied()
            .map(EventChannel::new)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { channels }
    }

    /// Channel for `kind`. Never fails; the set covers the whole catalog.
    pub fn channel(&self, kind: MsgKind) -> &EventChannel {
        &self.channels[kind.index()]
    }

    /// Current count of `kind`'s channel.
    pub fn stamp(&self, kind: MsgKind) -> Stamp {
        self.channel(kind).stamp()
    }

    #[must_use = "dropping the subscription detaches the observer"]
    pub fn subscribe<F>(&self, kind: MsgKind, observer: F) -> Subscription
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        self.channel(kind).subscribe(observer)
    }

    /// Every channel in id order.
    pub fn iter(&self) -> impl Iterator<Item = &EventChannel> {
        self.channels.iter()
    }

    /// Channels of one subsystem, for debug listings.
    pub fn group(&self, group: MsgGroup) -> impl Iterator<Item = &EventChannel> {
        self.channels
            .iter()
            .filter(move |channel| channel.kind().group() == group)
    }

    /// Every `(kind, stamp)` pair in id order.
    pub fn stamps(&self) -> Vec<(MsgKind, Stamp)> {
        self.channels
            .iter()
            .map(|channel| (channel.kind(), channel.stamp()))
            .collect()
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}
