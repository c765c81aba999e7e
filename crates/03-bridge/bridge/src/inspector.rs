use event_channel::Stamp;
use msg_abi::{MsgGroup, MsgKind, Payload};
use serde::Serialize;

use crate::router::Bridge;
use crate::stats::DispatchCounters;
use crate::status::Status;

/// Bridge state as seen by debug front-ends.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BridgeVM {
    /// Channels that have fired at least once, in catalog order.
    pub channels: Vec<ChannelVM>,
    /// Staleness and refresh count for each mirror.
    pub mirrors: Vec<MirrorVM>,
    /// Current status pair.
    pub status: Status,
    /// Router counters.
    pub stats: DispatchCounters,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelVM {
    pub kind: MsgKind,
    pub group: MsgGroup,
    pub count: Stamp,
    pub subscribers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Payload>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MirrorVM {
    pub name: &'static str,
    pub stale: bool,
    pub version: u64,
}

impl BridgeVM {
    pub fn capture(bridge: &Bridge) -> Self {
        let channels = bridge
            .channels()
            .iter()
            .filter(|channel| channel.stamp() != Stamp::ZERO)
            .map(|channel| ChannelVM {
                kind: channel.kind(),
                group: channel.kind().group(),
                count: channel.stamp(),
                subscribers: channel.subscriber_count(),
                value: channel.last_value(),
            })
            .collect();
        let mirrors = bridge
            .mirrors()
            .all()
            .iter()
            .map(|mirror| MirrorVM {
                name: mirror.name(),
                stale: mirror.is_stale(),
                version: mirror.version(),
            })
            .collect();
        Self {
            channels,
            mirrors,
            status: bridge.status().current(),
            stats: bridge.stats(),
        }
    }

    pub fn channel(&self, kind: MsgKind) -> Option<&ChannelVM> {
        self.channels.iter().find(|channel| channel.kind == kind)
    }

    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
