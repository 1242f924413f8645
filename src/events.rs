//! Events handed back to the caller from `receive_data`.
//!
//! Pure output: every variant is a snapshot built during dispatch and
//! never mutated afterwards. `stream_id` 0 marks connection-level events.

use bytes::Bytes;

use crate::hpack::Header;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A complete, decoded header block arrived on a stream.
    HeadersReceived {
        stream_id: u32,
        headers: Vec<Header>,
        end_stream: bool,
    },
    /// A DATA frame arrived. `flow_controlled_length` is the full wire
    /// payload length (padding included), which is what the caller must
    /// eventually acknowledge via `ack_data_received`.
    DataReceived {
        stream_id: u32,
        data: Bytes,
        end_stream: bool,
        flow_controlled_length: u32,
    },
    /// The peer pushed new settings; `settings` holds the recognized
    /// pairs that were applied to the remote registry.
    SettingsReceived {
        stream_id: u32,
        settings: Vec<(u16, u32)>,
    },
    /// The peer is closing the connection.
    GoawayReceived {
        stream_id: u32,
        error_code: u32,
        error_message: Bytes,
    },
    /// The peer reset a stream.
    RstStreamReceived { stream_id: u32, error_code: u32 },
    /// A ping arrived; `ack` distinguishes the peer's answer to our ping
    /// from a fresh ping we already answered.
    PingReceived {
        stream_id: u32,
        ack: bool,
        data: [u8; 8],
    },
}

impl Event {
    pub fn stream_id(&self) -> u32 {
        match self {
            Event::HeadersReceived { stream_id, .. }
            | Event::DataReceived { stream_id, .. }
            | Event::SettingsReceived { stream_id, .. }
            | Event::GoawayReceived { stream_id, .. }
            | Event::RstStreamReceived { stream_id, .. }
            | Event::PingReceived { stream_id, .. } => *stream_id,
        }
    }
}
