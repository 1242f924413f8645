//! Per-stream lifecycle and operations.
//!
//! The state machine is a total table: a (state, input) pair either
//! names the next state or the operation fails without touching the
//! stream. There is no partial application; callers observe either the
//! full transition or an error.

use bytes::Bytes;

use crate::error::{ConfigurationError, EngineError, ProtocolStateError};
use crate::events::Event;
use crate::frame::{Frame, Priority};
use crate::hpack::{Header, HeaderDecoder, HeaderEncoder};
use crate::window::WindowManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Idle,
    ReservedRemote,
    ReservedLocal,
    Open,
    HalfClosedRemote,
    HalfClosedLocal,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamInput {
    SendHeaders,
    RecvHeaders,
    SendPushPromise,
    RecvPushPromise,
    SendEndStream,
    RecvEndStream,
    SendRstStream,
    RecvRstStream,
}

/// The transition table. `None` marks a protocol violation.
fn transition_for(state: StreamState, input: StreamInput) -> Option<StreamState> {
    use StreamInput::*;
    use StreamState::*;
    match (state, input) {
        (Idle, SendHeaders) | (Idle, RecvHeaders) => Some(Open),
        (Idle, SendPushPromise) => Some(ReservedLocal),
        (Idle, RecvPushPromise) => Some(ReservedRemote),

        (Open, SendEndStream) => Some(HalfClosedLocal),
        (Open, RecvEndStream) => Some(HalfClosedRemote),
        (Open, SendRstStream) | (Open, RecvRstStream) => Some(Closed),

        (ReservedLocal, SendHeaders) => Some(HalfClosedRemote),
        (ReservedLocal, SendRstStream) | (ReservedLocal, RecvRstStream) => Some(Closed),

        (ReservedRemote, RecvHeaders) => Some(HalfClosedLocal),
        (ReservedRemote, SendRstStream) | (ReservedRemote, RecvRstStream) => Some(Closed),

        (HalfClosedRemote, SendEndStream)
        | (HalfClosedRemote, SendRstStream)
        | (HalfClosedRemote, RecvRstStream) => Some(Closed),

        // Trailers keep the stream half-closed
        (HalfClosedLocal, RecvHeaders) => Some(HalfClosedLocal),
        (HalfClosedLocal, RecvEndStream)
        | (HalfClosedLocal, SendRstStream)
        | (HalfClosedLocal, RecvRstStream) => Some(Closed),

        _ => None,
    }
}

#[derive(Debug)]
pub struct Stream {
    stream_id: u32,
    state: StreamState,
    outbound_window_size: u32,
    inbound_window_size: u32,
    inbound_window_manager: WindowManager,
    max_outbound_frame_size: u32,
    max_inbound_frame_size: u32,
}

impl Stream {
    pub fn new(
        stream_id: u32,
        outbound_window_size: u32,
        inbound_window_size: u32,
        max_outbound_frame_size: u32,
        max_inbound_frame_size: u32,
    ) -> Self {
        Self {
            stream_id,
            state: StreamState::Idle,
            outbound_window_size,
            inbound_window_size,
            inbound_window_manager: WindowManager::new(inbound_window_size),
            max_outbound_frame_size,
            max_inbound_frame_size,
        }
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn outbound_window_size(&self) -> u32 {
        self.outbound_window_size
    }

    pub fn inbound_window_size(&self) -> u32 {
        self.inbound_window_size
    }

    pub fn max_outbound_frame_size(&self) -> u32 {
        self.max_outbound_frame_size
    }

    pub fn max_inbound_frame_size(&self) -> u32 {
        self.max_inbound_frame_size
    }

    pub fn inbound_window(&self) -> &WindowManager {
        &self.inbound_window_manager
    }

    /// Drive the state machine. Fails, leaving the state untouched, when
    /// the table has no entry for the pair.
    pub fn transition(&mut self, input: StreamInput) -> Result<(), EngineError> {
        match transition_for(self.state, input) {
            Some(next) => {
                self.state = next;
                Ok(())
            }
            None => Err(ProtocolStateError::InvalidTransition {
                state: self.state,
                input,
            }
            .into()),
        }
    }

    /// Encode `headers` and split the block into a HEADERS frame plus as
    /// many CONTINUATION frames as the outbound frame-size limit demands.
    ///
    /// The HEADERS frame is sized to leave room for the pad-length byte,
    /// the padding itself and the priority fields; only the final
    /// fragment carries END_HEADERS. `end_stream` rides on the HEADERS
    /// frame and additionally drives the end-stream transition.
    pub fn send_headers(
        &mut self,
        headers: &[Header],
        encoder: &mut HeaderEncoder,
        end_stream: bool,
        padding: Option<u8>,
        priority: Option<Priority>,
    ) -> Result<Vec<Frame>, EngineError> {
        // A peer may advertise MAX_FRAME_SIZE 0; no fragment fits then.
        if self.max_outbound_frame_size == 0 {
            return Err(ConfigurationError::ZeroMaxFrameSize.into());
        }
        let mut others_length = 0usize;
        if let Some(pad) = padding {
            others_length += 1 + pad as usize;
        }
        if priority.is_some() {
            others_length += 5;
        }
        if others_length > self.max_outbound_frame_size as usize {
            return Err(ConfigurationError::OverheadExceedsFrameSize {
                overhead: others_length,
                max_frame_size: self.max_outbound_frame_size,
            }
            .into());
        }

        self.transition(StreamInput::SendHeaders)?;
        if end_stream {
            self.transition(StreamInput::SendEndStream)?;
        }

        let payload = encoder.encode(headers);
        let place = self.max_outbound_frame_size as usize - others_length;
        let first_len = payload.len().min(place);
        let first_block = Bytes::copy_from_slice(&payload[..first_len]);

        let mut frames = vec![Frame::Headers {
            stream_id: self.stream_id,
            fragment: first_block,
            end_stream,
            end_headers: false,
            pad_length: padding,
            priority,
        }];
        for chunk in payload[first_len..].chunks(self.max_outbound_frame_size as usize) {
            frames.push(Frame::Continuation {
                stream_id: self.stream_id,
                fragment: Bytes::copy_from_slice(chunk),
                end_headers: false,
            });
        }
        match frames.last_mut() {
            Some(Frame::Headers { end_headers, .. })
            | Some(Frame::Continuation { end_headers, .. }) => *end_headers = true,
            _ => {}
        }
        Ok(frames)
    }

    /// Decode a reassembled header block and advance the state machine.
    /// The block must be decoded even if the transition then fails, or
    /// the compression state would fall out of sync with the peer.
    pub fn receive_headers(
        &mut self,
        fragment: &[u8],
        end_stream: bool,
        decoder: &mut HeaderDecoder,
    ) -> Result<Event, EngineError> {
        let headers = decoder.decode(fragment)?;
        self.transition(StreamInput::RecvHeaders)?;
        Ok(Event::HeadersReceived {
            stream_id: self.stream_id,
            headers,
            end_stream,
        })
    }

    /// Account a DATA frame against the stream's receive window and hand
    /// the payload up. Data does not drive the state machine; only the
    /// flags on HEADERS and RST_STREAM do.
    pub fn receive_data(
        &mut self,
        data: Bytes,
        end_stream: bool,
        flow_controlled_length: u32,
    ) -> Result<Event, EngineError> {
        self.inbound_window_manager.reduce(flow_controlled_length)?;
        Ok(Event::DataReceived {
            stream_id: self.stream_id,
            data,
            end_stream,
            flow_controlled_length,
        })
    }

    /// Report consumed bytes; returns the stream-level WINDOW_UPDATE to
    /// queue when the replenishment threshold fires.
    pub fn ack_data_received(&mut self, size: u32) -> Result<Option<Frame>, EngineError> {
        match self.inbound_window_manager.process_bytes(size) {
            Some(increment) => Ok(Some(Frame::window_update(self.stream_id, increment)?)),
            None => Ok(None),
        }
    }

    pub fn receive_rst_stream(&mut self, error_code: u32) -> Result<Event, EngineError> {
        self.transition(StreamInput::RecvRstStream)?;
        Ok(Event::RstStreamReceived {
            stream_id: self.stream_id,
            error_code,
        })
    }

    /// Reset the stream from our side. Goes through the table, so
    /// resetting a stream that was never opened is refused.
    pub fn send_rst_stream(&mut self, error_code: u32) -> Result<Frame, EngineError> {
        self.transition(StreamInput::SendRstStream)?;
        Ok(Frame::RstStream {
            stream_id: self.stream_id,
            error_code,
        })
    }
}
