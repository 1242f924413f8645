//! Connection orchestration.
//!
//! A [`Connection`] owns every stream, both settings registries, the
//! flow-control windows and the inbound/outbound byte buffers. Inbound
//! bytes go through [`Connection::receive_data`], which drains complete
//! frames out of the reassembly buffer and dispatches each one to its
//! handler; outbound operations serialize frames into a buffer the
//! caller drains with [`Connection::data_to_send`] and writes to the
//! transport itself. Nothing in here touches a socket.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};

use crate::buffer::FrameBuffer;
use crate::error::{EngineError, FlowControlError, ProtocolStateError};
use crate::events::Event;
use crate::frame::{Frame, Priority, CONNECTION_PREFACE, MAX_STREAM_ID};
use crate::hpack::{Header, HeaderDecoder, HeaderEncoder};
use crate::settings::Settings;
use crate::stream::{Stream, StreamState};
use crate::window::WindowManager;

/// Hard cap on any flow-control window.
pub const MAX_FLOW_CONTROL_WINDOW: u32 = (1 << 31) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Open,
    Closed,
}

#[derive(Debug)]
pub struct Connection {
    streams: HashMap<u32, Stream>,
    local_settings: Settings,
    remote_settings: Settings,
    /// Budget for inbound payload, replenished via our WINDOW_UPDATEs.
    inbound_window_manager: WindowManager,
    /// Budget for outbound payload. The peer replenishes it, so a bare
    /// counter is enough; no manager logic runs on this side.
    outbound_window_size: u32,
    encoder: HeaderEncoder,
    decoder: HeaderDecoder,
    inbound_buffer: FrameBuffer,
    outbound: BytesMut,
    state: ConnectionState,
    goaway_last_stream_id: Option<u32>,
}

impl Connection {
    pub fn new() -> Self {
        Self::with_settings(&[])
    }

    /// Build a connection advertising `overrides` on top of the default
    /// local settings. Unrecognized identifiers are ignored.
    pub fn with_settings(overrides: &[(u16, u32)]) -> Self {
        let local_settings = Settings::with_overrides(overrides);
        let remote_settings = Settings::new();
        let decoder =
            HeaderDecoder::with_max_table_size(local_settings.header_table_size() as usize);
        let inbound_window_manager = WindowManager::new(local_settings.initial_window_size());
        let outbound_window_size = remote_settings.initial_window_size();
        Self {
            streams: HashMap::new(),
            local_settings,
            remote_settings,
            inbound_window_manager,
            outbound_window_size,
            encoder: HeaderEncoder::new(),
            decoder,
            inbound_buffer: FrameBuffer::new(),
            outbound: BytesMut::new(),
            state: ConnectionState::Idle,
            goaway_last_stream_id: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn local_settings(&self) -> &Settings {
        &self.local_settings
    }

    pub fn remote_settings(&self) -> &Settings {
        &self.remote_settings
    }

    pub fn outbound_window_size(&self) -> u32 {
        self.outbound_window_size
    }

    pub fn inbound_window(&self) -> &WindowManager {
        &self.inbound_window_manager
    }

    /// Last stream id the peer announced in its GOAWAY, if one arrived.
    pub fn goaway_last_stream_id(&self) -> Option<u32> {
        self.goaway_last_stream_id
    }

    pub fn stream(&self, stream_id: u32) -> Option<&Stream> {
        self.streams.get(&stream_id)
    }

    /// Queue the client preface followed by our SETTINGS advertisement.
    pub fn initiate_connection(&mut self) -> Result<(), EngineError> {
        tracing::debug!("initiating connection");
        let frame = Frame::settings(false, self.local_settings.items().to_vec())?;
        self.outbound.extend_from_slice(CONNECTION_PREFACE);
        tracing::debug!(settings = ?self.local_settings.items(), "send settings frame");
        self.prepare_for_send(&[frame]);
        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Encode and queue a header block on `stream_id`, opening the
    /// stream if this is its first use. The block is split across
    /// HEADERS/CONTINUATION frames per the peer's max frame size.
    pub fn send_headers(
        &mut self,
        stream_id: u32,
        headers: &[Header],
        end_stream: bool,
        padding: Option<u8>,
        priority: Option<Priority>,
    ) -> Result<(), EngineError> {
        self.ensure_send_allowed()?;
        if stream_id < 1 || stream_id > MAX_STREAM_ID {
            return Err(ProtocolStateError::StreamIdOutOfRange { stream_id }.into());
        }
        if stream_id % 2 != 1 {
            return Err(ProtocolStateError::NotClientStreamId { stream_id }.into());
        }
        self.ensure_stream(stream_id)?;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(ProtocolStateError::StreamNotFound { stream_id })?;
        let frames = stream.send_headers(headers, &mut self.encoder, end_stream, padding, priority)?;
        tracing::debug!(stream_id, frames = frames.len(), "send headers frames");
        self.prepare_for_send(&frames);
        Ok(())
    }

    /// Feed raw transport bytes in and collect the events produced by
    /// every frame that completes. Partial frames stay buffered for the
    /// next call.
    pub fn receive_data(&mut self, data: &[u8]) -> Result<Vec<Event>, EngineError> {
        self.inbound_buffer.append(data);
        let mut events = Vec::new();
        while let Some(frame) = self.inbound_buffer.next_frame()? {
            self.dispatch_frame(frame, &mut events)?;
        }
        Ok(events)
    }

    fn dispatch_frame(&mut self, frame: Frame, events: &mut Vec<Event>) -> Result<(), EngineError> {
        match frame {
            Frame::Data {
                stream_id,
                data,
                end_stream,
                pad_length,
            } => self.receive_data_frame(stream_id, data, end_stream, pad_length, events),
            Frame::Headers {
                stream_id,
                fragment,
                end_stream,
                ..
            } => self.receive_headers_frame(stream_id, fragment, end_stream, events),
            Frame::RstStream {
                stream_id,
                error_code,
            } => self.receive_rst_stream_frame(stream_id, error_code, events),
            Frame::Settings {
                stream_id,
                ack,
                settings,
            } => self.receive_settings_frame(stream_id, ack, settings, events),
            Frame::Ping { ack, data } => self.receive_ping_frame(ack, data, events),
            Frame::GoAway {
                last_stream_id,
                error_code,
                debug_data,
            } => self.receive_goaway_frame(last_stream_id, error_code, debug_data, events),
            Frame::WindowUpdate {
                stream_id,
                increment,
            } => self.receive_window_update_frame(stream_id, increment),
            // The reassembly buffer consumes CONTINUATIONs that belong to
            // an open header block, so one surfacing here had no HEADERS
            // in front of it.
            Frame::Continuation { stream_id, .. } => {
                Err(ProtocolStateError::UnsolicitedContinuation { stream_id }.into())
            }
        }
    }

    fn receive_settings_frame(
        &mut self,
        stream_id: u32,
        ack: bool,
        settings: Vec<(u16, u32)>,
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        if stream_id != 0 {
            return Err(ProtocolStateError::SettingsOnStream { stream_id }.into());
        }
        if ack {
            tracing::debug!("received settings ack");
            return Ok(());
        }
        let mut applied = Vec::with_capacity(settings.len());
        for (id, value) in settings {
            if self.remote_settings.update(id, value) {
                applied.push((id, value));
            }
        }
        tracing::debug!(settings = ?applied, "received settings frame, sending ack");
        let ack_frame = Frame::settings(true, Vec::new())?;
        self.prepare_for_send(&[ack_frame]);
        events.push(Event::SettingsReceived {
            stream_id,
            settings: applied,
        });
        Ok(())
    }

    fn receive_headers_frame(
        &mut self,
        stream_id: u32,
        fragment: Bytes,
        end_stream: bool,
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        self.ensure_stream(stream_id)?;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(ProtocolStateError::StreamNotFound { stream_id })?;
        let event = stream.receive_headers(&fragment, end_stream, &mut self.decoder)?;
        tracing::debug!(stream_id, end_stream, "received headers frame");
        events.push(event);
        Ok(())
    }

    fn receive_data_frame(
        &mut self,
        stream_id: u32,
        data: Bytes,
        end_stream: bool,
        pad_length: Option<u8>,
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        // Flow control covers the whole wire payload: the pad-length
        // byte and the padding count against the window too.
        let flow_controlled_length = match pad_length {
            Some(pad) => 1 + data.len() as u32 + u32::from(pad),
            None => data.len() as u32,
        };
        self.inbound_window_manager.reduce(flow_controlled_length)?;
        self.ensure_stream(stream_id)?;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(ProtocolStateError::StreamNotFound { stream_id })?;
        let event = stream.receive_data(data, end_stream, flow_controlled_length)?;
        tracing::debug!(stream_id, end_stream, "received data frame");
        events.push(event);
        Ok(())
    }

    fn receive_rst_stream_frame(
        &mut self,
        stream_id: u32,
        error_code: u32,
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        self.ensure_stream(stream_id)?;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(ProtocolStateError::StreamNotFound { stream_id })?;
        if stream.state() == StreamState::Idle {
            return Err(ProtocolStateError::RstOnIdleStream { stream_id }.into());
        }
        let event = stream.receive_rst_stream(error_code)?;
        tracing::debug!(stream_id, error_code, "received rst_stream frame");
        events.push(event);
        Ok(())
    }

    fn receive_goaway_frame(
        &mut self,
        last_stream_id: u32,
        error_code: u32,
        debug_data: Bytes,
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        self.goaway_last_stream_id = Some(last_stream_id);
        self.state = ConnectionState::Closed;
        tracing::debug!(last_stream_id, error_code, "received goaway frame");
        events.push(Event::GoawayReceived {
            stream_id: 0,
            error_code,
            error_message: debug_data,
        });
        Ok(())
    }

    /// Credits the connection-level outbound budget whatever stream the
    /// frame names; per-stream outbound accounting is not enforced.
    fn receive_window_update_frame(
        &mut self,
        stream_id: u32,
        increment: u32,
    ) -> Result<(), EngineError> {
        let next = u64::from(self.outbound_window_size) + u64::from(increment);
        if next > u64::from(MAX_FLOW_CONTROL_WINDOW) {
            return Err(FlowControlError::WindowOverflow.into());
        }
        self.outbound_window_size += increment;
        tracing::debug!(stream_id, increment, "received window_update frame");
        Ok(())
    }

    fn receive_ping_frame(
        &mut self,
        ack: bool,
        data: [u8; 8],
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        if ack {
            tracing::debug!("received ping ack");
        } else {
            tracing::debug!("received ping frame, sending ack");
            self.prepare_for_send(&[Frame::Ping { ack: true, data }]);
        }
        events.push(Event::PingReceived {
            stream_id: 0,
            ack,
            data,
        });
        Ok(())
    }

    /// Report `received_size` consumed payload bytes. Queues a
    /// connection-level WINDOW_UPDATE when the connection window manager
    /// fires, and a stream-level one as well when `stream_id` names a
    /// live stream whose manager fires.
    pub fn ack_data_received(
        &mut self,
        received_size: u32,
        stream_id: Option<u32>,
    ) -> Result<(), EngineError> {
        self.ensure_send_allowed()?;
        let mut frames = Vec::new();
        if let Some(increment) = self.inbound_window_manager.process_bytes(received_size) {
            tracing::debug!(increment, "send connection window_update");
            frames.push(Frame::window_update(0, increment)?);
        }
        if let Some(stream_id) = stream_id {
            if let Some(stream) = self.streams.get_mut(&stream_id) {
                if let Some(frame) = stream.ack_data_received(received_size)? {
                    tracing::debug!(stream_id, "send stream window_update");
                    frames.push(frame);
                }
            }
        }
        self.prepare_for_send(&frames);
        Ok(())
    }

    /// Queue a GOAWAY announcing `last_stream_id` (the highest live
    /// stream id when not given) and mark the connection closed.
    pub fn close_connection(
        &mut self,
        last_stream_id: Option<u32>,
        error_code: u32,
        error_message: &[u8],
    ) {
        let last_stream_id = match last_stream_id {
            Some(id) => id,
            None => self.max_current_stream_id(),
        };
        tracing::debug!(last_stream_id, error_code, "send goaway frame");
        self.prepare_for_send(&[Frame::GoAway {
            last_stream_id,
            error_code,
            debug_data: Bytes::copy_from_slice(error_message),
        }]);
        self.state = ConnectionState::Closed;
    }

    pub fn send_rst_stream(&mut self, stream_id: u32, error_code: u32) -> Result<(), EngineError> {
        self.ensure_send_allowed()?;
        let stream = self
            .streams
            .get_mut(&stream_id)
            .ok_or(ProtocolStateError::StreamNotFound { stream_id })?;
        let frame = stream.send_rst_stream(error_code)?;
        tracing::debug!(stream_id, error_code, "send rst_stream frame");
        self.prepare_for_send(&[frame]);
        Ok(())
    }

    pub fn send_ping(&mut self, opaque_data: &[u8]) -> Result<(), EngineError> {
        self.ensure_send_allowed()?;
        let frame = Frame::ping(opaque_data, false)?;
        tracing::debug!("send ping frame");
        self.prepare_for_send(&[frame]);
        Ok(())
    }

    pub fn send_window_update(&mut self, increment: u32, stream_id: u32) -> Result<(), EngineError> {
        self.ensure_send_allowed()?;
        let frame = Frame::window_update(stream_id, increment)?;
        tracing::debug!(stream_id, increment, "send window_update frame");
        self.prepare_for_send(&[frame]);
        Ok(())
    }

    /// Lowest odd id above the highest live stream, or `None` once the
    /// id space is exhausted. Closed streams are collected first, so
    /// their ids become reusable.
    pub fn next_available_stream_id(&mut self) -> Option<u32> {
        let current_highest = self.max_current_stream_id();
        let candidate = if current_highest % 2 == 1 {
            current_highest + 2
        } else {
            current_highest + 1
        };
        if candidate > MAX_STREAM_ID {
            None
        } else {
            Some(candidate)
        }
    }

    /// Drain the outbound buffer. The caller writes the returned bytes
    /// to the transport; the buffer is empty afterwards.
    pub fn data_to_send(&mut self) -> Bytes {
        self.outbound.split().freeze()
    }

    fn prepare_for_send(&mut self, frames: &[Frame]) {
        for frame in frames {
            self.outbound.extend_from_slice(&frame.serialize());
        }
    }

    fn ensure_send_allowed(&self) -> Result<(), EngineError> {
        if self.state == ConnectionState::Closed {
            return Err(ProtocolStateError::ConnectionClosed.into());
        }
        Ok(())
    }

    /// Create the stream if it does not exist yet. New ids must be odd,
    /// in range, and no lower than the highest live id.
    fn ensure_stream(&mut self, stream_id: u32) -> Result<(), EngineError> {
        if self.streams.contains_key(&stream_id) {
            return Ok(());
        }
        if stream_id > MAX_STREAM_ID {
            return Err(ProtocolStateError::StreamIdOutOfRange { stream_id }.into());
        }
        let max_current = self.max_current_stream_id();
        if stream_id < max_current {
            return Err(ProtocolStateError::StreamIdTooLow {
                stream_id,
                max_current,
            }
            .into());
        }
        if stream_id % 2 != 1 {
            return Err(ProtocolStateError::NotClientStreamId { stream_id }.into());
        }
        let stream = Stream::new(
            stream_id,
            self.outbound_window_size,
            self.local_settings.initial_window_size(),
            self.remote_settings.max_frame_size(),
            self.local_settings.max_frame_size(),
        );
        self.streams.insert(stream_id, stream);
        Ok(())
    }

    fn gc_closed_streams(&mut self) {
        self.streams
            .retain(|_, stream| stream.state() != StreamState::Closed);
    }

    /// Highest live stream id, collecting closed streams on the way.
    fn max_current_stream_id(&mut self) -> u32 {
        self.gc_closed_streams();
        self.streams.keys().copied().max().unwrap_or(0)
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
