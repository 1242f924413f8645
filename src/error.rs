//! Error taxonomy for the engine.
//!
//! Four families, split by where the fault lies: bytes that cannot be
//! trusted (wire format), a peer or caller driving a stream illegally
//! (protocol state), flow-control accounting violations, and frames
//! rejected at construction time before any bytes are produced
//! (configuration). All of them are fatal to their scope; the engine
//! never retries internally.

use thiserror::Error as ThisError;

use crate::stream::{StreamInput, StreamState};

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum WireFormatError {
    #[error("malformed frame header")]
    MalformedHeader,
    #[error("{kind} frame too short")]
    Truncated { kind: &'static str },
    #[error("{kind} frame too long")]
    Oversized { kind: &'static str },
    #[error("invalid padding length in {kind} frame")]
    InvalidPadding { kind: &'static str },
    #[error("unknown frame type 0x{code:x}")]
    UnknownFrameType { code: u8 },
    #[error("header block decode failed: {detail}")]
    HeaderBlockDecode { detail: String },
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolStateError {
    #[error("invalid transition from {state:?} on {input:?}")]
    InvalidTransition {
        state: StreamState,
        input: StreamInput,
    },
    #[error("no stream {stream_id} to operate on")]
    StreamNotFound { stream_id: u32 },
    #[error("RST_STREAM received on idle stream {stream_id}")]
    RstOnIdleStream { stream_id: u32 },
    #[error("expected CONTINUATION while header block open on stream {stream_id}")]
    ExpectedContinuation { stream_id: u32 },
    #[error("CONTINUATION on stream {stream_id} without an open header block")]
    UnsolicitedContinuation { stream_id: u32 },
    #[error("CONTINUATION for stream {actual} but header block open on stream {expected}")]
    ContinuationStreamMismatch { expected: u32, actual: u32 },
    #[error("too many buffered CONTINUATION fragments")]
    ContinuationBacklogExceeded,
    #[error("stream id {stream_id} is out of range")]
    StreamIdOutOfRange { stream_id: u32 },
    #[error("new stream id {stream_id} must be higher than {max_current}")]
    StreamIdTooLow { stream_id: u32, max_current: u32 },
    #[error("stream id {stream_id} is not a client id (must be odd)")]
    NotClientStreamId { stream_id: u32 },
    #[error("SETTINGS frame carried on stream {stream_id}, expected stream 0")]
    SettingsOnStream { stream_id: u32 },
    #[error("connection is closed")]
    ConnectionClosed,
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum FlowControlError {
    #[error("flow control window below 0")]
    WindowUnderflow,
    #[error("flow control window above 2^31-1")]
    WindowOverflow,
    #[error("invalid window increment {increment}")]
    InvalidIncrement { increment: u32 },
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("settings must be empty when ACK is set")]
    AckWithPayload,
    #[error("ping opaque data is {len} bytes, limit is 8")]
    PingDataTooLong { len: usize },
    #[error("padding and priority need {overhead} bytes, frame size limit is {max_frame_size}")]
    OverheadExceedsFrameSize { overhead: usize, max_frame_size: u32 },
    #[error("frame size limit is zero")]
    ZeroMaxFrameSize,
}

/// Top-level error type returned by every fallible engine operation.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("wire format error: {0}")]
    Wire(#[from] WireFormatError),
    #[error("protocol state error: {0}")]
    State(#[from] ProtocolStateError),
    #[error("flow control error: {0}")]
    Flow(#[from] FlowControlError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigurationError),
}
