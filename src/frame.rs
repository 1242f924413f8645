//! HTTP/2 frame codec: wire header plus one tagged variant per frame type.
//!
//! Parsing accepts the eight registered frame types and rejects everything
//! else (PRIORITY and PUSH_PROMISE are deliberately unregistered on the
//! client side). Serialization is the exact inverse: `Frame::parse` of a
//! `Frame::serialize` yields the original frame, padding included.

use bytes::Bytes;

use crate::error::{ConfigurationError, EngineError, FlowControlError, WireFormatError};

/// HTTP/2 frame types (RFC 7540 Section 6)
#[allow(dead_code)]
pub mod frame_type {
    pub const DATA: u8 = 0x0;
    pub const HEADERS: u8 = 0x1;
    pub const PRIORITY: u8 = 0x2;
    pub const RST_STREAM: u8 = 0x3;
    pub const SETTINGS: u8 = 0x4;
    pub const PUSH_PROMISE: u8 = 0x5;
    pub const PING: u8 = 0x6;
    pub const GOAWAY: u8 = 0x7;
    pub const WINDOW_UPDATE: u8 = 0x8;
    pub const CONTINUATION: u8 = 0x9;
}

/// HTTP/2 frame flags
#[allow(dead_code)]
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 error codes (RFC 7540 Section 7)
#[allow(dead_code)]
pub mod error_code {
    pub const NO_ERROR: u32 = 0x0;
    pub const PROTOCOL_ERROR: u32 = 0x1;
    pub const INTERNAL_ERROR: u32 = 0x2;
    pub const FLOW_CONTROL_ERROR: u32 = 0x3;
    pub const SETTINGS_TIMEOUT: u32 = 0x4;
    pub const STREAM_CLOSED: u32 = 0x5;
    pub const FRAME_SIZE_ERROR: u32 = 0x6;
    pub const REFUSED_STREAM: u32 = 0x7;
    pub const CANCEL: u32 = 0x8;
    pub const COMPRESSION_ERROR: u32 = 0x9;
    pub const CONNECT_ERROR: u32 = 0xa;
    pub const ENHANCE_YOUR_CALM: u32 = 0xb;
    pub const INADEQUATE_SECURITY: u32 = 0xc;
    pub const HTTP_1_1_REQUIRED: u32 = 0xd;
}

/// The client connection preface (24 bytes), sent before any frame.
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Largest stream id and window size expressible in 31 bits.
pub const MAX_STREAM_ID: u32 = (1 << 31) - 1;

const MAX_WINDOW_INCREMENT: u32 = (1 << 31) - 1;

/// A parsed 9-byte frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u32, // 24 bits
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: u32, // 31 bits (high bit reserved)
}

impl FrameHeader {
    /// Parse a frame header from at least 9 bytes.
    pub fn parse(data: &[u8]) -> Result<Self, WireFormatError> {
        if data.len() < 9 {
            return Err(WireFormatError::MalformedHeader);
        }
        let length = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32);
        let frame_type = data[3];
        let flags = data[4];
        let stream_id = ((data[5] as u32) << 24)
            | ((data[6] as u32) << 16)
            | ((data[7] as u32) << 8)
            | (data[8] as u32);
        let stream_id = stream_id & 0x7FFF_FFFF; // Clear reserved bit
        Ok(Self {
            length,
            frame_type,
            flags,
            stream_id,
        })
    }

    /// Total frame size including the 9-byte header.
    pub fn total_size(&self) -> usize {
        9 + self.length as usize
    }

    pub fn has_flag(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }
}

/// Priority fields carried on a HEADERS frame when the PRIORITY flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub exclusive: bool,
    pub dependency: u32, // 31 bits
    pub weight: u8,
}

impl Default for Priority {
    fn default() -> Self {
        Self {
            exclusive: false,
            dependency: 0,
            weight: 16,
        }
    }
}

/// One HTTP/2 frame, parsed or about to be serialized.
///
/// Flags live as typed fields on each variant rather than a raw bit set;
/// undefined flag bits on the wire are ignored during parsing, the same
/// way a masked flag register would drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data {
        stream_id: u32,
        data: Bytes,
        end_stream: bool,
        /// `Some` exactly when the PADDED flag is set; 0 is a legal length.
        pad_length: Option<u8>,
    },
    Headers {
        stream_id: u32,
        fragment: Bytes,
        end_stream: bool,
        end_headers: bool,
        pad_length: Option<u8>,
        priority: Option<Priority>,
    },
    RstStream {
        stream_id: u32,
        error_code: u32,
    },
    Settings {
        stream_id: u32,
        ack: bool,
        settings: Vec<(u16, u32)>,
    },
    Ping {
        ack: bool,
        data: [u8; 8],
    },
    GoAway {
        last_stream_id: u32,
        error_code: u32,
        debug_data: Bytes,
    },
    WindowUpdate {
        stream_id: u32,
        increment: u32,
    },
    Continuation {
        stream_id: u32,
        fragment: Bytes,
        end_headers: bool,
    },
}

impl Frame {
    /// Build a SETTINGS frame, refusing an ACK that carries settings.
    pub fn settings(ack: bool, settings: Vec<(u16, u32)>) -> Result<Self, EngineError> {
        if ack && !settings.is_empty() {
            return Err(ConfigurationError::AckWithPayload.into());
        }
        Ok(Frame::Settings {
            stream_id: 0,
            ack,
            settings,
        })
    }

    /// Build a PING frame, zero-padding the opaque data to 8 bytes.
    pub fn ping(opaque_data: &[u8], ack: bool) -> Result<Self, EngineError> {
        if opaque_data.len() > 8 {
            return Err(ConfigurationError::PingDataTooLong {
                len: opaque_data.len(),
            }
            .into());
        }
        let mut data = [0u8; 8];
        data[..opaque_data.len()].copy_from_slice(opaque_data);
        Ok(Frame::Ping { ack, data })
    }

    /// Build a WINDOW_UPDATE frame, rejecting a zero or out-of-range increment.
    pub fn window_update(stream_id: u32, increment: u32) -> Result<Self, EngineError> {
        if increment == 0 || increment > MAX_WINDOW_INCREMENT {
            return Err(FlowControlError::InvalidIncrement { increment }.into());
        }
        Ok(Frame::WindowUpdate {
            stream_id,
            increment,
        })
    }

    /// The stream this frame belongs to (0 for connection-level frames).
    pub fn stream_id(&self) -> u32 {
        match self {
            Frame::Data { stream_id, .. }
            | Frame::Headers { stream_id, .. }
            | Frame::RstStream { stream_id, .. }
            | Frame::Settings { stream_id, .. }
            | Frame::WindowUpdate { stream_id, .. }
            | Frame::Continuation { stream_id, .. } => *stream_id,
            Frame::Ping { .. } | Frame::GoAway { .. } => 0,
        }
    }

    /// Frame type name, for logs and error context.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Data { .. } => "DATA",
            Frame::Headers { .. } => "HEADERS",
            Frame::RstStream { .. } => "RST_STREAM",
            Frame::Settings { .. } => "SETTINGS",
            Frame::Ping { .. } => "PING",
            Frame::GoAway { .. } => "GOAWAY",
            Frame::WindowUpdate { .. } => "WINDOW_UPDATE",
            Frame::Continuation { .. } => "CONTINUATION",
        }
    }

    /// Serialized payload length, excluding the 9-byte header.
    ///
    /// For DATA frames this is also the flow-controlled length: padding
    /// and the pad-length byte consume window just like the data itself.
    pub fn body_len(&self) -> usize {
        match self {
            Frame::Data {
                data, pad_length, ..
            } => match pad_length {
                Some(pad) => 1 + data.len() + *pad as usize,
                None => data.len(),
            },
            Frame::Headers {
                fragment,
                pad_length,
                priority,
                ..
            } => {
                let mut len = fragment.len();
                if let Some(pad) = pad_length {
                    len += 1 + *pad as usize;
                }
                if priority.is_some() {
                    len += 5;
                }
                len
            }
            Frame::RstStream { .. } => 4,
            Frame::Settings { settings, .. } => settings.len() * 6,
            Frame::Ping { .. } => 8,
            Frame::GoAway { debug_data, .. } => 8 + debug_data.len(),
            Frame::WindowUpdate { .. } => 4,
            Frame::Continuation { fragment, .. } => fragment.len(),
        }
    }

    fn flag_bits(&self) -> u8 {
        match self {
            Frame::Data {
                end_stream,
                pad_length,
                ..
            } => {
                let mut bits = 0;
                if *end_stream {
                    bits |= flags::END_STREAM;
                }
                if pad_length.is_some() {
                    bits |= flags::PADDED;
                }
                bits
            }
            Frame::Headers {
                end_stream,
                end_headers,
                pad_length,
                priority,
                ..
            } => {
                let mut bits = 0;
                if *end_stream {
                    bits |= flags::END_STREAM;
                }
                if *end_headers {
                    bits |= flags::END_HEADERS;
                }
                if pad_length.is_some() {
                    bits |= flags::PADDED;
                }
                if priority.is_some() {
                    bits |= flags::PRIORITY;
                }
                bits
            }
            Frame::Settings { ack, .. } | Frame::Ping { ack, .. } => {
                if *ack {
                    flags::ACK
                } else {
                    0
                }
            }
            Frame::Continuation { end_headers, .. } => {
                if *end_headers {
                    flags::END_HEADERS
                } else {
                    0
                }
            }
            Frame::RstStream { .. } | Frame::GoAway { .. } | Frame::WindowUpdate { .. } => 0,
        }
    }

    /// Serialize header and payload into a fresh byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let body_len = self.body_len();
        let mut out = Vec::with_capacity(9 + body_len);
        out.push((body_len >> 16) as u8);
        out.push((body_len >> 8) as u8);
        out.push(body_len as u8);
        out.push(self.type_code());
        out.push(self.flag_bits());
        out.extend_from_slice(&(self.stream_id() & 0x7FFF_FFFF).to_be_bytes());
        self.serialize_body(&mut out);
        out
    }

    fn type_code(&self) -> u8 {
        match self {
            Frame::Data { .. } => frame_type::DATA,
            Frame::Headers { .. } => frame_type::HEADERS,
            Frame::RstStream { .. } => frame_type::RST_STREAM,
            Frame::Settings { .. } => frame_type::SETTINGS,
            Frame::Ping { .. } => frame_type::PING,
            Frame::GoAway { .. } => frame_type::GOAWAY,
            Frame::WindowUpdate { .. } => frame_type::WINDOW_UPDATE,
            Frame::Continuation { .. } => frame_type::CONTINUATION,
        }
    }

    fn serialize_body(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Data {
                data, pad_length, ..
            } => {
                if let Some(pad) = pad_length {
                    out.push(*pad);
                    out.extend_from_slice(data);
                    out.resize(out.len() + *pad as usize, 0);
                } else {
                    out.extend_from_slice(data);
                }
            }
            Frame::Headers {
                fragment,
                pad_length,
                priority,
                ..
            } => {
                if let Some(pad) = pad_length {
                    out.push(*pad);
                }
                if let Some(p) = priority {
                    let word = (p.dependency & 0x7FFF_FFFF)
                        | if p.exclusive { 0x8000_0000 } else { 0 };
                    out.extend_from_slice(&word.to_be_bytes());
                    out.push(p.weight);
                }
                out.extend_from_slice(fragment);
                if let Some(pad) = pad_length {
                    out.resize(out.len() + *pad as usize, 0);
                }
            }
            Frame::RstStream { error_code, .. } => {
                out.extend_from_slice(&error_code.to_be_bytes());
            }
            Frame::Settings { settings, .. } => {
                for (id, value) in settings {
                    out.extend_from_slice(&id.to_be_bytes());
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
            Frame::Ping { data, .. } => {
                out.extend_from_slice(data);
            }
            Frame::GoAway {
                last_stream_id,
                error_code,
                debug_data,
            } => {
                out.extend_from_slice(&(last_stream_id & 0x7FFF_FFFF).to_be_bytes());
                out.extend_from_slice(&error_code.to_be_bytes());
                out.extend_from_slice(debug_data);
            }
            Frame::WindowUpdate { increment, .. } => {
                out.extend_from_slice(&(increment & 0x7FFF_FFFF).to_be_bytes());
            }
            Frame::Continuation { fragment, .. } => {
                out.extend_from_slice(fragment);
            }
        }
    }

    /// Parse a frame body against its already-parsed header.
    pub fn parse(header: &FrameHeader, payload: Bytes) -> Result<Frame, EngineError> {
        match header.frame_type {
            frame_type::DATA => parse_data(header, payload),
            frame_type::HEADERS => parse_headers(header, payload),
            frame_type::RST_STREAM => {
                if payload.len() < 4 {
                    return Err(WireFormatError::Truncated { kind: "RST_STREAM" }.into());
                }
                let error_code = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
                Ok(Frame::RstStream {
                    stream_id: header.stream_id,
                    error_code,
                })
            }
            frame_type::SETTINGS => {
                if payload.len() % 6 != 0 {
                    return Err(WireFormatError::Truncated { kind: "SETTINGS" }.into());
                }
                let mut settings = Vec::with_capacity(payload.len() / 6);
                for chunk in payload.chunks_exact(6) {
                    let id = u16::from_be_bytes([chunk[0], chunk[1]]);
                    let value = u32::from_be_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);
                    settings.push((id, value));
                }
                Ok(Frame::Settings {
                    stream_id: header.stream_id,
                    ack: header.has_flag(flags::ACK),
                    settings,
                })
            }
            frame_type::PING => {
                // PING bodies are exactly eight opaque bytes
                if payload.len() < 8 {
                    return Err(WireFormatError::Truncated { kind: "PING" }.into());
                }
                if payload.len() > 8 {
                    return Err(WireFormatError::Oversized { kind: "PING" }.into());
                }
                let mut data = [0u8; 8];
                data.copy_from_slice(&payload);
                Ok(Frame::Ping {
                    ack: header.has_flag(flags::ACK),
                    data,
                })
            }
            frame_type::GOAWAY => {
                if payload.len() < 8 {
                    return Err(WireFormatError::Truncated { kind: "GOAWAY" }.into());
                }
                let last_stream_id =
                    u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]])
                        & 0x7FFF_FFFF;
                let error_code =
                    u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
                Ok(Frame::GoAway {
                    last_stream_id,
                    error_code,
                    debug_data: payload.slice(8..),
                })
            }
            frame_type::WINDOW_UPDATE => {
                if payload.len() < 4 {
                    return Err(WireFormatError::Truncated {
                        kind: "WINDOW_UPDATE",
                    }
                    .into());
                }
                let increment =
                    u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]])
                        & 0x7FFF_FFFF;
                Ok(Frame::WindowUpdate {
                    stream_id: header.stream_id,
                    increment,
                })
            }
            frame_type::CONTINUATION => Ok(Frame::Continuation {
                stream_id: header.stream_id,
                fragment: payload,
                end_headers: header.has_flag(flags::END_HEADERS),
            }),
            code => Err(WireFormatError::UnknownFrameType { code }.into()),
        }
    }
}

fn parse_data(header: &FrameHeader, payload: Bytes) -> Result<Frame, EngineError> {
    let (data, pad_length) = if header.has_flag(flags::PADDED) {
        if payload.is_empty() {
            return Err(WireFormatError::InvalidPadding { kind: "DATA" }.into());
        }
        let pad = payload[0];
        if pad as usize >= payload.len() {
            return Err(WireFormatError::InvalidPadding { kind: "DATA" }.into());
        }
        let end = payload.len() - pad as usize;
        (payload.slice(1..end), Some(pad))
    } else {
        (payload, None)
    };
    Ok(Frame::Data {
        stream_id: header.stream_id,
        data,
        end_stream: header.has_flag(flags::END_STREAM),
        pad_length,
    })
}

fn parse_headers(header: &FrameHeader, payload: Bytes) -> Result<Frame, EngineError> {
    let (stripped, pad_length) = if header.has_flag(flags::PADDED) {
        if payload.is_empty() {
            return Err(WireFormatError::InvalidPadding { kind: "HEADERS" }.into());
        }
        let pad = payload[0];
        if pad as usize >= payload.len() {
            return Err(WireFormatError::InvalidPadding { kind: "HEADERS" }.into());
        }
        let end = payload.len() - pad as usize;
        (payload.slice(1..end), Some(pad))
    } else {
        (payload, None)
    };

    let (fragment, priority) = if header.has_flag(flags::PRIORITY) {
        if stripped.len() < 5 {
            return Err(WireFormatError::Truncated { kind: "HEADERS" }.into());
        }
        let word = u32::from_be_bytes([stripped[0], stripped[1], stripped[2], stripped[3]]);
        let priority = Priority {
            exclusive: word & 0x8000_0000 != 0,
            dependency: word & 0x7FFF_FFFF,
            weight: stripped[4],
        };
        (stripped.slice(5..), Some(priority))
    } else {
        (stripped, None)
    };

    Ok(Frame::Headers {
        stream_id: header.stream_id,
        fragment,
        end_stream: header.has_flag(flags::END_STREAM),
        end_headers: header.has_flag(flags::END_HEADERS),
        pad_length,
        priority,
    })
}
