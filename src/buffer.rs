//! Inbound byte buffer and header-block reassembly.
//!
//! Raw transport reads land here. Complete frames are drained one at a
//! time; a HEADERS frame missing END_HEADERS is parked instead of
//! emitted, and the CONTINUATION frames that must follow it are merged
//! into one logical HEADERS frame once the terminating fragment shows
//! up. Parked fragments survive across `append` calls, so a header
//! block split across transport reads reassembles the same as one that
//! arrived whole.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{EngineError, ProtocolStateError};
use crate::frame::{Frame, FrameHeader};

/// Upper bound on buffered un-terminated header-block fragments.
pub const CONTINUATION_BACKLOG: usize = 64;

#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: BytesMut,
    header_blocks: Vec<Frame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes from the transport.
    pub fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    /// Stream id of the header block currently being reassembled, if any.
    pub fn pending_stream(&self) -> Option<u32> {
        self.header_blocks.first().map(|f| f.stream_id())
    }

    /// Number of bytes waiting for a complete frame.
    pub fn buffered_len(&self) -> usize {
        self.data.len()
    }

    /// Drain the next complete frame, reassembling header blocks along
    /// the way. Returns `None` when the buffered bytes do not yet form a
    /// whole frame.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, EngineError> {
        loop {
            if self.data.len() < 9 {
                return Ok(None);
            }
            let header = FrameHeader::parse(&self.data)?;
            if self.data.len() < header.total_size() {
                return Ok(None);
            }

            let mut frame_bytes = self.data.split_to(header.total_size());
            let payload = frame_bytes.split_off(9).freeze();
            let frame = Frame::parse(&header, payload)?;

            if !self.header_blocks.is_empty() {
                // A header block is open: every frame must stay on the
                // block's stream, and only CONTINUATION may arrive there.
                let expected = self.header_blocks[0].stream_id();
                if frame.stream_id() != expected {
                    return Err(ProtocolStateError::ContinuationStreamMismatch {
                        expected,
                        actual: frame.stream_id(),
                    }
                    .into());
                }
                match frame {
                    Frame::Continuation { end_headers, .. } => {
                        self.header_blocks.push(frame);
                        if end_headers {
                            return Ok(Some(self.merge_header_blocks()));
                        }
                    }
                    _ => {
                        return Err(ProtocolStateError::ExpectedContinuation {
                            stream_id: expected,
                        }
                        .into());
                    }
                }
            } else if matches!(
                frame,
                Frame::Headers {
                    end_headers: false,
                    ..
                }
            ) {
                self.header_blocks.push(frame);
            } else {
                return Ok(Some(frame));
            }

            if self.header_blocks.len() > CONTINUATION_BACKLOG {
                return Err(ProtocolStateError::ContinuationBacklogExceeded.into());
            }
        }
    }

    /// Fold all parked fragments into the opening HEADERS frame, in
    /// arrival order, and mark it END_HEADERS.
    fn merge_header_blocks(&mut self) -> Frame {
        let blocks = std::mem::take(&mut self.header_blocks);
        let total: usize = blocks.iter().map(|f| fragment_of(f).len()).sum();
        let mut merged = BytesMut::with_capacity(total);
        for block in &blocks {
            merged.put_slice(fragment_of(block));
        }
        match blocks.into_iter().next() {
            Some(Frame::Headers {
                stream_id,
                end_stream,
                pad_length,
                priority,
                ..
            }) => Frame::Headers {
                stream_id,
                fragment: merged.freeze(),
                end_stream,
                end_headers: true,
                pad_length,
                priority,
            },
            // The first parked frame is a HEADERS by construction.
            _ => unreachable!("header block opened by a non-HEADERS frame"),
        }
    }
}

fn fragment_of(frame: &Frame) -> &Bytes {
    match frame {
        Frame::Headers { fragment, .. } | Frame::Continuation { fragment, .. } => fragment,
        _ => unreachable!("only header-block frames are parked"),
    }
}
