//! Header compression collaborator (RFC 7541).
//!
//! Thin wrappers around `fluke-hpack`. The engine treats the codec as
//! opaque: ordered (name, value) pairs go in, a header block comes out,
//! and the codec keeps its own dynamic-table state per connection.

use crate::error::{EngineError, WireFormatError};

/// One decoded header, name and value as owned strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Decoder side, sized from the local settings registry.
/// Wraps `fluke_hpack::Decoder`, which holds per-connection dynamic-table state.
pub struct HeaderDecoder {
    inner: fluke_hpack::Decoder<'static>,
}

impl std::fmt::Debug for HeaderDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderDecoder").finish()
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderDecoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Decoder::new(),
        }
    }

    /// A decoder that caps the dynamic table the peer may ask for.
    pub fn with_max_table_size(max_table_size: usize) -> Self {
        let mut inner = fluke_hpack::Decoder::new();
        inner.set_max_allowed_table_size(max_table_size);
        Self { inner }
    }

    /// Decode a complete header block into an ordered header list.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Header>, EngineError> {
        let pairs = self.inner.decode(data).map_err(|e| {
            EngineError::Wire(WireFormatError::HeaderBlockDecode {
                detail: format!("{e:?}"),
            })
        })?;
        Ok(pairs
            .into_iter()
            .map(|(name, value)| {
                Header::new(
                    String::from_utf8_lossy(&name).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect())
    }
}

/// Encoder side.
/// Wraps `fluke_hpack::Encoder`, which holds per-connection dynamic-table state.
pub struct HeaderEncoder {
    inner: fluke_hpack::Encoder<'static>,
}

impl std::fmt::Debug for HeaderEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderEncoder").finish()
    }
}

impl Default for HeaderEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderEncoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Encoder::new(),
        }
    }

    /// Encode an ordered header list into a header block.
    pub fn encode(&mut self, headers: &[Header]) -> Vec<u8> {
        let pairs: Vec<(&[u8], &[u8])> = headers
            .iter()
            .map(|h| (h.name.as_bytes(), h.value.as_bytes()))
            .collect();
        self.inner.encode(pairs)
    }
}
