//! h2-wire-engine: a sans-I/O HTTP/2 client protocol engine
//!
//! This crate turns raw transport bytes into protocol events and caller
//! operations into transport bytes, without ever touching a socket. It
//! is the client-side core of an HTTP/2 connection: frame codec, stream
//! state machine, CONTINUATION reassembly, settings negotiation and
//! flow-control accounting.
//!
//! # Features
//!
//! - **Sans-I/O Design**: no async runtime, no transport; you own the
//!   socket and the locks
//! - **Full Frame Codec**: DATA, HEADERS, CONTINUATION, SETTINGS,
//!   RST_STREAM, GOAWAY, PING, WINDOW_UPDATE
//! - **Stream State Machine**: the full seven-state lifecycle per
//!   stream, with illegal transitions rejected before any bytes move
//! - **HPACK Support**: header compression via fluke-hpack
//! - **Flow Control**: windowed inbound accounting with hysteresis-based
//!   WINDOW_UPDATE generation
//! - **CONTINUATION Assembly**: header blocks split across frames are
//!   merged before they surface as events
//!
//! # Quick Start
//!
//! ```rust
//! use h2_wire_engine::{Connection, Event, Header};
//!
//! let mut conn = Connection::new();
//! conn.initiate_connection().unwrap();
//!
//! // Open stream 1 with a request
//! conn.send_headers(
//!     1,
//!     &[Header::new(":method", "GET"), Header::new(":path", "/")],
//!     true,
//!     None,
//!     None,
//! ).unwrap();
//!
//! // Drain the preface, SETTINGS and HEADERS bytes for the transport
//! let outgoing = conn.data_to_send();
//! assert!(!outgoing.is_empty());
//!
//! // Feed transport reads back in; complete frames become events
//! for event in conn.receive_data(&[]).unwrap() {
//!     match event {
//!         Event::HeadersReceived { stream_id, headers, .. } => {
//!             println!("headers on stream {}: {} fields", stream_id, headers.len());
//!         }
//!         Event::DataReceived { stream_id, data, .. } => {
//!             println!("data on stream {}: {} bytes", stream_id, data.len());
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! Inbound: bytes → reassembly buffer → frame → dispatch → stream and
//! window updates → events out. Outbound: operation → frames → serialized
//! into a buffer drained by [`Connection::data_to_send`].
//!
//! It does NOT provide:
//! - TCP/TLS transport or ALPN (you provide the bytes)
//! - Server-side push handling
//! - Prioritization trees or retry policy
//!
//! # Use Cases
//!
//! - **Crawlers and HTTP clients**: protocol core under a connection pool
//! - **Proxies and test harnesses**: drive HTTP/2 exchanges byte-exactly
//! - **Protocol testing**: deterministic, synchronous, no async machinery

pub mod buffer;
pub mod connection;
pub mod error;
pub mod events;
pub mod frame;
pub mod hpack;
pub mod settings;
pub mod stream;
pub mod window;

pub use buffer::{FrameBuffer, CONTINUATION_BACKLOG};
pub use connection::{Connection, ConnectionState, MAX_FLOW_CONTROL_WINDOW};
pub use error::{
    ConfigurationError, EngineError, FlowControlError, ProtocolStateError, WireFormatError,
};
pub use events::Event;
pub use frame::{
    error_code, flags, frame_type, Frame, FrameHeader, Priority, CONNECTION_PREFACE, MAX_STREAM_ID,
};
pub use hpack::{Header, HeaderDecoder, HeaderEncoder};
pub use settings::{settings_id, Settings};
pub use stream::{Stream, StreamInput, StreamState};
pub use window::WindowManager;
