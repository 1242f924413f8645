//! Tests for DATA delivery, flow-control accounting, and WINDOW_UPDATE.

use bytes::Bytes;
use h2_wire_engine::{
    Connection, EngineError, Event, FlowControlError, Frame, Header, StreamState,
};

use crate::common::{parse_all, peer_block, request_headers};

/// Open stream 1 with a request and drain the handshake bytes.
fn conn_with_open_stream() -> Connection {
    let mut conn = Connection::new();
    conn.initiate_connection().unwrap();
    conn.send_headers(1, &request_headers(), false, None, None)
        .unwrap();
    conn.data_to_send();
    conn
}

fn data_frame(stream_id: u32, payload: &[u8], end_stream: bool) -> Vec<u8> {
    Frame::Data {
        stream_id,
        data: Bytes::copy_from_slice(payload),
        end_stream,
        pad_length: None,
    }
    .serialize()
}

#[test]
fn test_data_received_event_and_windows() {
    let mut conn = conn_with_open_stream();
    let events = conn.receive_data(&data_frame(1, b"hello", false)).unwrap();

    assert_eq!(
        events,
        vec![Event::DataReceived {
            stream_id: 1,
            data: Bytes::from_static(b"hello"),
            end_stream: false,
            flow_controlled_length: 5,
        }]
    );
    // Charged against both the connection and the stream
    assert_eq!(conn.inbound_window().current_window_size(), 65530);
    let stream = conn.stream(1).unwrap();
    assert_eq!(stream.inbound_window().current_window_size(), 65530);
    // DATA never moves the state machine on the receive path
    assert_eq!(stream.state(), StreamState::Open);
}

#[test]
fn test_padded_data_charges_full_length() {
    let mut conn = conn_with_open_stream();
    let frame = Frame::Data {
        stream_id: 1,
        data: Bytes::from_static(b"hello"),
        end_stream: true,
        pad_length: Some(2),
    };
    let events = conn.receive_data(&frame.serialize()).unwrap();

    // 1 pad-length byte + 5 data + 2 padding
    assert_eq!(
        events,
        vec![Event::DataReceived {
            stream_id: 1,
            data: Bytes::from_static(b"hello"),
            end_stream: true,
            flow_controlled_length: 8,
        }]
    );
    assert_eq!(conn.inbound_window().current_window_size(), 65527);
}

#[test]
fn test_ack_below_half_window_is_silent() {
    let mut conn = conn_with_open_stream();
    conn.receive_data(&data_frame(1, &vec![0u8; 1000], false))
        .unwrap();
    conn.ack_data_received(1000, Some(1)).unwrap();

    assert!(conn.data_to_send().is_empty());
    // Processed bytes accumulate toward the next threshold crossing
    assert_eq!(conn.inbound_window().bytes_processed(), 1000);
}

#[test]
fn test_ack_past_half_window_updates_both_levels() {
    let mut conn = conn_with_open_stream();
    conn.receive_data(&data_frame(1, &vec![0u8; 40_000], false))
        .unwrap();
    conn.ack_data_received(40_000, Some(1)).unwrap();

    let frames = parse_all(&conn.data_to_send());
    assert_eq!(
        frames,
        vec![
            Frame::WindowUpdate {
                stream_id: 0,
                increment: 40_000,
            },
            Frame::WindowUpdate {
                stream_id: 1,
                increment: 40_000,
            },
        ]
    );
    // Windows restored to their maxima
    assert_eq!(conn.inbound_window().current_window_size(), 65535);
    assert_eq!(
        conn.stream(1)
            .unwrap()
            .inbound_window()
            .current_window_size(),
        65535
    );
}

#[test]
fn test_ack_without_stream_id_skips_stream_update() {
    let mut conn = conn_with_open_stream();
    conn.receive_data(&data_frame(1, &vec![0u8; 40_000], false))
        .unwrap();
    conn.ack_data_received(40_000, None).unwrap();

    let frames = parse_all(&conn.data_to_send());
    assert_eq!(
        frames,
        vec![Frame::WindowUpdate {
            stream_id: 0,
            increment: 40_000,
        }]
    );
}

#[test]
fn test_data_past_window_underflows() {
    let mut conn = conn_with_open_stream();
    let err = conn
        .receive_data(&data_frame(1, &vec![0u8; 65_536], false))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowControlError::WindowUnderflow)
    ));
}

#[test]
fn test_window_update_credits_outbound() {
    let mut conn = Connection::new();
    let frames = Frame::WindowUpdate {
        stream_id: 0,
        increment: 1000,
    };
    let events = conn.receive_data(&frames.serialize()).unwrap();

    assert!(events.is_empty());
    assert_eq!(conn.outbound_window_size(), 66_535);
}

#[test]
fn test_window_update_on_stream_credits_connection() {
    // Stream-level credit lands on the connection scalar; streams carry
    // no outbound bookkeeping of their own.
    let mut conn = conn_with_open_stream();
    let frame = Frame::WindowUpdate {
        stream_id: 1,
        increment: 500,
    };
    conn.receive_data(&frame.serialize()).unwrap();

    assert_eq!(conn.outbound_window_size(), 66_035);
    assert_eq!(conn.stream(1).unwrap().outbound_window_size(), 65_535);
}

#[test]
fn test_window_update_overflow_rejected() {
    let mut conn = Connection::new();
    let park_at_max = Frame::WindowUpdate {
        stream_id: 0,
        increment: (1 << 31) - 1 - 65_535,
    };
    conn.receive_data(&park_at_max.serialize()).unwrap();
    assert_eq!(conn.outbound_window_size(), (1 << 31) - 1);

    let one_more = Frame::WindowUpdate {
        stream_id: 0,
        increment: 1,
    };
    let err = conn.receive_data(&one_more.serialize()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Flow(FlowControlError::WindowOverflow)
    ));
}

#[test]
fn test_data_creates_stream_when_unseen() {
    let mut conn = Connection::new();
    let events = conn.receive_data(&data_frame(1, b"early", false)).unwrap();

    assert_eq!(events.len(), 1);
    let stream = conn.stream(1).unwrap();
    assert_eq!(stream.state(), StreamState::Idle);
    assert_eq!(stream.inbound_window().current_window_size(), 65_530);
}

#[test]
fn test_response_headers_then_body_events_ordered() {
    let mut conn = Connection::new();
    conn.send_headers(1, &request_headers(), true, None, None)
        .unwrap();
    conn.data_to_send();

    let mut wire = Vec::new();
    wire.extend_from_slice(
        &Frame::Headers {
            stream_id: 1,
            fragment: peer_block(&[Header::new(":status", "200")]),
            end_stream: false,
            end_headers: true,
            pad_length: None,
            priority: None,
        }
        .serialize(),
    );
    wire.extend_from_slice(&data_frame(1, b"body", true));

    let events = conn.receive_data(&wire).unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::HeadersReceived { .. }));
    assert!(matches!(
        events[1],
        Event::DataReceived { end_stream: true, .. }
    ));
    assert_eq!(
        conn.stream(1).unwrap().state(),
        StreamState::HalfClosedLocal
    );
}
