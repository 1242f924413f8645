//! Tests for frame header parsing

use h2_wire_engine::{flags, frame_type, FrameHeader, WireFormatError};

#[test]
fn test_frame_header_parse() {
    // DATA frame, length 5, stream 1, END_STREAM
    let header_bytes = [0, 0, 5, 0, 1, 0, 0, 0, 1];
    let header = FrameHeader::parse(&header_bytes).unwrap();

    assert_eq!(header.length, 5);
    assert_eq!(header.frame_type, frame_type::DATA);
    assert_eq!(header.stream_id, 1);
    assert!(header.has_flag(flags::END_STREAM));
    assert!(!header.has_flag(flags::END_HEADERS));
}

#[test]
fn test_frame_header_headers() {
    // HEADERS frame, length 10, stream 3, END_HEADERS
    let header_bytes = [0, 0, 10, 1, 4, 0, 0, 0, 3];
    let header = FrameHeader::parse(&header_bytes).unwrap();

    assert_eq!(header.length, 10);
    assert_eq!(header.frame_type, frame_type::HEADERS);
    assert_eq!(header.stream_id, 3);
    assert!(!header.has_flag(flags::END_STREAM));
    assert!(header.has_flag(flags::END_HEADERS));
}

#[test]
fn test_stream_id_clears_reserved_bit() {
    // Reserved bit set on the stream id word
    let header_bytes = [0, 0, 0, 4, 0, 0x80, 0x00, 0x00, 0x05];
    let header = FrameHeader::parse(&header_bytes).unwrap();
    assert_eq!(
        header.stream_id, 5,
        "Reserved bit should be cleared from stream ID"
    );
}

#[test]
fn test_total_size() {
    let header_bytes = [0, 0, 5, 0, 1, 0, 0, 0, 1];
    let header = FrameHeader::parse(&header_bytes).unwrap();
    assert_eq!(header.total_size(), 14);
}

#[test]
fn test_length_is_24_bits() {
    let header_bytes = [0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0, 1];
    let header = FrameHeader::parse(&header_bytes).unwrap();
    assert_eq!(header.length, (1 << 24) - 1);
    assert_eq!(header.total_size(), 9 + ((1 << 24) - 1));
}

#[test]
fn test_short_header_is_malformed() {
    let err = FrameHeader::parse(&[0, 0, 5, 0, 1, 0, 0, 0]).unwrap_err();
    assert_eq!(err, WireFormatError::MalformedHeader);
    assert_eq!(
        FrameHeader::parse(&[]).unwrap_err(),
        WireFormatError::MalformedHeader
    );
}

#[test]
fn test_combined_flag_bits() {
    // END_STREAM | END_HEADERS | PRIORITY
    let header_bytes = [0, 0, 6, 1, 0x25, 0, 0, 0, 1];
    let header = FrameHeader::parse(&header_bytes).unwrap();
    assert!(header.has_flag(flags::END_STREAM));
    assert!(header.has_flag(flags::END_HEADERS));
    assert!(header.has_flag(flags::PRIORITY));
    assert!(!header.has_flag(flags::PADDED));
}
