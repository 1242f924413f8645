//! Tests for HPACK encoding

use h2_wire_engine::{Header, HeaderDecoder, HeaderEncoder};

#[test]
fn test_encode_decode_roundtrip() {
    let mut encoder = HeaderEncoder::new();
    let mut decoder = HeaderDecoder::new();
    let headers = vec![
        Header::new(":status", "200"),
        Header::new("content-type", "application/json"),
    ];
    let encoded = encoder.encode(&headers);
    let decoded = decoder.decode(&encoded).unwrap();
    assert_eq!(decoded, headers);
}

#[test]
fn test_encode_literal_header() {
    let mut encoder = HeaderEncoder::new();
    let mut decoder = HeaderDecoder::new();
    let headers = vec![Header::new("x-custom", "value")];
    let encoded = encoder.encode(&headers);
    let decoded = decoder.decode(&encoded).unwrap();
    assert_eq!(decoded[0].name, "x-custom");
}

#[test]
fn test_encode_indexed_header() {
    let mut encoder = HeaderEncoder::new();
    let mut decoder = HeaderDecoder::new();
    let headers = vec![Header::new(":method", "GET")];
    let encoded = encoder.encode(&headers);
    let decoded = decoder.decode(&encoded).unwrap();
    assert_eq!(decoded[0].value, "GET");
}

#[test]
fn test_encode_multiple_headers() {
    let mut encoder = HeaderEncoder::new();
    let mut decoder = HeaderDecoder::new();
    let headers = vec![
        Header::new(":method", "GET"),
        Header::new(":path", "/"),
        Header::new(":scheme", "https"),
    ];
    let encoded = encoder.encode(&headers);
    let decoded = decoder.decode(&encoded).unwrap();
    assert_eq!(decoded.len(), 3);
}

#[test]
fn test_dynamic_table_shrinks_repeat_blocks() {
    // The second encode of the same block should hit the dynamic table
    // and come out shorter than the literal first encode.
    let mut encoder = HeaderEncoder::new();
    let headers = vec![Header::new("x-request-id", "abc-123-def")];
    let first = encoder.encode(&headers);
    let second = encoder.encode(&headers);
    assert!(second.len() < first.len());

    // A decoder fed both blocks in order stays in sync
    let mut decoder = HeaderDecoder::new();
    assert_eq!(decoder.decode(&first).unwrap(), headers);
    assert_eq!(decoder.decode(&second).unwrap(), headers);
}

#[test]
fn test_header_new() {
    let header = Header::new("content-type", "text/html");
    assert_eq!(header.name, "content-type");
    assert_eq!(header.value, "text/html");
}

#[test]
fn test_header_clone() {
    let header = Header::new("host", "example.com");
    let cloned = header.clone();
    assert_eq!(cloned, header);
}

#[test]
fn test_encode_decode_comprehensive_roundtrip() {
    // Mixed pseudo + regular headers, including a repeated name
    let mut encoder = HeaderEncoder::new();
    let mut decoder = HeaderDecoder::new();

    let headers = vec![
        Header::new(":status", "200"),
        Header::new("content-type", "application/json"),
        Header::new("x-request-id", "abc-123-def"),
        Header::new("set-cookie", "session=xyz"),
        Header::new("set-cookie", "theme=dark"),
    ];

    let encoded = encoder.encode(&headers);
    let decoded = decoder.decode(&encoded).unwrap();

    assert_eq!(decoded, headers);
}
