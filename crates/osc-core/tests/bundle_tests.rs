//! Bundle tests for OSC core

use osc_core::{decode_packet, Bundle, Message, Packet, TimeTag};

const HEADER: &[u8] = b"#bundle\0";

#[test]
fn test_empty_bundle_wire_format() {
    let bytes = Bundle::new().marshal().unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[..8], HEADER);
    assert_eq!(&bytes[8..], &[0, 0, 0, 0, 0, 0, 0, 1]);
}

#[test]
fn test_element_size_prefix() {
    let msg = Message::new("/a").with_argument(1i32);
    let bundle = Bundle::new().with_packet(msg.clone());
    let bytes = bundle.marshal().unwrap();
    let msg_bytes = msg.marshal().unwrap();

    assert_eq!(&bytes[16..20], &(msg_bytes.len() as u32).to_be_bytes());
    assert_eq!(&bytes[20..], &msg_bytes[..]);
}

#[test]
fn test_nested_roundtrip() {
    let inner = Bundle::with_time_tag(TimeTag::from_unix(1_700_000_000, 1_000))
        .with_packet(Message::new("/inner/a").with_argument(1.5f32))
        .with_packet(Bundle::new());

    let bundle = Bundle::with_time_tag(TimeTag::from_unix(1_514_764_800, 500_000_000))
        .with_packet(Message::new("/outer").with_argument("first"))
        .with_packet(inner)
        .with_packet(Message::new("/outer").with_argument("last"));

    let bytes = bundle.marshal().unwrap();
    let decoded = Bundle::unmarshal(&bytes).expect("decode failed");
    assert_eq!(decoded, bundle);

    match decode_packet(&bytes).unwrap() {
        Packet::Bundle(b) => {
            assert_eq!(b.elements.len(), 3);
            assert!(matches!(b.elements[1], Packet::Bundle(_)));
        }
        other => panic!("Expected bundle, got {:?}", other),
    }
}

#[test]
fn test_element_order_preserved() {
    let mut bundle = Bundle::new();
    for i in 0..10 {
        bundle.add_packet(Message::new(format!("/n/{}", i)));
    }

    let decoded = Bundle::unmarshal(&bundle.marshal().unwrap()).unwrap();
    let addresses: Vec<_> = decoded
        .elements
        .iter()
        .filter_map(Packet::as_message)
        .map(|m| m.address.clone())
        .collect();
    let expected: Vec<_> = (0..10).map(|i| format!("/n/{}", i)).collect();
    assert_eq!(addresses, expected);
}

#[test]
fn test_time_tag_inequality() {
    let a = Bundle::with_time_tag(TimeTag::from_unix(1, 0));
    let b = Bundle::with_time_tag(TimeTag::from_unix(2, 0));
    assert_ne!(a, b);
    assert_eq!(a, Bundle::with_time_tag(TimeTag::from_unix(1, 0)));
}
