//! Dispatch tests for the OSC address space

use osc_core::{decode_packet, AddressSpace, Message};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_pattern_table() {
    let cases = [
        ("/foo/?", "/foo/1", true),
        ("/foo/?", "/foo/12", false),
        ("/foo/*", "/foo/bar", true),
        ("/a/{x,y,z}", "/a/x", true),
        ("/a/{x,y,z}", "/a/y", true),
        ("/a/{x,y,z}", "/a/q", false),
    ];

    for (pattern, address, expected) in cases {
        let space = AddressSpace::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        space
            .handle(pattern, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        space.dispatch(&Message::new(address));
        assert_eq!(
            hits.load(Ordering::SeqCst) == 1,
            expected,
            "{} against {}",
            address,
            pattern
        );
    }
}

#[test]
fn test_handler_receives_decoded_message() {
    let space = AddressSpace::new();
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let slot = seen.clone();
    space
        .handle("/synth/*/freq", move |msg| {
            *slot.lock() = msg.arguments[0].as_f32();
        })
        .unwrap();

    let bytes = Message::new("/synth/2/freq")
        .with_argument(220.0f32)
        .marshal()
        .unwrap();
    let packet = decode_packet(&bytes).unwrap();
    assert_eq!(space.dispatch_packet(&packet), 1);
    assert_eq!(*seen.lock(), Some(220.0));
}

#[test]
fn test_concurrent_registration_and_dispatch() {
    let space = Arc::new(AddressSpace::new());
    let hits = Arc::new(AtomicUsize::new(0));

    let registrars: Vec<_> = (0..4)
        .map(|t| {
            let space = space.clone();
            let hits = hits.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let hits = hits.clone();
                    space
                        .handle(&format!("/t{}/{}", t, i), move |_| {
                            hits.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    let dispatchers: Vec<_> = (0..4)
        .map(|_| {
            let space = space.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    space.dispatch(&Message::new("/nothing"));
                }
            })
        })
        .collect();

    for handle in registrars.into_iter().chain(dispatchers) {
        handle.join().unwrap();
    }

    // No registration may be lost under contention
    assert_eq!(space.len(), 200);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    for t in 0..4 {
        for i in 0..50 {
            assert_eq!(space.dispatch(&Message::new(format!("/t{}/{}", t, i))), 1);
        }
    }
    assert_eq!(hits.load(Ordering::SeqCst), 200);
}
