//! Codec and dispatch benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use osc_core::{decode_packet, AddressSpace, Bundle, Message, TimeTag};

fn sample_message() -> Message {
    Message::new("/oscillator/4/frequency")
        .with_argument(440.0f32)
        .with_argument(1i32)
        .with_argument("sine")
}

fn encode_benchmark(c: &mut Criterion) {
    let msg = sample_message();

    c.bench_function("marshal_message", |b| {
        b.iter(|| black_box(msg.marshal().unwrap()))
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let encoded = sample_message().marshal().unwrap();

    c.bench_function("decode_message_packet", |b| {
        b.iter(|| black_box(decode_packet(&encoded).unwrap()))
    });
}

fn bundle_benchmark(c: &mut Criterion) {
    let mut bundle = Bundle::with_time_tag(TimeTag::now());
    for i in 0..16 {
        bundle.add_packet(Message::new(format!("/mixer/{}/gain", i)).with_argument(0.5f32));
    }
    let encoded = bundle.marshal().unwrap();

    c.bench_function("decode_bundle_16", |b| {
        b.iter(|| black_box(decode_packet(&encoded).unwrap()))
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let space = AddressSpace::new();
    for pattern in [
        "/oscillator/*/frequency",
        "/oscillator/{1,2,3}/gain",
        "/mixer/![0-3]/mute",
    ] {
        space
            .handle(pattern, |m| {
                black_box(m);
            })
            .unwrap();
    }
    let msg = sample_message();

    c.bench_function("dispatch_message", |b| {
        b.iter(|| black_box(space.dispatch(&msg)))
    });
}

criterion_group!(
    benches,
    encode_benchmark,
    decode_benchmark,
    bundle_benchmark,
    dispatch_benchmark
);
criterion_main!(benches);
