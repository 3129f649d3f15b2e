//! Hot path micro-benchmarks.
//!
//! - Device tick while moving (ramp + approach + limit check)
//! - Command parsing across the grammar
//! - Full line handling: parse, execute, format reply

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use huber_emulator::device::HuberDevice;
use huber_emulator::protocol::{handle_line, parse};

const DT: f64 = 0.1; // default cycle time

fn bench_tick_moving(c: &mut Criterion) {
    let mut device = HuberDevice::default();
    let mut target = 1.0e6;

    c.bench_function("device_tick_moving", |b| {
        b.iter(|| {
            if device.position() == device.target() {
                target = -target;
                device.goto(target);
            }
            device.tick(black_box(DT));
        });
    });
}

fn bench_parse(c: &mut Criterion) {
    let lines = [
        "ffast1:5000",
        "fast1+",
        "acc1:20",
        "move1:-0.1",
        "goto1:1000",
        "?p1",
        "?s1",
        "q1",
        "eref1-",
        "pos1:0.000000",
        "ecl1:0",
    ];

    c.bench_function("command_parse", |b| {
        b.iter(|| {
            for line in lines {
                let _ = black_box(parse(black_box(line)));
            }
        });
    });
}

fn bench_handle_query(c: &mut Criterion) {
    let mut device = HuberDevice::default();
    device.set_position(1234.5);

    c.bench_function("handle_line_query", |b| {
        b.iter(|| handle_line(&mut device, black_box("?p1")));
    });
}

criterion_group!(benches, bench_tick_moving, bench_parse, bench_handle_query);
criterion_main!(benches);
