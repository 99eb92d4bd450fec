//! Benchmark for the regulation hot path
// Copyright © 2026 hotend_ctl developers
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hotend_ctl::device::{Device, DeviceConfig};
use hotend_ctl::pid::{PidConfigBuilder, PidController};
use hotend_ctl::pwm::PwmDriver;
use hotend_ctl::sensor::{Sensor, SensorConfig};
use hotend_ctl::tick::TickFlag;

struct NullPwm;

impl PwmDriver for NullPwm {
    fn set_top(&mut self, _top: u8) {}
    fn set_compare(&mut self, _compare: u8) {}
}

/// One PID computation is the most frequent arithmetic in the 100 ms path;
/// it should stay in the nanosecond range.
fn bench_pid_compute(c: &mut Criterion) {
    let config = PidConfigBuilder::default()
        .kp(5.0)
        .ki(0.1)
        .kd(0.4)
        .epsilon(0.01)
        .sample_time(0.1)
        .output_limits(0.0, 100.0)
        .build()
        .unwrap();
    let mut pid = PidController::new(config);
    let mut measured = 150.0f32;

    c.bench_function("pid compute", |b| {
        b.iter(|| {
            let output = pid.compute(black_box(measured), black_box(200.0));
            measured += 0.001; // prevent constant inputs
            black_box(output);
        });
    });
}

/// One sensor poll is the 10 ms path: a draw, a variance check and an
/// accumulate, plus the period classification every tenth call.
fn bench_sensor_poll(c: &mut Criterion) {
    let mut sensor = Sensor::new(SensorConfig::default());
    let mut phase = 0.0f32;

    c.bench_function("sensor poll", |b| {
        b.iter(|| {
            phase += 0.01;
            if sensor.samples() >= sensor.config().samples_per_reading {
                sensor.start_reading();
            }
            sensor.poll(&mut |_channel: u8| black_box(150.0 + phase % 1.0));
        });
    });
}

/// A full device tick: flag drain, sensor sampling and, on the cadence
/// boundaries, the heater, PWM and register publish.
fn bench_device_tick(c: &mut Criterion) {
    let mut device = Device::new(
        |_channel: u8| black_box(150.0),
        NullPwm,
        DeviceConfig::default(),
    );
    let tick = TickFlag::new();
    device.turn_heater_on();

    c.bench_function("device tick", |b| {
        b.iter(|| {
            tick.set();
            black_box(device.poll(&tick));
        });
    });
}

criterion_group!(
    benches,
    bench_pid_compute,
    bench_sensor_poll,
    bench_device_tick
);
criterion_main!(benches);
