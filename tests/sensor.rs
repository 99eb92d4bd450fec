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

mod fixtures;
use fixtures::rig::{make_sensor, ScriptedSource};

use hotend_ctl::sensor::{SensorCode, SensorState};

use approx::assert_relative_eq;

#[test]
fn test_period_averages_in_variance_samples() {
    let mut sensor = make_sensor(4, 0.5);
    let mut source = ScriptedSource::new(&[150.0, 150.2, 149.9, 150.1]);

    // No validated data while the period is in flight
    for _ in 0..3 {
        assert_eq!(sensor.poll(&mut source), SensorCode::Ok);
        assert_eq!(sensor.state(), SensorState::HasNoData);
        assert_eq!(sensor.temperature(), None);
    }

    // The fourth sample completes the period with the mean as the reading
    assert_eq!(sensor.poll(&mut source), SensorCode::Ok);
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_relative_eq!(sensor.temperature().unwrap(), 150.05, epsilon = 1e-4);
}

#[test]
fn test_variance_reference_tracks_last_accepted_sample() {
    // Each step is within the threshold of its predecessor even though the
    // total drift is not
    let mut sensor = make_sensor(4, 5.0);
    let mut source = ScriptedSource::new(&[100.0, 104.0, 108.0, 112.0]);

    for _ in 0..4 {
        sensor.poll(&mut source);
    }
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_relative_eq!(sensor.temperature().unwrap(), 106.0, epsilon = 1e-4);
    assert_eq!(source.draws, 4);
}

#[test]
fn test_rail_high_classifies_as_disconnected() {
    let mut sensor = make_sensor(4, 5.0);
    let mut source = ScriptedSource::new(&[450.0]);

    for _ in 0..4 {
        sensor.poll(&mut source);
    }
    assert_eq!(sensor.state(), SensorState::HasNoData);
    assert_eq!(sensor.code(), SensorCode::Disconnected);
    assert_eq!(sensor.temperature(), None);
}

#[test]
fn test_rail_low_classifies_as_no_power() {
    let mut sensor = make_sensor(4, 5.0);
    let mut source = ScriptedSource::new(&[-80.0]);

    for _ in 0..4 {
        sensor.poll(&mut source);
    }
    assert_eq!(sensor.state(), SensorState::HasNoData);
    assert_eq!(sensor.code(), SensorCode::NoPower);
    assert_eq!(sensor.temperature(), None);
}

#[test]
fn test_retry_exhaustion_latches_shutdown() {
    // The second tick's sample jumps far outside the variance band and
    // every resample repeats it
    let mut sensor = make_sensor(4, 0.5);
    let mut source = ScriptedSource::new(&[150.0, 200.0]);

    assert_eq!(sensor.poll(&mut source), SensorCode::Ok);
    assert_eq!(sensor.samples(), 1);

    // Shutdown latches even though the period was barely started
    assert_eq!(sensor.poll(&mut source), SensorCode::BadReadings);
    assert_eq!(sensor.state(), SensorState::Shutdown);
    assert_eq!(sensor.temperature(), None);

    // One rejected draw plus the full retry budget
    assert_eq!(source.draws, 1 + 1 + 4);

    // Latched: no further sampling happens
    assert_eq!(sensor.poll(&mut source), SensorCode::BadReadings);
    assert_eq!(source.draws, 6);
}

#[test]
fn test_spike_within_retry_budget_is_absorbed() {
    // One outlier, then the line recovers: the resample succeeds and the
    // period completes normally
    let mut sensor = make_sensor(2, 0.5);
    let mut source = ScriptedSource::new(&[150.0, 190.0, 150.2]);

    sensor.poll(&mut source);
    assert_eq!(sensor.poll(&mut source), SensorCode::Ok);
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_relative_eq!(sensor.temperature().unwrap(), 150.1, epsilon = 1e-4);
    assert_eq!(source.draws, 3);
}

#[test]
fn test_completed_period_holds_until_restarted() {
    let mut sensor = make_sensor(2, 5.0);
    let mut source = ScriptedSource::new(&[100.0]);

    sensor.poll(&mut source);
    sensor.poll(&mut source);
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_eq!(sensor.samples(), 2);
    assert_eq!(source.draws, 2);

    // Without a new period the callback is a no-op
    sensor.poll(&mut source);
    assert_eq!(sensor.samples(), 2);
    assert_eq!(source.draws, 2);

    sensor.start_reading();
    sensor.poll(&mut source);
    assert_eq!(sensor.samples(), 1);
    assert_eq!(source.draws, 3);
}

#[test]
fn test_start_reading_truncates_period_in_progress() {
    let mut sensor = make_sensor(3, 5.0);
    let mut source = ScriptedSource::new(&[10.0, 20.0, 20.4, 20.2]);

    sensor.poll(&mut source);
    assert_eq!(sensor.samples(), 1);

    // Restart mid-period: the collected sample is discarded and the next
    // poll seeds a fresh reference
    sensor.start_reading();
    for _ in 0..3 {
        sensor.poll(&mut source);
    }
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_relative_eq!(sensor.temperature().unwrap(), 20.2, epsilon = 1e-4);
}

#[test]
fn test_reset_clears_latched_shutdown() {
    let mut sensor = make_sensor(2, 0.5);
    let mut source = ScriptedSource::new(&[150.0, 200.0]);

    sensor.poll(&mut source);
    sensor.poll(&mut source);
    assert_eq!(sensor.state(), SensorState::Shutdown);

    sensor.reset();
    assert_eq!(sensor.state(), SensorState::HasNoData);
    assert_eq!(sensor.code(), SensorCode::Ok);

    // A steady source regains a validated reading
    let mut steady = ScriptedSource::new(&[151.0]);
    sensor.poll(&mut steady);
    sensor.poll(&mut steady);
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_relative_eq!(sensor.temperature().unwrap(), 151.0, epsilon = 1e-4);
}

#[test]
fn test_recovery_from_disconnect_when_probe_returns() {
    let mut sensor = make_sensor(2, 5.0);
    let mut railed = ScriptedSource::new(&[450.0]);

    sensor.poll(&mut railed);
    sensor.poll(&mut railed);
    assert_eq!(sensor.code(), SensorCode::Disconnected);

    // Disconnection is not latched: the next full period recovers
    sensor.start_reading();
    let mut steady = ScriptedSource::new(&[152.0]);
    sensor.poll(&mut steady);
    sensor.poll(&mut steady);
    assert_eq!(sensor.state(), SensorState::HasData);
    assert_eq!(sensor.code(), SensorCode::Ok);
}
