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

#[cfg(test)]
pub mod rig {

    use hotend_ctl::heater::{Heater, HeaterConfig};
    use hotend_ctl::pid::{PidConfig, PidConfigBuilder};
    use hotend_ctl::pwm::PwmDriver;
    use hotend_ctl::sensor::{SampleSource, Sensor, SensorConfig};

    /// Replays a scripted sequence of raw samples, repeating the final one
    /// forever, and counts every draw.
    pub struct ScriptedSource {
        samples: Vec<f32>,
        index: usize,
        pub draws: usize,
    }

    impl ScriptedSource {
        pub fn new(samples: &[f32]) -> Self {
            assert!(!samples.is_empty());
            Self {
                samples: samples.to_vec(),
                index: 0,
                draws: 0,
            }
        }
    }

    impl SampleSource for ScriptedSource {
        fn sample(&mut self, _channel: u8) -> f32 {
            self.draws += 1;
            let sample = self.samples[self.index];
            if self.index + 1 < self.samples.len() {
                self.index += 1;
            }
            sample
        }
    }

    /// Records the last programmed top and compare values.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RecordingPwm {
        pub top: u8,
        pub compare: u8,
    }

    impl PwmDriver for RecordingPwm {
        fn set_top(&mut self, top: u8) {
            self.top = top;
        }

        fn set_compare(&mut self, compare: u8) {
            self.compare = compare;
        }
    }

    /// A sensor taking `samples_per_reading` samples per period with the
    /// given variance threshold and the stock rail levels.
    pub fn make_sensor(samples_per_reading: u8, variance: f32) -> Sensor {
        Sensor::new(SensorConfig {
            samples_per_reading,
            variance,
            ..SensorConfig::default()
        })
    }

    /// Proportional-only regulation bounded to the duty range, at the
    /// 100 ms cadence.
    pub fn p_only_pid(kp: f32) -> PidConfig<f32> {
        PidConfigBuilder::default()
            .kp(kp)
            .epsilon(0.01)
            .sample_time(0.1)
            .output_limits(0.0, 100.0)
            .build()
            .unwrap()
    }

    /// A heater with short timeouts so tests count ticks, not minutes:
    /// 1 s to leave ambient, 2 s to regulate.
    pub fn make_heater(kp: f32) -> Heater {
        Heater::new(
            HeaterConfig {
                ambient_timeout: 1.0,
                regulation_timeout: 2.0,
                ..HeaterConfig::default()
            },
            p_only_pid(kp),
        )
    }

    /// One full heater cadence: the 100 ms supervision step followed by
    /// enough 10 ms sensor polls to complete the period it started.
    pub fn heater_cycle(
        heater: &mut Heater,
        sensor: &mut Sensor,
        source: &mut impl SampleSource,
    ) -> f32 {
        let duty = heater.poll(sensor);
        for _ in 0..sensor.config().samples_per_reading {
            sensor.poll(source);
        }
        duty
    }
}
