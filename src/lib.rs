#![warn(missing_docs)]

//! # Heated-Tool Temperature Regulation Core
//!
//! The control core of a small temperature-regulation device (a heated-tool
//! or extruder controller) running as a slave peripheral on a shared bus: a
//! thermocouple is read through an analog front end, noisy samples are
//! filtered and validated, a PID loop regulates toward a set-point, and a
//! heater is driven through a PWM output, all inside a cooperative,
//! interrupt-driven scheduler with no dynamic memory.
//!
//! ## What lives where
//!
//! - [`tick`]: the interrupt-shared pending-tick flag and the nested
//!   down-counters deriving the 100 ms and 1 s cadences from the 10 ms tick.
//! - [`sensor`]: the acquisition state machine, with per-sample outlier
//!   rejection, period averaging, and disconnection / power-loss / unstable
//!   classification.
//! - [`pid`]: the fixed-step PID controller, in functionally pure and
//!   stateful flavours, with validated configuration.
//! - [`heater`]: the supervision state machine, covering arming, regulation
//!   timeouts, overheat cutoff, and the PID-to-duty wiring.
//! - [`pwm`]: frequency-to-top-value and duty-to-compare-value arithmetic
//!   over a thin output driver trait.
//! - [`regs`]: the byte-addressed register file the host reads and writes.
//! - [`device`]: the composition of all of the above plus the dispatch
//!   loop.
//!
//! Hardware touches the crate in exactly three places: a
//! [`sensor::SampleSource`] (one raw analog reading per call; any
//! `FnMut(u8) -> f32` works), a [`pwm::PwmDriver`] (program the timer top
//! and compare values), and a `static` [`tick::TickFlag`] set from the
//! timer interrupt.
//!
//! ## Usage
//!
//! ```rust
//! use hotend_ctl::device::{Device, DeviceConfig};
//! use hotend_ctl::pwm::PwmDriver;
//! use hotend_ctl::tick::TickFlag;
//!
//! // Set from the 10 ms timer ISR; drained by the poll loop.
//! static TICK: TickFlag = TickFlag::new();
//!
//! struct Timer2;
//! impl PwmDriver for Timer2 {
//!     fn set_top(&mut self, _top: u8) { /* program the period register */ }
//!     fn set_compare(&mut self, _compare: u8) { /* program the duty register */ }
//! }
//!
//! // Any `FnMut(u8) -> f32` is a raw sample source.
//! let mut device = Device::new(|_channel: u8| 24.5, Timer2, DeviceConfig::default());
//! device.turn_heater_on();
//!
//! TICK.set(); // normally done by the timer ISR
//! assert!(device.poll(&TICK));
//! assert!(!device.poll(&TICK)); // idempotent until the next tick fires
//! ```
//!
//! The host side talks to the device purely through single-byte register
//! access at bus addresses:
//!
//! ```rust
//! # use hotend_ctl::device::{Device, DeviceConfig, REGISTER_BASE};
//! # use hotend_ctl::pwm::PwmDriver;
//! # use hotend_ctl::regs;
//! # struct Pins;
//! # impl PwmDriver for Pins {
//! #     fn set_top(&mut self, _top: u8) {}
//! #     fn set_compare(&mut self, _compare: u8) {}
//! # }
//! # let mut device = Device::new(|_channel: u8| 24.5, Pins, DeviceConfig::default());
//! // Host sets a 210.0 degree set-point (0.1 degree units, little endian).
//! device.bus_write(REGISTER_BASE + regs::SETPOINT, 0x34).unwrap();
//! device.bus_write(REGISTER_BASE + regs::SETPOINT + 1, 0x08).unwrap();
//!
//! // Out-of-window addresses fail without touching anything.
//! assert!(device.bus_read(0x00).is_err());
//! ```
#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod heater;
pub mod pid;
pub mod pwm;
pub mod regs;
pub mod sensor;
pub mod tick;

#[doc(hidden)]
#[cfg(feature = "simulation")]
pub mod sim;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
