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

//! Tick scheduling: the interrupt-shared pending flag and the cadence
//! down-counters.
//!
//! A hardware timer interrupt calls [`TickFlag::set`] roughly every 10 ms
//! and does nothing else; the cooperative side drains the flag with
//! [`TickFlag::take`]. That single atomic flag is the only state shared
//! with interrupt context, so the critical section is exactly one
//! read-modify-write.
//!
//! [`Ticker`] derives the slower cadences from the 10 ms tick with nested
//! down-counters: the 100 ms and 1 s boundaries land on exact multiples of
//! the tick and accumulate no drift, at the cost of 10 ms timing
//! granularity. That is coarse, but far below thermal time constants.

use portable_atomic::{AtomicBool, Ordering};

/// The pending-tick flag shared between the timer interrupt and the
/// cooperative poll loop. Designed to live in a `static`.
pub struct TickFlag {
    pending: AtomicBool,
}

impl TickFlag {
    /// Creates a flag with no tick pending.
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Marks a tick pending. The only operation the interrupt handler
    /// performs on shared state.
    pub fn set(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consumes a pending tick, returning whether one was pending.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Returns whether a tick is pending without consuming it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

const RELOAD: u8 = 10;

/// Cadence boundaries crossed by one tick. The 10 ms cadence is implicit:
/// every advanced tick is one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cadence {
    /// This tick completes a 100 ms interval.
    pub hundred_ms: bool,
    /// This tick completes a 1 s interval.
    pub one_sec: bool,
}

/// Nested down-counters deriving the 100 ms and 1 s cadences from the
/// 10 ms tick.
pub struct Ticker {
    count_100ms: u8,
    count_1sec: u8,
}

impl Ticker {
    /// Creates a ticker with both counters fully loaded.
    pub fn new() -> Self {
        Self {
            count_100ms: RELOAD,
            count_1sec: RELOAD,
        }
    }

    /// Consumes one 10 ms tick and reports which slower boundaries it
    /// crossed. The 1 s counter only moves on 100 ms boundaries, keeping
    /// the cadences phase-locked.
    pub fn advance(&mut self) -> Cadence {
        let mut cadence = Cadence::default();
        self.count_100ms -= 1;
        if self.count_100ms == 0 {
            self.count_100ms = RELOAD;
            cadence.hundred_ms = true;
            self.count_1sec -= 1;
            if self.count_1sec == 0 {
                self.count_1sec = RELOAD;
                cadence.one_sec = true;
            }
        }
        cadence
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_consumed_exactly_once() {
        let flag = TickFlag::new();
        assert!(!flag.take());
        flag.set();
        assert!(flag.is_pending());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_boundaries_land_on_exact_multiples() {
        let mut ticker = Ticker::new();
        let mut hundreds = 0u32;
        let mut seconds = 0u32;
        for tick in 1..=1000u32 {
            let cadence = ticker.advance();
            assert_eq!(cadence.hundred_ms, tick % 10 == 0);
            assert_eq!(cadence.one_sec, tick % 100 == 0);
            hundreds += cadence.hundred_ms as u32;
            seconds += cadence.one_sec as u32;
        }
        assert_eq!(hundreds, 100);
        assert_eq!(seconds, 10);
    }
}
