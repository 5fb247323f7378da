//! A free-running microsecond counter shared by the performance engines.

use core::ops::Add;
use embassy_time::{Duration, Instant};

/// A reading of the microsecond counter.
///
/// The counter is 32 bits wide and wraps roughly every 71 minutes. Two readings may only be related by measuring
/// the distance between them with [`Micros::elapsed_since`], which uses modular subtraction and therefore stays correct
/// across the wrap. Ordering readings directly would break at the wrap, so `Micros` deliberately isn't `Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Micros(pub u32);

impl Micros {
    /// Microseconds from `earlier` to `self`.
    pub fn elapsed_since(self, earlier: Micros) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Returns `true` once at least `interval` microseconds separate `earlier` from `self`.
    pub fn has_elapsed(self, earlier: Micros, interval: u32) -> bool {
        self.elapsed_since(earlier) >= interval
    }
}

impl Add<u32> for Micros {
    type Output = Micros;

    fn add(self, rhs: u32) -> Micros {
        Micros(self.0.wrapping_add(rhs))
    }
}

/// Converts an Embassy [`Duration`] into a microsecond interval, saturating at the longest interval a [`Micros`]
/// reading can measure.
pub fn interval(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

/// Source of the current [`Micros`] reading.
///
/// The engines never read a clock themselves; the outer loop samples a `TimeBase` once per iteration and hands the
/// reading down, which keeps them testable with synthetic timestamps.
pub trait TimeBase {
    /// Returns the current reading of the counter.
    fn now(&self) -> Micros;
}

/// A [`TimeBase`] backed by the global Embassy time driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyTimeBase;

impl TimeBase for EmbassyTimeBase {
    fn now(&self) -> Micros {
        // dropping the upper bits is what makes the counter wrap
        Micros(Instant::now().as_micros() as u32)
    }
}
