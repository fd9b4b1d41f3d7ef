//! Cycle-counter clock for latency measurement.
//!
//! Callers timestamp RPC operations with [`CycleClock::now_cycles`] (a raw
//! cycle-counter read, a handful of nanoseconds) and convert deltas to wall
//! time with the frequency calibrated once at hub construction. On targets
//! without an accessible cycle counter the monotonic clock stands in and the
//! "frequency" is exactly 1 GHz, i.e. one cycle per nanosecond.

use std::time::{Duration, Instant};

/// Two-point calibration window. Long enough to keep the measured frequency
/// within a fraction of a percent, short enough not to stall construction.
const CALIBRATION_WINDOW: Duration = Duration::from_millis(10);

/// A cycle counter calibrated against the monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct CycleClock {
    freq_ghz: f64,
}

impl CycleClock {
    /// Measure the cycle-counter frequency against the monotonic clock.
    pub fn calibrate() -> Self {
        let start_cycles = Self::now_cycles();
        let start = Instant::now();
        std::thread::sleep(CALIBRATION_WINDOW);
        let cycles = Self::now_cycles().wrapping_sub(start_cycles);
        let nanos = start.elapsed().as_nanos().max(1) as f64;

        Self { freq_ghz: (cycles as f64 / nanos).max(f64::MIN_POSITIVE) }
    }

    /// Read the current cycle count.
    #[cfg(target_arch = "x86_64")]
    #[allow(unsafe_code)]
    pub fn now_cycles() -> u64 {
        // SAFETY: RDTSC reads the time-stamp counter into registers; it has
        // no memory-safety preconditions and is available on every x86_64.
        unsafe { core::arch::x86_64::_rdtsc() }
    }

    /// Read the current cycle count (monotonic-clock fallback).
    #[cfg(not(target_arch = "x86_64"))]
    pub fn now_cycles() -> u64 {
        use std::sync::OnceLock;

        static EPOCH: OnceLock<Instant> = OnceLock::new();
        EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }

    /// Calibrated counter frequency in GHz.
    pub fn freq_ghz(&self) -> f64 {
        self.freq_ghz
    }

    /// Convert a cycle delta to wall time.
    pub fn cycles_to_duration(&self, cycles: u64) -> Duration {
        Duration::from_nanos((cycles as f64 / self.freq_ghz) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibrated_frequency_is_positive() {
        let clock = CycleClock::calibrate();
        assert!(clock.freq_ghz() > 0.0);
    }

    #[test]
    fn cycle_counts_do_not_decrease() {
        let a = CycleClock::now_cycles();
        let b = CycleClock::now_cycles();
        assert!(b >= a);
    }

    #[test]
    fn conversion_scales_with_cycles() {
        let clock = CycleClock::calibrate();
        assert_eq!(clock.cycles_to_duration(0), Duration::ZERO);

        let short = clock.cycles_to_duration(1_000);
        let long = clock.cycles_to_duration(1_000_000);
        assert!(long > short);
    }

    #[test]
    fn sleep_measures_in_right_ballpark() {
        let clock = CycleClock::calibrate();

        let start = CycleClock::now_cycles();
        std::thread::sleep(Duration::from_millis(20));
        let measured = clock.cycles_to_duration(CycleClock::now_cycles().wrapping_sub(start));

        // Sleep overshoots but never undershoots; allow generous slack for
        // loaded CI machines.
        assert!(measured >= Duration::from_millis(15), "measured {measured:?}");
        assert!(measured <= Duration::from_secs(2), "measured {measured:?}");
    }
}
