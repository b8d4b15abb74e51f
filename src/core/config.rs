//! Global configuration surface.
//!
//! Everything here is fixed at startup; there is no runtime reconfiguration.

use core::time::Duration;

use super::hal::AnalogPin;
use super::{Calibration, Hysteresis};

/// Most samples ever averaged per reading. A 10-bit sample is at most 1023,
/// so 63 samples keep the running sum within a 16-bit accumulator.
pub const MAX_SAMPLE_COUNT: u8 = 63;

/// Engine-wide settings shared by all channels.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Two-point sensor calibration.
    pub calibration: Calibration,
    /// Samples averaged per reading; clamped to `1..=`[`MAX_SAMPLE_COUNT`]
    /// when sampling.
    pub sample_count: u8,
    /// Change gate applied to moisture and reference readings alike.
    pub hysteresis: Hysteresis,
    /// Total sleep between cycles.
    pub cycle_interval: Duration,
    /// Wait after powering a sensor before its oscillator is steady.
    pub settle_delay: Duration,
    /// Input the shared reference potentiometer rail is wired to.
    pub reference_pin: AnalogPin,
}

impl Config {
    /// Number of samples actually taken per reading.
    pub fn effective_sample_count(&self) -> u8 {
        if self.sample_count == 0 {
            1
        } else if self.sample_count > MAX_SAMPLE_COUNT {
            MAX_SAMPLE_COUNT
        } else {
            self.sample_count
        }
    }
}

impl Default for Config {
    /// Values of the reference board: probe calibrated at 150 (submersed) and
    /// 660 (dry air) counts, 4 averaged samples, 2-point tolerance, 10 minute
    /// cycle, 2 second sensor settle, reference dial on analog input 4.
    fn default() -> Self {
        Self {
            calibration: Calibration::from_raw_counts(150, 660),
            sample_count: 4,
            hysteresis: Hysteresis::from_percentage_points(2),
            cycle_interval: Duration::from_secs(10 * 60),
            settle_delay: Duration::from_secs(2),
            reference_pin: AnalogPin::new(4),
        }
    }
}
