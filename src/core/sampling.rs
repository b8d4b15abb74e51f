//! Raw acquisition for one channel: power the sensor path up, settle, take a
//! few averaged samples of the sensor and its reference dial, power down.

use super::channel::ChannelConfig;
use super::config::Config;
use super::hal::{sleep_total, AnalogSampler, ChannelMux, SleepTimer};
use super::RawMeasurement;

/// Averaged raw counts of one acquisition pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawReadings {
    pub moisture: RawMeasurement,
    pub reference: RawMeasurement,
}

/// Acquire one channel's readings.
///
/// The sensors are noisy, so a handful of samples is averaged; the reference
/// dial barely is, but it shares the acquisition pass anyway. The multiplexer
/// path is released before returning, whatever happened in between, so the
/// shared rail is never left powering a sensor circuit.
pub fn acquire<A, M, T>(
    sampler: &mut A,
    mux: &mut M,
    timer: &mut T,
    config: &Config,
    channel: &ChannelConfig,
) -> RawReadings
where
    A: AnalogSampler,
    M: ChannelMux,
    T: SleepTimer,
{
    mux.select(channel.sensor_address);
    // Wait until the oscillator on the sensor is steady.
    sleep_total(timer, config.settle_delay);

    let count = config.effective_sample_count();
    // Accumulators stay 16-bit: the sample bound guarantees no overflow for
    // 10-bit conversions.
    let mut moisture_sum: u16 = 0;
    let mut reference_sum: u16 = 0;
    for _ in 0..count {
        moisture_sum += sampler.read(channel.sensor_pin);
        reference_sum += sampler.read(config.reference_pin);
    }

    mux.deselect();

    RawReadings {
        moisture: RawMeasurement::from_counts(moisture_sum / u16::from(count)),
        reference: RawMeasurement::from_counts(reference_sum / u16::from(count)),
    }
}
