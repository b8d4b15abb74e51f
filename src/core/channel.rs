//! Per-channel configuration, state and the bounded-retry rules.

use core::time::Duration;

use super::hal::{AnalogPin, ChannelId, MuxAddress};
use super::{Hysteresis, MoistureLevel, RawMeasurement};

/// Channels the engine supports. The reference board wires four.
pub const MAX_CHANNELS: usize = 4;

/// Reference level a freshly started channel assumes until the dial has been
/// read for the first time.
const INITIAL_REFERENCE_PERCENT: u8 = 25;

/// Immutable per-channel settings, fixed for the device lifetime.
#[derive(Clone, Copy, Debug)]
pub struct ChannelConfig {
    pub id: ChannelId,
    /// How long one pump attempt runs.
    pub pump_duration: Duration,
    /// Attempts tolerated before the channel gives up until recovery.
    pub max_pump_attempts: u8,
    /// Analog input the channel's sensor is wired to.
    pub sensor_pin: AnalogPin,
    /// Multiplexer circuit powering the sensor and reference dial.
    pub sensor_address: MuxAddress,
    /// Multiplexer circuit driving the pump.
    pub pump_address: MuxAddress,
}

impl ChannelConfig {
    /// Channel wired the way the reference board routes it: the sensor and
    /// pump circuits of channel `id`, sensor on analog input `id`.
    pub const fn for_channel(id: ChannelId, pump_duration: Duration, max_pump_attempts: u8) -> Self {
        Self {
            id,
            pump_duration,
            max_pump_attempts,
            sensor_pin: AnalogPin::new(id.index() as u8),
            sensor_address: MuxAddress::Sensor(id),
            pump_address: MuxAddress::Pump(id),
        }
    }
}

/// Where a channel stands in the retry cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChannelStatus {
    /// Level at or above reference; attempts are reset.
    Ok,
    /// Below reference with attempts left; eligible for a pump run.
    Dry,
    /// Below reference with attempts spent; no actuation until recovery.
    Exhausted,
}

/// Mutable per-channel state, updated in place every cycle.
///
/// Created once at startup and never persisted; a restart reinitializes it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelState {
    /// Filtered percent of saturation, clamped to 0..=99.
    pub moisture_level: MoistureLevel,
    /// Raw counts behind the last accepted level change, for diagnostics.
    pub moisture_level_raw: RawMeasurement,
    /// Filtered target percent from the reference dial, unclamped above 99.
    pub moisture_reference_level: MoistureLevel,
    /// Pump runs since the channel was last at or above reference.
    pub pump_attempts: u8,
}

impl ChannelState {
    /// Startup default: level treated as satisfactory so nothing pumps before
    /// the first real reading has been absorbed.
    pub const fn new() -> Self {
        Self {
            moisture_level: MoistureLevel::max(),
            moisture_level_raw: RawMeasurement::from_counts(0),
            moisture_reference_level: MoistureLevel::from_percent(INITIAL_REFERENCE_PERCENT),
            pump_attempts: 0,
        }
    }

    /// `true` when the soil is at or above the demanded moisture.
    pub fn recovered(&self) -> bool {
        self.moisture_level >= self.moisture_reference_level
    }

    /// Classify the channel against its attempt budget.
    pub fn status(&self, config: &ChannelConfig) -> ChannelStatus {
        if self.recovered() {
            ChannelStatus::Ok
        } else if self.pump_attempts < config.max_pump_attempts {
            ChannelStatus::Dry
        } else {
            ChannelStatus::Exhausted
        }
    }

    /// Absorb one cycle's conditioned readings.
    ///
    /// Readings replace stored values only past the hysteresis gate; the raw
    /// counts are kept as the diagnostic behind an accepted level change.
    /// Recovery resets the attempt counter unconditionally, even mid-retry.
    /// Returns whether the channel needs the update path this cycle, which a
    /// channel below reference always does so its attempts get evaluated even
    /// when the reading itself sat still.
    pub fn absorb(
        &mut self,
        level: MoistureLevel,
        raw: RawMeasurement,
        reference: MoistureLevel,
        hysteresis: Hysteresis,
    ) -> bool {
        let mut changed = false;
        if hysteresis.changed(self.moisture_level, level) {
            self.moisture_level = level;
            self.moisture_level_raw = raw;
            changed = true;
        }
        if hysteresis.changed(self.moisture_reference_level, reference) {
            self.moisture_reference_level = reference;
            changed = true;
        }
        if self.recovered() {
            self.pump_attempts = 0;
        } else {
            changed = true;
        }
        changed
    }

    /// Count a pump run against the budget. Saturates at the maximum; the
    /// counter only ever returns to zero through recovery.
    pub fn record_pump_attempt(&mut self, config: &ChannelConfig) {
        if self.pump_attempts < config.max_pump_attempts {
            self.pump_attempts += 1;
        }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// One irrigation channel: its fixed wiring and its live state.
#[derive(Clone, Copy, Debug)]
pub struct Channel {
    pub config: ChannelConfig,
    pub state: ChannelState,
}

impl Channel {
    pub const fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            state: ChannelState::new(),
        }
    }
}
