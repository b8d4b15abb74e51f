//! Boundary traits the decision engine is written against.
//!
//! Everything that touches hardware sits behind one of these interfaces:
//! analog conversion, the shared channel multiplexer, pump actuation, the
//! e-paper panel and the sleep timer. All calls are blocking and infallible;
//! implementations are expected to degrade internally rather than halt the
//! control loop.

use core::time::Duration;

use super::display::Scene;

/// Identifies one monitored and irrigated channel.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct ChannelId(u8);

impl ChannelId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// One-based number as shown on the display.
    pub const fn display_number(self) -> u8 {
        self.0 + 1
    }
}

/// An analog input of the sampling hardware.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct AnalogPin(u8);

impl AnalogPin {
    pub const fn new(pin: u8) -> Self {
        Self(pin)
    }

    pub const fn to_index(self) -> u8 {
        self.0
    }
}

/// Addresses one circuit behind the shared channel multiplexer.
///
/// The engine never deals in decoder bit patterns; how a sensor or pump
/// circuit maps onto the demultiplexer lines is the [`ChannelMux`]
/// implementation's business.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MuxAddress {
    /// The sensor and reference potentiometer circuit of a channel.
    Sensor(ChannelId),
    /// The pump circuit of a channel.
    Pump(ChannelId),
}

/// Reads raw samples from analog inputs.
pub trait AnalogSampler {
    /// One raw conversion from the given input, in converter counts.
    fn read(&mut self, pin: AnalogPin) -> u16;
}

/// Routes power and signals to exactly one circuit at a time.
pub trait ChannelMux {
    /// Enable the addressed circuit. Selecting a new address implicitly
    /// releases the previous one; the rail can only drive one circuit.
    fn select(&mut self, address: MuxAddress);

    /// Release the current selection, powering the circuit down.
    fn deselect(&mut self);
}

/// Runs a pump for a bounded duration.
pub trait Actuator {
    /// Drive the addressed pump circuit for `duration`, blocking until the
    /// run completes and the hardware is deactivated again. Fire-and-forget:
    /// there is no feedback on whether water actually moved.
    fn run(&mut self, address: MuxAddress, duration: Duration);
}

/// Presents a composed scene on the status display.
pub trait DisplayRenderer {
    /// Perform a full refresh showing `scene`. Powering the panel up and down
    /// around the refresh is the renderer's responsibility.
    fn render(&mut self, scene: &Scene);
}

/// Blocking sleep with a hardware-imposed per-call maximum.
pub trait SleepTimer {
    /// Longest single sleep the hardware supports. Must be non-zero.
    const MAX_SLEEP: Duration;

    /// Block for `duration`, which callers keep at or below [`MAX_SLEEP`].
    ///
    /// [`MAX_SLEEP`]: Self::MAX_SLEEP
    fn sleep(&mut self, duration: Duration);
}

/// Sleep for a total duration longer than one hardware sleep allows,
/// looping over bounded calls.
pub fn sleep_total<T: SleepTimer>(timer: &mut T, total: Duration) {
    let mut remaining = total;
    while remaining > Duration::from_secs(0) {
        let step = if remaining < T::MAX_SLEEP {
            remaining
        } else {
            T::MAX_SLEEP
        };
        timer.sleep(step);
        remaining -= step;
    }
}
