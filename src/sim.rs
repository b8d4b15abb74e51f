//! In-memory collaborators for tests and demos.
//!
//! [`SimBench`] hands out one implementation per hardware trait, all backed
//! by shared scripted inputs and a common journal, so a test can drive the
//! scheduler with exact raw values and assert what happened across
//! collaborators in order.

use super::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::core::display::Scene;
use crate::core::hal::{
    Actuator, AnalogPin, AnalogSampler, ChannelMux, DisplayRenderer, MuxAddress, SleepTimer,
};

/// One observable hardware interaction, in the order it happened.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BenchEvent {
    Selected(MuxAddress),
    Deselected,
    Slept(Duration),
    PumpRun {
        address: MuxAddress,
        duration: Duration,
    },
    Rendered,
}

type Shared<T> = Rc<RefCell<T>>;

/// Factory and observer for the simulated hardware.
///
/// Scripting follows the same setter pattern as a bench power supply: set an
/// input, run cycles, read the journal back.
pub struct SimBench {
    inputs: Shared<HashMap<u8, u16>>,
    journal: Shared<Vec<BenchEvent>>,
    scenes: Shared<Vec<Scene>>,
    selected: Shared<Option<MuxAddress>>,
}

impl SimBench {
    pub fn new() -> Self {
        Self {
            inputs: Rc::new(RefCell::new(HashMap::new())),
            journal: Rc::new(RefCell::new(Vec::new())),
            scenes: Rc::new(RefCell::new(Vec::new())),
            selected: Rc::new(RefCell::new(None)),
        }
    }

    /// Script the raw counts an analog input reports. Values are masked to
    /// the 10-bit range of the simulated converter.
    pub fn set_input(&self, pin: AnalogPin, counts: u16) {
        self.inputs.borrow_mut().insert(pin.to_index(), counts & 0x03ff);
    }

    pub fn journal(&self) -> Vec<BenchEvent> {
        self.journal.borrow().clone()
    }

    /// Every scene rendered so far, oldest first.
    pub fn scenes(&self) -> Vec<Scene> {
        self.scenes.borrow().clone()
    }

    pub fn last_scene(&self) -> Option<Scene> {
        self.scenes.borrow().last().cloned()
    }

    /// The circuit currently powered, if any.
    pub fn selected(&self) -> Option<MuxAddress> {
        *self.selected.borrow()
    }

    /// All pump runs so far as `(address, duration)`, oldest first.
    pub fn pump_log(&self) -> Vec<(MuxAddress, Duration)> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|event| match event {
                BenchEvent::PumpRun { address, duration } => Some((*address, *duration)),
                _ => None,
            })
            .collect()
    }

    pub fn sampler(&self) -> SimSampler {
        SimSampler {
            inputs: Rc::clone(&self.inputs),
        }
    }

    pub fn mux(&self) -> SimMux {
        SimMux {
            journal: Rc::clone(&self.journal),
            selected: Rc::clone(&self.selected),
        }
    }

    pub fn pump(&self) -> SimPump {
        SimPump {
            journal: Rc::clone(&self.journal),
        }
    }

    pub fn display(&self) -> SimDisplay {
        SimDisplay {
            journal: Rc::clone(&self.journal),
            scenes: Rc::clone(&self.scenes),
        }
    }

    pub fn timer(&self) -> SimTimer {
        SimTimer {
            journal: Rc::clone(&self.journal),
        }
    }
}

impl Default for SimBench {
    fn default() -> Self {
        Self::new()
    }
}

/// Implementation of `AnalogSampler` returning the scripted counts.
pub struct SimSampler {
    inputs: Shared<HashMap<u8, u16>>,
}

impl AnalogSampler for SimSampler {
    fn read(&mut self, pin: AnalogPin) -> u16 {
        *self.inputs.borrow().get(&pin.to_index()).unwrap_or(&0)
    }
}

/// Implementation of `ChannelMux` tracking the powered circuit.
pub struct SimMux {
    journal: Shared<Vec<BenchEvent>>,
    selected: Shared<Option<MuxAddress>>,
}

impl ChannelMux for SimMux {
    fn select(&mut self, address: MuxAddress) {
        *self.selected.borrow_mut() = Some(address);
        self.journal.borrow_mut().push(BenchEvent::Selected(address));
    }

    fn deselect(&mut self) {
        *self.selected.borrow_mut() = None;
        self.journal.borrow_mut().push(BenchEvent::Deselected);
    }
}

/// Implementation of `Actuator` recording runs without passing time.
pub struct SimPump {
    journal: Shared<Vec<BenchEvent>>,
}

impl Actuator for SimPump {
    fn run(&mut self, address: MuxAddress, duration: Duration) {
        self.journal
            .borrow_mut()
            .push(BenchEvent::PumpRun { address, duration });
    }
}

/// Implementation of `DisplayRenderer` capturing composed scenes.
pub struct SimDisplay {
    journal: Shared<Vec<BenchEvent>>,
    scenes: Shared<Vec<Scene>>,
}

impl DisplayRenderer for SimDisplay {
    fn render(&mut self, scene: &Scene) {
        self.journal.borrow_mut().push(BenchEvent::Rendered);
        self.scenes.borrow_mut().push(scene.clone());
    }
}

/// Implementation of `SleepTimer` that only journals the requested waits.
///
/// The bound matches the reference board's watchdog sleep.
pub struct SimTimer {
    journal: Shared<Vec<BenchEvent>>,
}

impl SleepTimer for SimTimer {
    const MAX_SLEEP: Duration = Duration::from_secs(8);

    fn sleep(&mut self, duration: Duration) {
        self.journal.borrow_mut().push(BenchEvent::Slept(duration));
    }
}
