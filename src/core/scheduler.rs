//! The control loop: sample every channel, decide whether anything changed,
//! refresh and pump only then, sleep, repeat.

use super::channel::{Channel, ChannelStatus, MAX_CHANNELS};
use super::config::Config;
use super::display::{Geometry, Scene};
use super::hal::{
    sleep_total, Actuator, AnalogSampler, ChannelMux, DisplayRenderer, SleepTimer,
};
use super::reference_level_from_raw;
use super::sampling;

/// The channel array the scheduler owns: all cycle logic operates on this one
/// collection.
pub type Channels = heapless::Vec<Channel, MAX_CHANNELS>;

/// Sequences one cycle across all channels and owns every hardware
/// collaborator, so ordering is total: sampling for all channels completes
/// before any rendering or actuation, and pumps run strictly one at a time on
/// the shared rail.
pub struct CycleScheduler<A, M, P, D, T> {
    sampler: A,
    mux: M,
    pump: P,
    display: D,
    timer: T,
    config: Config,
    geometry: Geometry,
    channels: Channels,
}

impl<A, M, P, D, T> CycleScheduler<A, M, P, D, T>
where
    A: AnalogSampler,
    M: ChannelMux,
    P: Actuator,
    D: DisplayRenderer,
    T: SleepTimer,
{
    pub fn new(
        config: Config,
        geometry: Geometry,
        channels: Channels,
        sampler: A,
        mux: M,
        pump: P,
        display: D,
        timer: T,
    ) -> Self {
        Self {
            sampler,
            mux,
            pump,
            display,
            timer,
            config,
            geometry,
            channels,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Run cycles for the rest of the device's life.
    pub fn run(mut self) -> ! {
        log::info!(
            "starting control loop with {} channel(s), cycle interval {:?}",
            self.channels.len(),
            self.config.cycle_interval
        );
        loop {
            self.run_cycle();
            self.sleep_between_cycles();
        }
    }

    /// One full pass: sample, then render and actuate when something moved.
    ///
    /// Rendering happens before the pumps run, so the displayed attempt
    /// counts lag this cycle's runs by one refresh. Returns whether the
    /// update path ran.
    pub fn run_cycle(&mut self) -> bool {
        let any_update = self.poll_channels();
        if any_update {
            self.render();
            self.run_pumps();
        } else {
            log::debug!("nothing changed, skipping refresh and pumps");
        }
        any_update
    }

    /// Sleep out the cycle interval in hardware-bounded slices.
    pub fn sleep_between_cycles(&mut self) {
        sleep_total(&mut self.timer, self.config.cycle_interval);
    }

    fn poll_channels(&mut self) -> bool {
        let mut any_update = false;
        for i in 0..self.channels.len() {
            let channel_config = self.channels[i].config;
            let readings = sampling::acquire(
                &mut self.sampler,
                &mut self.mux,
                &mut self.timer,
                &self.config,
                &channel_config,
            );
            let level = self.config.calibration.level_from_raw(readings.moisture);
            let reference = reference_level_from_raw(readings.reference);
            log::debug!(
                "channel {}: raw {} -> {}%, reference {}%",
                channel_config.id.display_number(),
                readings.moisture.to_counts(),
                level.to_percent(),
                reference.to_percent()
            );
            any_update |= self.channels[i].state.absorb(
                level,
                readings.moisture,
                reference,
                self.config.hysteresis,
            );
        }
        any_update
    }

    fn render(&mut self) {
        let scene = Scene::compose(&self.channels, self.geometry);
        self.display.render(&scene);
    }

    fn run_pumps(&mut self) {
        for i in 0..self.channels.len() {
            let channel = &mut self.channels[i];
            match channel.state.status(&channel.config) {
                ChannelStatus::Dry => {
                    // Counted as part of issuing the run; whether the water
                    // helped is only known after the next sampling pass.
                    channel.state.record_pump_attempt(&channel.config);
                    let number = channel.config.id.display_number();
                    let address = channel.config.pump_address;
                    let duration = channel.config.pump_duration;
                    let attempt = channel.state.pump_attempts;
                    log::info!(
                        "channel {}: running pump for {:?}, attempt {}",
                        number,
                        duration,
                        attempt
                    );
                    self.pump.run(address, duration);
                }
                ChannelStatus::Exhausted => {
                    log::warn!(
                        "channel {}: exceeded maximum of {} pump attempts",
                        channel.config.id.display_number(),
                        channel.config.max_pump_attempts
                    );
                }
                ChannelStatus::Ok => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::ChannelConfig;
    use crate::core::display::Ink;
    use crate::core::hal::{AnalogPin, ChannelId, MuxAddress};
    use crate::sim::{BenchEvent, SimBench, SimDisplay, SimMux, SimPump, SimSampler, SimTimer};
    use core::time::Duration;

    // Raw counts producing the given percent under the default calibration.
    const RAW_45: u16 = 430;
    const RAW_30: u16 = 507;
    const RAW_50: u16 = 405;

    /// Reference wiring: channel 0's sensor and the shared dial rail.
    const SENSOR0: AnalogPin = AnalogPin::new(0);
    const REFERENCE: AnalogPin = AnalogPin::new(4);

    fn scheduler_with(
        bench: &SimBench,
        channels: Channels,
    ) -> CycleScheduler<SimSampler, SimMux, SimPump, SimDisplay, SimTimer> {
        CycleScheduler::new(
            Config::default(),
            Geometry::default(),
            channels,
            bench.sampler(),
            bench.mux(),
            bench.pump(),
            bench.display(),
            bench.timer(),
        )
    }

    fn single_channel() -> Channels {
        let mut channels = Channels::new();
        channels
            .push(Channel::new(ChannelConfig::for_channel(
                ChannelId::new(0),
                Duration::from_secs(10),
                3,
            )))
            .unwrap();
        channels
    }

    fn pump_runs(bench: &SimBench) -> usize {
        bench
            .journal()
            .iter()
            .filter(|e| matches!(e, BenchEvent::PumpRun { .. }))
            .count()
    }

    fn renders(bench: &SimBench) -> usize {
        bench
            .journal()
            .iter()
            .filter(|e| matches!(e, BenchEvent::Rendered))
            .count()
    }

    #[test]
    fn quiet_cycle_neither_renders_nor_pumps() {
        let bench = SimBench::new();
        bench.set_input(SENSOR0, RAW_50);
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, single_channel());

        // First cycle absorbs the startup-to-real transition and renders.
        assert!(scheduler.run_cycle());
        assert_eq!(renders(&bench), 1);
        assert_eq!(pump_runs(&bench), 0);

        // Same readings again: within tolerance, satisfied, nothing to do.
        assert!(!scheduler.run_cycle());
        assert_eq!(renders(&bench), 1);
        assert_eq!(pump_runs(&bench), 0);
    }

    #[test]
    fn dry_channel_pumps_and_counts_the_attempt() {
        let bench = SimBench::new();
        bench.set_input(SENSOR0, RAW_30);
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, single_channel());

        assert!(scheduler.run_cycle());
        assert_eq!(pump_runs(&bench), 1);
        assert_eq!(scheduler.channels()[0].state.pump_attempts, 1);
        assert_eq!(
            bench.pump_log(),
            vec![(
                MuxAddress::Pump(ChannelId::new(0)),
                Duration::from_secs(10)
            )]
        );
    }

    #[test]
    fn render_happens_before_actuation_and_shows_the_lagging_count() {
        let bench = SimBench::new();
        bench.set_input(SENSOR0, RAW_30);
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, single_channel());

        scheduler.run_cycle();

        let journal = bench.journal();
        let render_at = journal
            .iter()
            .position(|e| matches!(e, BenchEvent::Rendered))
            .unwrap();
        let pump_at = journal
            .iter()
            .position(|e| matches!(e, BenchEvent::PumpRun { .. }))
            .unwrap();
        assert!(render_at < pump_at);

        // The scene was composed before the attempt was counted.
        let scene = bench.last_scene().unwrap();
        assert_eq!(scene.rows[0].attempts.text.as_str(), "0");
        assert_eq!(scheduler.channels()[0].state.pump_attempts, 1);

        // The next refresh catches up.
        scheduler.run_cycle();
        let scene = bench.last_scene().unwrap();
        assert_eq!(scene.rows[0].attempts.text.as_str(), "1");
    }

    #[test]
    fn mux_path_is_released_around_every_acquisition() {
        let bench = SimBench::new();
        bench.set_input(SENSOR0, RAW_50);
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, single_channel());

        scheduler.run_cycle();

        let journal = bench.journal();
        assert_eq!(
            journal[0],
            BenchEvent::Selected(MuxAddress::Sensor(ChannelId::new(0)))
        );
        assert_eq!(journal[1], BenchEvent::Slept(Duration::from_secs(2)));
        assert_eq!(journal[2], BenchEvent::Deselected);
        assert_eq!(bench.selected(), None);
    }

    #[test]
    fn exhausted_channel_still_refreshes_but_never_pumps() {
        let bench = SimBench::new();
        bench.set_input(SENSOR0, RAW_30);
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, single_channel());

        for expected in 1..=3u8 {
            scheduler.run_cycle();
            assert_eq!(scheduler.channels()[0].state.pump_attempts, expected);
        }
        assert_eq!(pump_runs(&bench), 3);

        // Budget spent: the stable dry reading still forces a refresh every
        // cycle, but the pump stays off.
        let renders_before = renders(&bench);
        assert!(scheduler.run_cycle());
        assert_eq!(renders(&bench), renders_before + 1);
        assert_eq!(pump_runs(&bench), 3);
        let scene = bench.last_scene().unwrap();
        assert_eq!(scene.rows[0].attempts.text.as_str(), "3");
        assert_eq!(scene.rows[0].attempts.ink, Ink::Warning);
    }

    #[test]
    fn recovery_resets_attempts_and_clears_the_warning() {
        let bench = SimBench::new();
        bench.set_input(SENSOR0, RAW_45);
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, single_channel());

        // Satisfied at 45% against a 40% reference.
        scheduler.run_cycle();
        assert_eq!(pump_runs(&bench), 0);

        // Drops to 30%: three attempts, then exhausted.
        bench.set_input(SENSOR0, RAW_30);
        for _ in 0..3 {
            scheduler.run_cycle();
        }
        assert_eq!(pump_runs(&bench), 3);
        scheduler.run_cycle();
        assert_eq!(pump_runs(&bench), 3);
        assert_eq!(
            scheduler.channels()[0].state.status(&scheduler.channels()[0].config),
            ChannelStatus::Exhausted
        );

        // Water arrives from elsewhere: 50% clears everything.
        bench.set_input(SENSOR0, RAW_50);
        scheduler.run_cycle();
        assert_eq!(scheduler.channels()[0].state.pump_attempts, 0);
        let scene = bench.last_scene().unwrap();
        assert_eq!(scene.rows[0].attempts.text.as_str(), "0");
        assert_eq!(scene.rows[0].attempts.ink, Ink::Normal);
        assert_eq!(scene.rows[0].level.ink, Ink::Normal);
    }

    #[test]
    fn pumps_run_sequentially_in_channel_order() {
        let bench = SimBench::new();
        let mut channels = Channels::new();
        for id in 0..2u8 {
            channels
                .push(Channel::new(ChannelConfig::for_channel(
                    ChannelId::new(id),
                    Duration::from_secs(10),
                    3,
                )))
                .unwrap();
            bench.set_input(AnalogPin::new(id), RAW_30);
        }
        bench.set_input(REFERENCE, 400);
        let mut scheduler = scheduler_with(&bench, channels);

        scheduler.run_cycle();

        assert_eq!(
            bench.pump_log(),
            vec![
                (
                    MuxAddress::Pump(ChannelId::new(0)),
                    Duration::from_secs(10)
                ),
                (
                    MuxAddress::Pump(ChannelId::new(1)),
                    Duration::from_secs(10)
                ),
            ]
        );
    }

    #[test]
    fn cycle_interval_sleeps_in_bounded_slices() {
        let bench = SimBench::new();
        let mut scheduler = scheduler_with(&bench, single_channel());

        scheduler.sleep_between_cycles();

        let slices: Vec<Duration> = bench
            .journal()
            .iter()
            .filter_map(|e| match e {
                BenchEvent::Slept(d) => Some(*d),
                _ => None,
            })
            .collect();
        assert_eq!(slices.len(), 75);
        assert!(slices.iter().all(|d| *d <= Duration::from_secs(8)));
        assert_eq!(slices.iter().sum::<Duration>(), Duration::from_secs(600));
    }
}
