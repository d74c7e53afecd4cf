//! Weighted random choice of what the prop does next.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use static_assertions::const_assert_eq;

use crate::{Actuator, Behavior, Puppet, RandomSource, StatusSignal};

/// Exclusive upper bound of a selection roll.
pub const ROLL_RANGE: u32 = 100;

/// `(cumulative threshold, behavior)`: a roll picks the first entry whose
/// threshold it is below.
pub const SELECTION_TABLE: [(u32, Behavior); 7] = [
    (12, Behavior::Pattern),
    (22, Behavior::SweepVertical),
    (32, Behavior::SweepHorizontal),
    (41, Behavior::ExtraWait { flinch: false }),
    (47, Behavior::ExtraWait { flinch: true }),
    (50, Behavior::CalibrationTest),
    (100, Behavior::RandomPosition),
];

const_assert_eq!(SELECTION_TABLE[SELECTION_TABLE.len() - 1].0, ROLL_RANGE);

/// Map a roll in `[0, 100)` to a behavior.
pub fn select(roll: u32) -> Behavior {
    SELECTION_TABLE
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .map(|(_, behavior)| *behavior)
        .unwrap_or(Behavior::RandomPosition)
}

/// Runs the prop forever: calibrate once, then pick, perform, rest.
pub struct Scheduler<A, D, R, S> {
    puppet: Puppet<A, D, R, S>,
    ticks: u32,
}

impl<A, D, R, S> Scheduler<A, D, R, S>
where
    A: Actuator,
    D: DelayNs,
    R: RandomSource,
    S: StatusSignal,
{
    pub fn new(puppet: Puppet<A, D, R, S>) -> Self {
        Self { puppet, ticks: 0 }
    }

    pub fn puppet(&self) -> &Puppet<A, D, R, S> {
        &self.puppet
    }

    pub fn puppet_mut(&mut self) -> &mut Puppet<A, D, R, S> {
        &mut self.puppet
    }

    /// Behaviors performed so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn startup(&mut self) -> Result<(), A::Error> {
        info!("startup calibration");
        self.puppet.startup_calibration()
    }

    pub fn choose(&mut self) -> Behavior {
        select(self.puppet.rng.uniform_int(0, ROLL_RANGE))
    }

    /// One loop iteration: choose, run to completion, rest.
    pub fn tick(&mut self) -> Result<Behavior, A::Error> {
        let behavior = self.choose();
        self.ticks = self.ticks.wrapping_add(1);
        info!("[{}] {}", self.ticks, behavior);

        self.puppet.perform(behavior)?;

        let idle = self.puppet.config.idle_ms;
        let rest = self.puppet.rng.uniform_int(idle.low, idle.high);
        debug!("rest {} ms", rest);
        self.puppet.pause(rest);
        Ok(behavior)
    }

    /// Never returns unless the actuator fails.
    pub fn run(&mut self) -> Result<Infallible, A::Error> {
        self.startup()?;
        loop {
            self.tick()?;
        }
    }
}
