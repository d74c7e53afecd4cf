//! In-memory rig: an actuator, clock and status light that record what the
//! motion code does to them on a shared timeline.
//!
//! Used by the host simulator and by the tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

#[cfg(feature = "std")]
use serde::Serialize;

use crate::{Actuator, Angle, Axis, ConfigError, MotionConfig, Puppet, RandomSource, StatusSignal};

#[cfg_attr(feature = "std", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write { axis: Axis, angle: Angle },
    Delay(Duration),
    Status(bool),
}

#[cfg_attr(feature = "std", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped {
    /// simulated time at which the event started
    pub at: Duration,
    pub event: Event,
}

#[derive(Debug, Default)]
pub struct Trace {
    now: Duration,
    events: Vec<Stamped>,
}

pub type SharedTrace = Rc<RefCell<Trace>>;

impl Trace {
    fn push(&mut self, event: Event) {
        self.events.push(Stamped { at: self.now, event });
        if let Event::Delay(d) = event {
            self.now += d;
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn events(&self) -> &[Stamped] {
        &self.events
    }

    /// Drop recorded events; the clock keeps running.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn writes(&self, axis: Axis) -> Vec<Angle> {
        self.events
            .iter()
            .filter_map(|s| match s.event {
                Event::Write { axis: a, angle } if a == axis => Some(angle),
                _ => None,
            })
            .collect()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.events
            .iter()
            .filter_map(|s| match s.event {
                Event::Delay(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn status_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|s| matches!(s.event, Event::Status(_)))
            .count()
    }
}

pub struct SimActuator {
    angles: [Angle; 2],
    trace: SharedTrace,
}

impl SimActuator {
    pub fn new(trace: SharedTrace, horizontal: Angle, vertical: Angle) -> Self {
        Self {
            angles: [horizontal, vertical],
            trace,
        }
    }

    /// Move an axis without recording, as if by hand.
    pub fn place(&mut self, axis: Axis, angle: Angle) {
        self.angles[axis.index()] = angle;
    }
}

impl Actuator for SimActuator {
    type Error = Infallible;

    fn set_angle(&mut self, axis: Axis, angle: Angle) -> Result<(), Self::Error> {
        self.angles[axis.index()] = angle;
        self.trace.borrow_mut().push(Event::Write { axis, angle });
        Ok(())
    }

    fn angle(&self, axis: Axis) -> Angle {
        self.angles[axis.index()]
    }
}

/// Delay that advances the simulated clock. With `realtime` it also sleeps.
pub struct SimDelay {
    trace: SharedTrace,
    realtime: bool,
}

impl SimDelay {
    pub fn new(trace: SharedTrace) -> Self {
        Self {
            trace,
            realtime: false,
        }
    }

    pub fn realtime(trace: SharedTrace) -> Self {
        Self {
            trace,
            realtime: true,
        }
    }

    fn wait(&mut self, d: Duration) {
        self.trace.borrow_mut().push(Event::Delay(d));
        if self.realtime {
            std::thread::sleep(d);
        }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(Duration::from_millis(ms as u64));
    }
}

pub struct SimSignal {
    trace: SharedTrace,
}

impl SimSignal {
    pub fn new(trace: SharedTrace) -> Self {
        Self { trace }
    }
}

impl StatusSignal for SimSignal {
    fn assert(&mut self) {
        self.trace.borrow_mut().push(Event::Status(true));
    }

    fn deassert(&mut self) {
        self.trace.borrow_mut().push(Event::Status(false));
    }
}

/// Random source that replays a fixed list of draws.
///
/// Panics when a draw falls outside the requested interval or the script
/// runs out.
pub struct Scripted {
    draws: VecDeque<u32>,
}

impl Scripted {
    pub fn new(draws: Vec<u32>) -> Self {
        Self {
            draws: draws.into(),
        }
    }
}

impl RandomSource for Scripted {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        let v = self.draws.pop_front().expect("script exhausted");
        assert!(
            v == low || (low..high).contains(&v),
            "scripted draw {} outside [{}, {})",
            v,
            low,
            high
        );
        v
    }
}

pub type SimPuppet<R> = Puppet<SimActuator, SimDelay, R, SimSignal>;

/// A simulated prop with both axes centered in their ranges.
pub fn puppet<R: RandomSource>(
    config: MotionConfig,
    rng: R,
) -> Result<(SharedTrace, SimPuppet<R>), ConfigError> {
    // centering an unchecked range could underflow
    config.validate()?;
    let trace = SharedTrace::default();
    let actuator = SimActuator::new(
        trace.clone(),
        config.horizontal.center(),
        config.vertical.center(),
    );
    let puppet = Puppet::new(
        actuator,
        SimDelay::new(trace.clone()),
        rng,
        SimSignal::new(trace.clone()),
        config,
    )?;
    Ok((trace, puppet))
}
