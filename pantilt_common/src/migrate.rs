//! Gradual, one-degree-at-a-time motion.

use embedded_hal::delay::DelayNs;

use crate::{Actuator, Angle, Axis, Puppet, RandomSource, StatusSignal};

/// Angles written when stepping from `from` toward `to`: `from` first, one
/// degree per step, stopping before `to`.
pub fn steps(from: Angle, to: Angle) -> Steps {
    Steps {
        next: from,
        end: to,
        rising: from < to,
    }
}

pub struct Steps {
    next: Angle,
    end: Angle,
    rising: bool,
}

impl Iterator for Steps {
    type Item = Angle;

    fn next(&mut self) -> Option<Angle> {
        if self.next == self.end {
            return None;
        }
        let angle = self.next;
        if self.rising {
            self.next += 1;
        } else {
            self.next -= 1;
        }
        Some(angle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.next.abs_diff(self.end) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Steps {}

impl<A, D, R, S> Puppet<A, D, R, S>
where
    A: Actuator,
    D: DelayNs,
    R: RandomSource,
    S: StatusSignal,
{
    /// Inverse speed for one migration, in ms per degree.
    pub fn draw_speed(&mut self) -> u32 {
        let speed = self.config.speed;
        self.rng.uniform_int(speed.fast, speed.slow)
    }

    /// Walk `axis` from where it is toward `target` at a randomly drawn speed.
    ///
    /// The target itself is not written: the axis comes to rest one degree
    /// short of it. Nothing is written and no time passes when the axis is
    /// already there.
    pub fn migrate(&mut self, axis: Axis, target: Angle) -> Result<(), A::Error> {
        let speed = self.draw_speed();
        let current = self.actuator.angle(axis);
        debug!(
            "migrate {}: {} -> {} at {} ms/deg",
            axis, current, target, speed
        );
        self.pass(axis, current, target, speed)
    }

    /// Fixed-speed stepped pass. Writes `from` first, then every degree up to
    /// but excluding `to`, waiting `step_ms` after each write.
    pub fn pass(&mut self, axis: Axis, from: Angle, to: Angle, step_ms: u32) -> Result<(), A::Error> {
        for angle in steps(from, to) {
            self.actuator.set_angle(axis, angle)?;
            self.delay.delay_ms(step_ms);
        }
        Ok(())
    }
}
