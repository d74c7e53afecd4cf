use core::fmt::Display;
use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;

use crate::config::ExtraWaitTiming;
use crate::{Actuator, Angle, Axis, ConfigError, MotionConfig, RandomSource, StatusSignal};

/// Number of (horizontal, vertical) targets in one pattern.
pub const PATTERN_LENGTH: usize = 3;

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Pattern,
    SweepVertical,
    SweepHorizontal,
    ExtraWait { flinch: bool },
    CalibrationTest,
    RandomPosition,
}

impl Behavior {
    pub fn to_str(&self) -> &'static str {
        match self {
            Behavior::Pattern => "pattern",
            Behavior::SweepVertical => "sweep-vertical",
            Behavior::SweepHorizontal => "sweep-horizontal",
            Behavior::ExtraWait { flinch: false } => "extra-wait",
            Behavior::ExtraWait { flinch: true } => "extra-wait-flinch",
            Behavior::CalibrationTest => "calibration-test",
            Behavior::RandomPosition => "random-position",
        }
    }

    /// Whether the status signal is held while this behavior runs.
    pub fn is_busy(&self) -> bool {
        matches!(self, Behavior::Pattern | Behavior::ExtraWait { .. })
    }
}

impl Display for Behavior {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// How a flinching extra wait splits its time.
///
/// Only `first_half_ms` is ever slept. The prop flinches and hands control
/// straight back to the scheduler; `last_half_ms` is drawn but not waited.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlinchTiming {
    pub total_ms: u32,
    pub first_half_ms: u32,
    pub last_half_ms: u32,
}

impl FlinchTiming {
    pub fn draw<R: RandomSource>(rng: &mut R, timing: &ExtraWaitTiming) -> Self {
        let total = timing.flinch_total_ms;
        let total_ms = rng.uniform_int(total.low, total.high);
        let last_half_ms = rng.uniform_int(timing.flinch_last_half_min_ms, total_ms / 2);
        Self {
            total_ms,
            first_half_ms: total_ms.saturating_sub(last_half_ms),
            last_half_ms,
        }
    }
}

/// The prop: both servos, a clock, a random source and the busy light, plus
/// the configuration every behavior reads.
pub struct Puppet<A, D, R, S> {
    pub(crate) actuator: A,
    pub(crate) delay: D,
    pub(crate) rng: R,
    pub(crate) signal: S,
    pub(crate) config: MotionConfig,
}

impl<A, D, R, S> Puppet<A, D, R, S> {
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}

impl<A, D, R, S> Puppet<A, D, R, S>
where
    A: Actuator,
    D: DelayNs,
    R: RandomSource,
    S: StatusSignal,
{
    pub fn new(
        actuator: A,
        delay: D,
        rng: R,
        signal: S,
        config: MotionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            actuator,
            delay,
            rng,
            signal,
            config,
        })
    }

    pub fn perform(&mut self, behavior: Behavior) -> Result<(), A::Error> {
        match behavior {
            Behavior::Pattern => self.pattern(),
            Behavior::SweepVertical => self.sweep_vertical(),
            Behavior::SweepHorizontal => self.sweep_horizontal(),
            Behavior::ExtraWait { flinch } => self.extra_wait(flinch),
            Behavior::CalibrationTest => self.calibration_test(),
            Behavior::RandomPosition => self.random_position(),
        }
    }

    pub fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Uniform angle in `[min, max)` of the axis range.
    pub fn draw_angle(&mut self, axis: Axis) -> Angle {
        let range = self.config.range(axis);
        // the draw is below max, so it fits
        self.rng.uniform_int(range.min as u32, range.max as u32) as Angle
    }

    /// Assert the status signal until the returned guard is dropped.
    pub fn busy(&mut self) -> Busy<'_, A, D, R, S> {
        self.signal.assert();
        Busy { puppet: self }
    }

    /// Horizontal sweep: max to min fast, back slowly, then fast again.
    pub fn sweep_horizontal(&mut self) -> Result<(), A::Error> {
        let range = self.config.horizontal;
        let timing = self.config.sweep;

        self.migrate(Axis::Horizontal, range.max)?;
        self.pass(Axis::Horizontal, range.max, range.min, timing.horizontal_fast_ms)?;
        self.pass(Axis::Horizontal, range.min, range.max, timing.horizontal_return_ms)?;
        self.pass(Axis::Horizontal, range.max, range.min, timing.horizontal_fast_ms)
    }

    /// Up, down, up at random speeds, then a quick drop.
    pub fn sweep_vertical(&mut self) -> Result<(), A::Error> {
        let range = self.config.vertical;

        self.migrate(Axis::Vertical, range.min)?;
        self.migrate(Axis::Vertical, range.max)?;
        self.migrate(Axis::Vertical, range.min)?;
        self.pass(
            Axis::Vertical,
            range.min,
            range.max,
            self.config.sweep.vertical_fast_ms,
        )
    }

    /// Draw a pattern: `(horizontal, vertical)` targets. Vertical is drawn
    /// first within each pair.
    pub fn draw_pattern(&mut self) -> [(Angle, Angle); PATTERN_LENGTH] {
        let mut moves = [(0, 0); PATTERN_LENGTH];
        for slot in moves.iter_mut() {
            let vertical = self.draw_angle(Axis::Vertical);
            let horizontal = self.draw_angle(Axis::Horizontal);
            *slot = (horizontal, vertical);
        }
        moves
    }

    /// Replay a freshly drawn pattern, pausing after every cycle. The pause
    /// doubles each time.
    pub fn pattern(&mut self) -> Result<(), A::Error> {
        let mut busy = self.busy();
        let moves = busy.draw_pattern();
        let timing = busy.config.pattern;

        let mut wait = timing.base_wait_ms;
        for _ in 0..timing.repeat {
            for (horizontal, vertical) in moves {
                busy.migrate(Axis::Horizontal, horizontal)?;
                busy.migrate(Axis::Vertical, vertical)?;
            }
            busy.pause(wait);
            wait = wait.saturating_mul(2);
        }
        Ok(())
    }

    /// Hold still for a while. With `flinch`, twitch the vertical axis part
    /// way through.
    pub fn extra_wait(&mut self, flinch: bool) -> Result<(), A::Error> {
        let mut busy = self.busy();
        let timing = busy.config.extra_wait;

        if !flinch {
            let extra = busy.rng.uniform_int(timing.plain_ms.low, timing.plain_ms.high);
            busy.pause(extra);
            return Ok(());
        }

        let split = FlinchTiming::draw(&mut busy.rng, &timing);
        busy.pause(split.first_half_ms);
        busy.flinch()?;
        Ok(())
    }

    /// Jump the vertical axis by the flinch offset, no migration. Downward
    /// (toward max) unless that would come within the offset of max.
    pub fn flinch(&mut self) -> Result<Angle, A::Error> {
        let range = self.config.vertical;
        let offset = self.config.extra_wait.flinch_offset as i32;
        let current = self.actuator.angle(Axis::Vertical) as i32;

        let target = if current < range.max as i32 - offset {
            current + offset
        } else {
            current - offset
        };
        let target = range.clamp(target);
        info!("flinch: {} -> {}", current, target);
        self.actuator.set_angle(Axis::Vertical, target)?;
        Ok(target)
    }

    pub fn random_position(&mut self) -> Result<(), A::Error> {
        let horizontal = self.draw_angle(Axis::Horizontal);
        self.migrate(Axis::Horizontal, horizontal)?;

        let vertical = self.draw_angle(Axis::Vertical);
        self.migrate(Axis::Vertical, vertical)
    }

    /// Park both axes at max ahead of `test`.
    pub fn test_init(&mut self) -> Result<(), A::Error> {
        self.migrate(Axis::Horizontal, self.config.horizontal.max)?;
        self.migrate(Axis::Vertical, self.config.vertical.max)
    }

    /// Trace the whole operating square at a fixed speed. Ends with both axes
    /// one degree short of max.
    pub fn test(&mut self) -> Result<(), A::Error> {
        let h = self.config.horizontal;
        let v = self.config.vertical;
        let step = self.config.calibration.step_ms;

        self.pass(Axis::Horizontal, h.max, h.min, step)?;
        self.pass(Axis::Vertical, v.max, v.min, step)?;
        self.pass(Axis::Horizontal, h.min, h.max, step)?;
        self.pass(Axis::Vertical, v.min, v.max, step)
    }

    /// Calibration as picked by the scheduler: init, test, short pause, test.
    pub fn calibration_test(&mut self) -> Result<(), A::Error> {
        self.test_init()?;
        self.test()?;
        self.pause(self.config.calibration.repeat_pause_ms);
        self.test()
    }

    /// Calibration as run once at power-up, with settling pauses around it.
    pub fn startup_calibration(&mut self) -> Result<(), A::Error> {
        let timing = self.config.calibration;

        self.test_init()?;
        self.pause(timing.settle_ms);
        self.test()?;
        self.pause(timing.repeat_pause_ms);
        self.test()?;
        self.pause(timing.settle_ms);
        Ok(())
    }
}

/// Holds the status signal asserted; deasserts it when dropped, including
/// when a behavior bails out with `?`.
pub struct Busy<'a, A, D, R, S: StatusSignal> {
    puppet: &'a mut Puppet<A, D, R, S>,
}

impl<A, D, R, S: StatusSignal> Deref for Busy<'_, A, D, R, S> {
    type Target = Puppet<A, D, R, S>;

    fn deref(&self) -> &Self::Target {
        self.puppet
    }
}

impl<A, D, R, S: StatusSignal> DerefMut for Busy<'_, A, D, R, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.puppet
    }
}

impl<A, D, R, S: StatusSignal> Drop for Busy<'_, A, D, R, S> {
    fn drop(&mut self) {
        self.puppet.signal.deassert();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngSource;
    use crate::sim::{self, Event, Scripted, SimActuator, SimDelay, SimSignal};
    use crate::AxisRange;
    use core::time::Duration;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> RngSource<SmallRng> {
        RngSource(SmallRng::seed_from_u64(seed))
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn sweep_horizontal_passes() {
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), seeded(1)).unwrap();
        puppet.actuator_mut().place(Axis::Horizontal, 80);
        puppet.sweep_horizontal().unwrap();

        let writes = trace.borrow().writes(Axis::Horizontal);
        // migrate 80..=109, then 110..=51, 50..=109, 110..=51
        let (init, passes) = writes.split_at(30);
        assert_eq!(init.first(), Some(&80));
        assert_eq!(init.last(), Some(&109));

        let fast: Vec<Angle> = (51..=110).rev().collect();
        let slow: Vec<Angle> = (50..110).collect();
        assert_eq!(&passes[..60], fast.as_slice());
        assert_eq!(&passes[60..120], slow.as_slice());
        assert_eq!(&passes[120..], fast.as_slice());

        let delays = trace.borrow().delays();
        assert!(delays[30..90].iter().all(|d| *d == ms(10)));
        assert!(delays[90..150].iter().all(|d| *d == ms(30)));
        assert!(delays[150..].iter().all(|d| *d == ms(10)));
        assert_eq!(puppet.actuator().angle(Axis::Horizontal), 51);
    }

    #[test]
    fn sweep_vertical_ends_with_fast_drop() {
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), seeded(2)).unwrap();
        puppet.sweep_vertical().unwrap();

        let events = trace.borrow();
        let drop_start = events.writes(Axis::Vertical).len() - 50;
        let tail: Vec<Angle> = events.writes(Axis::Vertical)[drop_start..].to_vec();
        assert_eq!(tail, (80..130).collect::<Vec<Angle>>());
        let delays = events.delays();
        assert!(delays[delays.len() - 50..].iter().all(|d| *d == ms(15)));
        assert!(events.writes(Axis::Horizontal).is_empty());
        drop(events);
        assert_eq!(puppet.actuator().angle(Axis::Vertical), 129);
    }

    #[test]
    fn sweep_vertical_migrates_min_max_min() {
        let script = Scripted::new(vec![40, 55, 70]);
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), script).unwrap();
        assert_eq!(puppet.actuator().angle(Axis::Vertical), 105);
        puppet.sweep_vertical().unwrap();

        let mut expected: Vec<Angle> = (81..=105).rev().collect();
        expected.extend(81..130);
        expected.extend((81..=129).rev());
        expected.extend(80..130);
        assert_eq!(trace.borrow().writes(Axis::Vertical), expected);

        // one speed per migration, held for every degree of it
        let mut speeds = vec![ms(40); 25];
        speeds.extend(vec![ms(55); 49]);
        speeds.extend(vec![ms(70); 49]);
        speeds.extend(vec![ms(15); 50]);
        assert_eq!(trace.borrow().delays(), speeds);
    }

    #[test]
    fn pattern_pauses_double() {
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), seeded(3)).unwrap();
        puppet.pattern().unwrap();

        let trace = trace.borrow();
        // pattern pauses are the only delays that are not step delays (< 100ms)
        let pauses: Vec<Duration> = trace
            .delays()
            .into_iter()
            .filter(|d| *d >= ms(100))
            .collect();
        assert_eq!(pauses, vec![ms(500), ms(1000), ms(2000)]);

        let events = trace.events();
        assert_eq!(events.first().map(|s| s.event), Some(Event::Status(true)));
        assert_eq!(events.last().map(|s| s.event), Some(Event::Status(false)));
        assert_eq!(trace.status_changes(), 2);
    }

    /// Step `at` toward `to` the way a migration does, collecting the writes.
    fn walk(at: &mut Angle, to: Angle, writes: &mut Vec<Angle>) -> usize {
        let path: Vec<Angle> = if *at < to {
            (*at..to).collect()
        } else {
            ((to + 1)..=*at).rev().collect()
        };
        if let Some(last) = path.last() {
            *at = *last;
        }
        writes.extend(&path);
        path.len()
    }

    #[test]
    fn pattern_replays_the_same_targets() {
        // vertical then horizontal for each pair, then 18 migration speeds
        let mut script = vec![100, 60, 120, 90, 85, 70];
        script.extend(std::iter::repeat(30).take(18));
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), Scripted::new(script)).unwrap();
        puppet.pattern().unwrap();

        let pairs = [(60, 100), (90, 120), (70, 85)];
        let (mut h, mut v) = (80, 105);
        let mut horizontal = Vec::new();
        let mut vertical = Vec::new();
        let mut delays = Vec::new();
        for pause in [500, 1000, 2000] {
            for (to_h, to_v) in pairs {
                let n = walk(&mut h, to_h, &mut horizontal);
                delays.extend(vec![ms(30); n]);
                let n = walk(&mut v, to_v, &mut vertical);
                delays.extend(vec![ms(30); n]);
            }
            delays.push(ms(pause));
        }

        let trace = trace.borrow();
        assert_eq!(trace.writes(Axis::Horizontal), horizontal);
        assert_eq!(trace.writes(Axis::Vertical), vertical);
        assert_eq!(trace.delays(), delays);
        assert_eq!(trace.status_changes(), 2);

        // the first pair starts on the horizontal axis
        let first_write = trace.events().iter().find_map(|s| match s.event {
            Event::Write { axis, .. } => Some(axis),
            _ => None,
        });
        assert_eq!(first_write, Some(Axis::Horizontal));
    }

    #[test]
    fn extra_wait_plain_sleeps_once() {
        let (trace, mut puppet) =
            sim::puppet(MotionConfig::default(), Scripted::new(vec![7_250])).unwrap();
        puppet.extra_wait(false).unwrap();

        let events: Vec<Event> = trace.borrow().events().iter().map(|s| s.event).collect();
        assert_eq!(
            events,
            vec![
                Event::Status(true),
                Event::Delay(ms(7_250)),
                Event::Status(false),
            ]
        );
    }

    #[test]
    fn flinch_timing_splits_total() {
        let timing = ExtraWaitTiming::default();
        let mut rng = seeded(9);
        for _ in 0..1_000 {
            let split = FlinchTiming::draw(&mut rng, &timing);
            assert!((8_000..15_000).contains(&split.total_ms));
            assert!(split.last_half_ms >= 1_000);
            assert!(split.last_half_ms < split.total_ms / 2);
            assert_eq!(split.first_half_ms + split.last_half_ms, split.total_ms);
        }
    }

    #[test]
    fn extra_wait_flinch_only_waits_first_half() {
        // total 10_000, last half 3_000: 7_000 slept, 3_000 never slept
        let (trace, mut puppet) =
            sim::puppet(MotionConfig::default(), Scripted::new(vec![10_000, 3_000])).unwrap();
        puppet.actuator_mut().place(Axis::Vertical, 100);
        puppet.extra_wait(true).unwrap();

        let events: Vec<Event> = trace.borrow().events().iter().map(|s| s.event).collect();
        assert_eq!(
            events,
            vec![
                Event::Status(true),
                Event::Delay(ms(7_000)),
                Event::Write { axis: Axis::Vertical, angle: 103 },
                Event::Status(false),
            ]
        );
        assert_eq!(trace.borrow().now(), ms(7_000));
    }

    #[test]
    fn flinch_direction_follows_max() {
        let (_trace, mut puppet) = sim::puppet(MotionConfig::default(), seeded(4)).unwrap();
        let range = puppet.config().vertical;
        assert_eq!(range, AxisRange::new(80, 130));

        for (start, expected) in [(80, 83), (126, 129), (127, 124), (129, 126), (130, 127)] {
            puppet.actuator_mut().place(Axis::Vertical, start);
            assert_eq!(puppet.flinch().unwrap(), expected, "from {}", start);
            assert!(range.contains(expected));
        }
    }

    #[test]
    fn flinch_is_clamped_on_narrow_range() {
        let mut config = MotionConfig::default();
        config.vertical = AxisRange::new(50, 54);
        let (_trace, mut puppet) = sim::puppet(config, seeded(4)).unwrap();
        puppet.actuator_mut().place(Axis::Vertical, 52);
        assert_eq!(puppet.flinch().unwrap(), 50);
    }

    #[test]
    fn random_position_moves_horizontal_then_vertical() {
        let (trace, mut puppet) = sim::puppet(
            MotionConfig::default(),
            Scripted::new(vec![60, 40, 120, 40]),
        )
        .unwrap();
        puppet.actuator_mut().place(Axis::Horizontal, 80);
        puppet.actuator_mut().place(Axis::Vertical, 105);
        puppet.random_position().unwrap();

        let trace = trace.borrow();
        assert_eq!(trace.writes(Axis::Horizontal), (61..=80).rev().collect::<Vec<Angle>>());
        assert_eq!(trace.writes(Axis::Vertical), (105..120).collect::<Vec<Angle>>());
        let first_vertical = trace
            .events()
            .iter()
            .position(|s| matches!(s.event, Event::Write { axis: Axis::Vertical, .. }));
        let last_horizontal = trace
            .events()
            .iter()
            .rposition(|s| matches!(s.event, Event::Write { axis: Axis::Horizontal, .. }));
        assert!(last_horizontal < first_vertical);
    }

    #[test]
    fn startup_calibration_rests_below_max() {
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), seeded(6)).unwrap();
        puppet.startup_calibration().unwrap();

        assert_eq!(puppet.actuator().angle(Axis::Horizontal), 109);
        assert_eq!(puppet.actuator().angle(Axis::Vertical), 129);

        let pauses: Vec<Duration> = trace
            .borrow()
            .delays()
            .into_iter()
            .filter(|d| *d >= ms(100))
            .collect();
        assert_eq!(pauses, vec![ms(2_000), ms(500), ms(2_000)]);
    }

    #[test]
    fn test_traces_the_square() {
        let (trace, mut puppet) = sim::puppet(MotionConfig::default(), seeded(6)).unwrap();
        puppet.actuator_mut().place(Axis::Horizontal, 109);
        puppet.actuator_mut().place(Axis::Vertical, 129);
        puppet.test().unwrap();

        let trace = trace.borrow();
        let mut horizontal: Vec<Angle> = (51..=110).rev().collect();
        horizontal.extend(50..110);
        let mut vertical: Vec<Angle> = (81..=130).rev().collect();
        vertical.extend(80..130);
        assert_eq!(trace.writes(Axis::Horizontal), horizontal);
        assert_eq!(trace.writes(Axis::Vertical), vertical);
        assert!(trace.delays().iter().all(|d| *d == ms(20)));
    }

    struct Jammed;

    impl Actuator for Jammed {
        type Error = &'static str;

        fn set_angle(&mut self, _axis: Axis, _angle: Angle) -> Result<(), Self::Error> {
            Err("jammed")
        }

        fn angle(&self, axis: Axis) -> Angle {
            match axis {
                Axis::Horizontal => 50,
                Axis::Vertical => 80,
            }
        }
    }

    #[test]
    fn busy_signal_released_on_error() {
        let trace = sim::SharedTrace::default();
        let mut puppet = Puppet::new(
            Jammed,
            SimDelay::new(trace.clone()),
            seeded(8),
            SimSignal::new(trace.clone()),
            MotionConfig::default(),
        )
        .unwrap();
        assert_eq!(puppet.pattern(), Err("jammed"));

        let events: Vec<Event> = trace.borrow().events().iter().map(|s| s.event).collect();
        assert_eq!(events, vec![Event::Status(true), Event::Status(false)]);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = MotionConfig::default();
        config.horizontal = AxisRange::new(110, 50);
        let trace = sim::SharedTrace::default();
        let result = Puppet::new(
            SimActuator::new(trace.clone(), 80, 100),
            SimDelay::new(trace.clone()),
            seeded(1),
            SimSignal::new(trace),
            config,
        );
        assert!(matches!(result, Err(ConfigError::EmptyRange(Axis::Horizontal))));
    }

    #[test]
    fn sim_rig_rejects_inverted_range() {
        let mut config = MotionConfig::default();
        config.horizontal = AxisRange::new(110, 50);
        let result = sim::puppet(config, seeded(1));
        assert!(matches!(result, Err(ConfigError::EmptyRange(Axis::Horizontal))));

        let mut config = MotionConfig::default();
        config.vertical = AxisRange::new(130, 80);
        let result = sim::puppet(config, seeded(1));
        assert!(matches!(result, Err(ConfigError::EmptyRange(Axis::Vertical))));
    }
}
