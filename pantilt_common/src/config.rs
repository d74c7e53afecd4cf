use core::fmt::Display;
use core::str::FromStr;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::{Angle, Axis, ANGLE_LIMIT};

/// Inclusive travel limits for one axis.
///
/// `min` is always the numerically smaller angle. What it means physically is
/// axis specific: on the vertical axis `min` is the most *up* position.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: Angle,
    pub max: Angle,
}

impl AxisRange {
    pub const fn new(min: Angle, max: Angle) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, angle: Angle) -> bool {
        (self.min..=self.max).contains(&angle)
    }

    pub fn clamp(&self, angle: i32) -> Angle {
        angle.clamp(self.min as i32, self.max as i32) as Angle
    }

    pub fn center(&self) -> Angle {
        self.min + (self.max - self.min) / 2
    }
}

/// "Inverse speed" bounds in milliseconds per degree. `fast` is the smaller
/// number.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedBounds {
    pub fast: u32,
    pub slow: u32,
}

/// Half-open millisecond interval `[low, high)` a wait is drawn from.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRange {
    pub low: u32,
    pub high: u32,
}

impl WaitRange {
    pub const fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepTiming {
    /// per-degree delay of the two fast horizontal passes
    pub horizontal_fast_ms: u32,
    /// per-degree delay of the horizontal return pass
    pub horizontal_return_ms: u32,
    /// per-degree delay of the closing vertical pass
    pub vertical_fast_ms: u32,
}

impl Default for SweepTiming {
    fn default() -> Self {
        Self {
            horizontal_fast_ms: 10,
            horizontal_return_ms: 30,
            vertical_fast_ms: 15,
        }
    }
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTiming {
    pub repeat: u32,
    /// pause after the first cycle; doubles after every cycle
    pub base_wait_ms: u32,
}

impl Default for PatternTiming {
    fn default() -> Self {
        Self {
            repeat: 3,
            base_wait_ms: 500,
        }
    }
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraWaitTiming {
    pub plain_ms: WaitRange,
    pub flinch_total_ms: WaitRange,
    pub flinch_last_half_min_ms: u32,
    /// degrees the vertical axis jumps on a flinch
    pub flinch_offset: Angle,
}

impl Default for ExtraWaitTiming {
    fn default() -> Self {
        Self {
            plain_ms: WaitRange::new(5_000, 10_000),
            flinch_total_ms: WaitRange::new(8_000, 15_000),
            flinch_last_half_min_ms: 1_000,
            flinch_offset: 3,
        }
    }
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTiming {
    pub step_ms: u32,
    /// pause between the two test passes
    pub repeat_pause_ms: u32,
    /// pause before and after the startup run
    pub settle_ms: u32,
}

impl Default for CalibrationTiming {
    fn default() -> Self {
        Self {
            step_ms: 20,
            repeat_pause_ms: 500,
            settle_ms: 2_000,
        }
    }
}

/// Everything that shapes the motion. `Default` gives the ranges and timings
/// the prop was first tuned with.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionConfig {
    pub horizontal: AxisRange,
    pub vertical: AxisRange,
    pub speed: SpeedBounds,
    pub sweep: SweepTiming,
    pub pattern: PatternTiming,
    pub extra_wait: ExtraWaitTiming,
    pub calibration: CalibrationTiming,
    /// pause between two scheduled behaviors
    pub idle_ms: WaitRange,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::for_preset(Preset::Default)
    }
}

impl MotionConfig {
    pub fn for_preset(preset: Preset) -> Self {
        let (horizontal, vertical) = preset.ranges();
        Self {
            horizontal,
            vertical,
            speed: SpeedBounds { fast: 30, slow: 100 },
            sweep: SweepTiming::default(),
            pattern: PatternTiming::default(),
            extra_wait: ExtraWaitTiming::default(),
            calibration: CalibrationTiming::default(),
            idle_ms: WaitRange::new(1_500, 3_000),
        }
    }

    pub fn range(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in Axis::ALL {
            let range = self.range(axis);
            if range.min >= range.max {
                return Err(ConfigError::EmptyRange(axis));
            }
            if range.max > ANGLE_LIMIT {
                return Err(ConfigError::AngleLimit(axis));
            }
        }
        if self.speed.fast > self.speed.slow {
            return Err(ConfigError::SpeedBounds);
        }
        let waits = [
            ("idle", self.idle_ms),
            ("extra wait", self.extra_wait.plain_ms),
            ("flinch", self.extra_wait.flinch_total_ms),
        ];
        for (name, wait) in waits {
            if wait.low > wait.high {
                return Err(ConfigError::WaitRange(name));
            }
        }
        if self.extra_wait.flinch_last_half_min_ms > self.extra_wait.flinch_total_ms.low {
            return Err(ConfigError::FlinchSplit);
        }
        Ok(())
    }
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    EmptyRange(Axis),
    AngleLimit(Axis),
    SpeedBounds,
    WaitRange(&'static str),
    FlinchSplit,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::EmptyRange(axis) => write!(f, "{} range must have min < max", axis),
            ConfigError::AngleLimit(axis) => {
                write!(f, "{} range exceeds {} degrees", axis, ANGLE_LIMIT)
            }
            ConfigError::SpeedBounds => write!(f, "speed.fast must not exceed speed.slow"),
            ConfigError::WaitRange(name) => write!(f, "{} wait range is inverted", name),
            ConfigError::FlinchSplit => {
                write!(f, "flinch last-half minimum exceeds the shortest flinch total")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Travel limits measured at the places the prop has been installed.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Default,
    SmallSquare,
    Hallway,
    FarWall,
    DoorShelf,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Default,
        Preset::SmallSquare,
        Preset::Hallway,
        Preset::FarWall,
        Preset::DoorShelf,
    ];

    /// (horizontal, vertical)
    pub fn ranges(&self) -> (AxisRange, AxisRange) {
        match self {
            Preset::Default => (AxisRange::new(50, 110), AxisRange::new(80, 130)),
            Preset::SmallSquare => (AxisRange::new(50, 110), AxisRange::new(70, 110)),
            Preset::Hallway => (AxisRange::new(60, 80), AxisRange::new(60, 110)),
            Preset::FarWall => (AxisRange::new(70, 75), AxisRange::new(50, 60)),
            Preset::DoorShelf => (AxisRange::new(40, 120), AxisRange::new(70, 130)),
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::SmallSquare => "small-square",
            Preset::Hallway => "hallway",
            Preset::FarWall => "far-wall",
            Preset::DoorShelf => "door-shelf",
        }
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Preset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.to_str() == s)
            .ok_or(())
    }
}
