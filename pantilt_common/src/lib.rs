#![cfg_attr(feature = "no_std", no_std)]

#[macro_use]
mod fmt;

pub mod actuator;
pub mod behavior;
pub mod config;
pub mod migrate;
pub mod rng;
pub mod scheduler;
#[cfg(not(feature = "no_std"))]
pub mod sim;

use core::fmt::Display;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

pub use actuator::{Actuator, PinSignal, StatusSignal};
pub use behavior::{Behavior, Busy, FlinchTiming, Puppet, PATTERN_LENGTH};
pub use config::{AxisRange, ConfigError, MotionConfig, Preset, SpeedBounds, WaitRange};
pub use rng::{RandomSource, RngSource};
pub use scheduler::{select, Scheduler, ROLL_RANGE, SELECTION_TABLE};

/// Servo angle in whole degrees.
pub type Angle = u8;

/// Highest angle a hobby servo accepts.
pub const ANGLE_LIMIT: Angle = 180;

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left/right. `min` is most right, `max` is most left.
    Horizontal,
    /// Up/down. `min` is most up, `max` is most down.
    Vertical,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    pub fn index(&self) -> usize {
        match self {
            Axis::Horizontal => 0,
            Axis::Vertical => 1,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
