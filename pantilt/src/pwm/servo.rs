use pantilt_common::{Angle, ANGLE_LIMIT};

/// Pulse widths of the common hobby-servo mapping (544 us at 0 degrees,
/// 2400 us at 180 degrees), in PCA9685 counts at 50 Hz.
pub const DEFAULT_MIN_COUNTS: u16 = 111;
pub const DEFAULT_MAX_COUNTS: u16 = 492;

/// Servo control structure for angle control.
#[derive(Debug, Clone, Copy)]
pub struct Servo {
    min_pulse_width: u16,
    max_pulse_width: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct ServoPwmOut {
    pub on: u16,
    pub off: u16,
}

impl Default for Servo {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_COUNTS, DEFAULT_MAX_COUNTS)
    }
}

impl Servo {
    /// Creates a new `Servo` instance.
    ///
    /// # Parameters
    /// - `min_pulse_width`: Pulse width count for 0 degrees.
    /// - `max_pulse_width`: Pulse width count for 180 degrees.
    pub fn new(min_pulse_width: u16, max_pulse_width: u16) -> Self {
        Servo {
            min_pulse_width,
            max_pulse_width,
        }
    }

    /// Converts an angle to on and off pulse width counts.
    ///
    /// # Parameters
    /// - `angle`: Desired angle from 0 to 180 degrees. Larger values are
    ///   held at 180.
    pub fn angle_to_counts(&self, angle: Angle) -> ServoPwmOut {
        let angle = angle.min(ANGLE_LIMIT) as u32;
        let pulse_range = (self.max_pulse_width - self.min_pulse_width) as u32;
        let pulse_width = pulse_range * angle / ANGLE_LIMIT as u32;
        let on_count = 0;
        let off_count = on_count + self.min_pulse_width + pulse_width as u16;

        ServoPwmOut {
            on: on_count,
            off: off_count,
        }
    }
}
