use embedded_hal::i2c::I2c;
use pantilt_common::{Actuator, Angle, Axis};
use pwm_pca9685::{Channel, Error, Pca9685};

use super::servo::Servo;

/// Pan and tilt servos on two channels of a PCA9685.
pub struct PanTilt<I2C> {
    pwm: Pca9685<I2C>,
    servo: Servo,
    channels: [Channel; 2],
    angles: [Angle; 2],
}

impl<I2C, E> PanTilt<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Takes over the two channels and drives both servos to `home`
    /// (horizontal, vertical).
    pub fn attach(
        pwm: Pca9685<I2C>,
        servo: Servo,
        horizontal: Channel,
        vertical: Channel,
        home: (Angle, Angle),
    ) -> Result<Self, Error<E>> {
        let mut pan_tilt = Self {
            pwm,
            servo,
            channels: [horizontal, vertical],
            angles: [home.0, home.1],
        };
        pan_tilt.set_angle(Axis::Horizontal, home.0)?;
        pan_tilt.set_angle(Axis::Vertical, home.1)?;
        Ok(pan_tilt)
    }
}

impl<I2C, E> Actuator for PanTilt<I2C>
where
    I2C: I2c<Error = E>,
{
    type Error = Error<E>;

    fn set_angle(&mut self, axis: Axis, angle: Angle) -> Result<(), Self::Error> {
        let counts = self.servo.angle_to_counts(angle);
        self.pwm
            .set_channel_on_off(self.channels[axis.index()], counts.on, counts.off)?;
        self.angles[axis.index()] = angle;
        Ok(())
    }

    fn angle(&self, axis: Axis) -> Angle {
        self.angles[axis.index()]
    }
}
