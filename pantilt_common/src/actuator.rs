use embedded_hal::digital::OutputPin;

use crate::{Angle, Axis};

/// Two servos, addressed by axis.
///
/// Implementations remember the last commanded angle; `angle` reports it
/// without touching hardware, the way a hobby servo library does.
pub trait Actuator {
    type Error;

    fn set_angle(&mut self, axis: Axis, angle: Angle) -> Result<(), Self::Error>;

    fn angle(&self, axis: Axis) -> Angle;
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    type Error = T::Error;

    fn set_angle(&mut self, axis: Axis, angle: Angle) -> Result<(), Self::Error> {
        (**self).set_angle(axis, angle)
    }

    fn angle(&self, axis: Axis) -> Angle {
        (**self).angle(axis)
    }
}

/// On/off "busy" indicator.
pub trait StatusSignal {
    fn assert(&mut self);
    fn deassert(&mut self);
}

impl<T: StatusSignal + ?Sized> StatusSignal for &mut T {
    fn assert(&mut self) {
        (**self).assert()
    }

    fn deassert(&mut self) {
        (**self).deassert()
    }
}

/// Status signal on a GPIO, active high.
pub struct PinSignal<P> {
    pin: P,
}

impl<P: OutputPin> PinSignal<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> StatusSignal for PinSignal<P> {
    fn assert(&mut self) {
        if self.pin.set_high().is_err() {
            warn!("status pin: set_high failed");
        }
    }

    fn deassert(&mut self) {
        if self.pin.set_low().is_err() {
            warn!("status pin: set_low failed");
        }
    }
}
