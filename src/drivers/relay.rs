//! Transmit-path relay driver.
//!
//! One GPIO drives the relay coil through a transistor stage:
//! HIGH = coil energised = transmit path open (locked out),
//! LOW = coil released = transmit path closed.
//!
//! The pin is driven LOW during construction so the output agrees with
//! the interlock's boot state before any sampling happens.

use embedded_hal::digital::OutputPin;
use log::error;

use crate::app::ports::RelayPort;
use crate::error::HardwareInitError;

pub struct RelayDriver<P> {
    pin: P,
    /// Last level the pin accepted.
    energized: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take the pin and drive it to the connected level.
    pub fn new(mut pin: P) -> Result<Self, HardwareInitError> {
        pin.set_low().map_err(|_| HardwareInitError::Relay)?;
        Ok(Self {
            pin,
            energized: false,
        })
    }

    fn drive(&mut self, energize: bool) {
        let result = if energize {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.energized = energize,
            Err(_) => error!("Relay: GPIO write failed (energize={})", energize),
        }
    }
}

impl<P: OutputPin> RelayPort for RelayDriver<P> {
    fn connect(&mut self) {
        self.drive(false);
    }

    fn disconnect(&mut self) {
        self.drive(true);
    }

    fn is_energized(&self) -> bool {
        self.energized
    }
}
