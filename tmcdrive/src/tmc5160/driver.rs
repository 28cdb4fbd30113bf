use embedded_hal::digital::{OutputPin, StatefulOutputPin};
use embedded_hal::spi::SpiDevice;

use generic::tmc_error::TmcError;

use super::bank::RegisterBank;
use super::datagram::{SpiLink, SpiStatus};
use super::profile::RegisterProfile;
use super::state::DeviceState;

/// Values of the RAMPMODE register.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampMode {
    /// Move to XTARGET using the ramp parameters.
    Positioning = 0,
    VelocityPositive = 1,
    VelocityNegative = 2,
    Hold = 3,
}

impl From<RampMode> for u8 {
    fn from(mode: RampMode) -> u8 {
        mode as u8
    }
}

/// The driver enable pin (DRV_ENN), active low.
///
/// Dropping the guard drives the pin high, so the power stage is switched off on every exit path.
pub struct EnableLine<EN: OutputPin> {
    pin: Option<EN>,
}

impl<EN: StatefulOutputPin> EnableLine<EN> {
    /// Takes the pin and drives it to the disabled level.
    pub fn new(mut pin: EN) -> Result<Self, TmcError> {
        pin.set_high().map_err(|_| TmcError::GpioPinError)?;
        Ok(EnableLine { pin: Some(pin) })
    }

    pub fn assert(&mut self) -> Result<(), TmcError> {
        match self.pin.as_mut() {
            Some(pin) => pin.set_low().map_err(|_| TmcError::GpioPinError),
            None => Err(TmcError::GpioPinError),
        }
    }

    pub fn deassert(&mut self) -> Result<(), TmcError> {
        match self.pin.as_mut() {
            Some(pin) => pin.set_high().map_err(|_| TmcError::GpioPinError),
            None => Err(TmcError::GpioPinError),
        }
    }

    pub fn is_asserted(&mut self) -> Result<bool, TmcError> {
        match self.pin.as_mut() {
            Some(pin) => pin.is_set_low().map_err(|_| TmcError::GpioPinError),
            None => Err(TmcError::GpioPinError),
        }
    }

    /// Deasserts the line and hands the pin back.
    pub fn release(mut self) -> Result<EN, TmcError> {
        self.deassert()?;
        self.pin.take().ok_or(TmcError::GpioPinError)
    }
}

impl<EN: OutputPin> Drop for EnableLine<EN> {
    fn drop(&mut self) {
        if let Some(pin) = self.pin.as_mut() {
            if pin.set_high().is_err() {
                warn!("failed to disable driver on drop");
            }
        }
    }
}

/// TMC5160 driven over SPI with a separate enable pin.
///
/// Every setter commits immediately: the requested fields are merged into the register image and
/// the dirty registers are written before the call returns.
pub struct TmcDriver<SPI: SpiDevice, EN: StatefulOutputPin> {
    state: DeviceState,
    link: SpiLink<SPI>,
    enable_line: EnableLine<EN>,
}

impl<SPI, EN> TmcDriver<SPI, EN>
where
    SPI: SpiDevice,
    EN: StatefulOutputPin,
{
    /// Creates a driver for the built-in TMC5160 register map. The enable pin is driven to the
    /// disabled level; nothing is sent over SPI.
    pub fn new(spi: SPI, enable_pin: EN) -> Result<Self, TmcError> {
        Self::with_bank(spi, enable_pin, RegisterBank::tmc5160()?)
    }

    pub fn with_bank(spi: SPI, enable_pin: EN, bank: RegisterBank) -> Result<Self, TmcError> {
        let enable_line = EnableLine::new(enable_pin)?;
        Ok(TmcDriver { state: DeviceState::new(bank), link: SpiLink::new(spi), enable_line })
    }

    /// Updates fields of one register and commits.
    pub fn apply(&mut self, register: &str, fields: &[(&str, i64)]) -> Result<(), TmcError> {
        self.state.request_update(register, fields.iter().copied())?;
        self.commit()
    }

    /// Updates several registers and commits them in one pass.
    pub fn set_register_values(
        &mut self,
        registers: &[(&str, &[(&str, i64)])],
    ) -> Result<(), TmcError> {
        self.state
            .request_updates(registers.iter().map(|(reg, fields)| (*reg, fields.iter().copied())))?;
        self.commit()
    }

    pub fn apply_profile(&mut self, profile: &RegisterProfile) -> Result<(), TmcError> {
        self.state.request_updates(profile.iter())?;
        self.commit()
    }

    /// Writes every pending register. Normally called by the setters; useful to retry after a
    /// transfer error.
    pub fn commit(&mut self) -> Result<(), TmcError> {
        self.state.commit(&mut self.link).map(|_| ())
    }

    /// Only the low two bits are used; see [`RampMode`] for the meaning of each value.
    pub fn set_ramp_mode(&mut self, mode: impl Into<u8>) -> Result<(), TmcError> {
        let mode: u8 = mode.into();
        self.apply("RAMPMODE", &[("RAMPMODE", i64::from(mode))])
    }

    /// Target position in microsteps, truncated to 32 bits.
    pub fn set_target_position(&mut self, steps: i64) -> Result<(), TmcError> {
        self.apply("XTARGET", &[("XTARGET", steps)])
    }

    /// Cached XTARGET.
    pub fn target_position(&self) -> Result<i32, TmcError> {
        Ok(self.state.cached("XTARGET")? as i32)
    }

    pub fn enable(&mut self) -> Result<(), TmcError> {
        info!("tmc driver enable");
        self.enable_line.assert()
    }

    pub fn disable(&mut self) -> Result<(), TmcError> {
        info!("tmc driver disable");
        self.enable_line.deassert()
    }

    pub fn is_enabled(&mut self) -> Result<bool, TmcError> {
        self.enable_line.is_asserted()
    }

    /// Reads a register from the chip and refreshes its cached value.
    pub fn read_register(&mut self, register: &str) -> Result<u32, TmcError> {
        let (id, reg) = self.state.bank().lookup(register)?;
        if !reg.mode.is_readable() {
            return Err(TmcError::WriteOnlyRead);
        }
        let address = reg.address;
        let value = self.link.read(address)?;
        self.state.store(id, value);
        Ok(value)
    }

    pub fn cached(&self, register: &str) -> Result<u32, TmcError> {
        self.state.cached(register)
    }

    /// A field of the cached register value.
    pub fn field(&self, register: &str, field: &str) -> Result<u32, TmcError> {
        let (_, reg) = self.state.bank().lookup(register)?;
        reg.get_field(self.state.cached(register)?, field)
    }

    /// Status byte of the last reply; it reflects the transaction before the last one.
    pub fn last_status(&self) -> Option<SpiStatus> {
        self.link.last_status()
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Switches the chopper off (CHOPCONF.TOFF = 0), disables the driver and returns the bus and
    /// the pin. If the power-off write fails the driver is dropped, which still disables it.
    pub fn shutdown(mut self) -> Result<(SPI, EN), TmcError> {
        info!("tmc driver shutdown");
        self.apply_profile(&RegisterProfile::power_off())?;
        self.release()
    }

    /// Disables the driver and returns the bus and the pin without touching any register.
    pub fn release(self) -> Result<(SPI, EN), TmcError> {
        let TmcDriver { link, enable_line, .. } = self;
        let pin = enable_line.release()?;
        Ok((link.release(), pin))
    }
}
