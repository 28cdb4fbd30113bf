//! Register profiles: ordered register -> field -> value settings applied as one batch.
//!
//! Profiles are plain serde data and travel as postcard bytes, the same encoding the rest of the
//! firmware uses for its messages.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use generic::tmc_error::TmcError;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldSetting {
    pub name: String,
    pub value: i64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegisterSetting {
    pub register: String,
    pub fields: Vec<FieldSetting>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegisterProfile {
    pub registers: Vec<RegisterSetting>,
}

impl RegisterProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the settings for one register.
    pub fn with(mut self, register: &str, fields: &[(&str, i64)]) -> Self {
        self.registers.push(RegisterSetting {
            register: register.to_string(),
            fields: fields
                .iter()
                .map(|(name, value)| FieldSetting { name: name.to_string(), value: *value })
                .collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// `(register, fields)` pairs in profile order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, impl Iterator<Item = (&str, i64)> + '_)> + '_ {
        self.registers.iter().map(|reg| {
            (reg.register.as_str(), reg.fields.iter().map(|f| (f.name.as_str(), f.value)))
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TmcError> {
        postcard::from_bytes(bytes).map_err(|_| TmcError::ProfileDecodeError)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, TmcError> {
        postcard::to_allocvec(self).map_err(|_| TmcError::ProfileEncodeError)
    }

    /// Chopper, current and StealthChop settings for a typical bench setup.
    pub fn driver_defaults() -> Self {
        Self::new()
            .with("CHOPCONF", &[("TOFF", 3), ("HSTRT", 4), ("HEND", 1), ("TBL", 2)])
            .with("IHOLD_IRUN", &[("IHOLD", 4), ("IRUN", 31), ("IHOLDDELAY", 6)])
            .with("GLOBAL_SCALER", &[("GLOBAL_SCALER", 128)])
            .with("TPOWERDOWN", &[("TPOWERDOWN", 10)])
            .with("GCONF", &[("EN_PWM_MODE", 1)])
            .with("TPWMTHRS", &[("TPWMTHRS", 500)])
    }

    /// Six-point ramp parameters matching [`driver_defaults`](Self::driver_defaults).
    pub fn ramp_defaults() -> Self {
        Self::new()
            .with("A1", &[("A1", 24000)])
            .with("V1", &[("V1", 50000)])
            .with("AMAX", &[("AMAX", 20000)])
            .with("VMAX", &[("VMAX", 1000000)])
            .with("DMAX", &[("DMAX", 25000)])
            .with("D1", &[("D1", 35000)])
            .with("VSTOP", &[("VSTOP", 10)])
    }

    /// Turns the chopper off.
    pub fn power_off() -> Self {
        Self::new().with("CHOPCONF", &[("TOFF", 0)])
    }
}
