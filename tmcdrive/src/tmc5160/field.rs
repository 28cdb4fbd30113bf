//! Register and field descriptors.
//!
//! A [`RegisterDescriptor`] names one 32-bit register of the chip and lists the bit fields packed
//! into it. Descriptors are plain `'static` data; see [`super::reg`] for the TMC5160 table.

use generic::tmc_error::TmcError;

/// How a register may be accessed over SPI.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    /// Read/write, reading clears the latched flags on the chip.
    ReadWriteClearOnRead,
}

impl AccessMode {
    pub fn is_writable(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }

    pub fn is_readable(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }
}

/// A bit range within a register.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    pub name: &'static str,
    /// Offset of the least significant bit.
    pub lsb: u8,
    /// Width in bits, 1..=32.
    pub bits: u8,
}

impl Field {
    pub const fn new(name: &'static str, lsb: u8, bits: u8) -> Self {
        Field { name, lsb, bits }
    }

    /// Mask of the field's width, not yet shifted into place.
    pub fn value_mask(&self) -> u32 {
        match self.bits {
            0 => 0,
            b if b >= 32 => u32::MAX,
            b => (1u32 << b) - 1,
        }
    }

    /// Mask of the bits the field occupies in the register word.
    pub fn mask(&self) -> u32 {
        self.value_mask().checked_shl(self.lsb as u32).unwrap_or(0)
    }

    /// Replaces this field's bits in `word` with `value`.
    ///
    /// `value` is taken in two's complement and truncated to the field width, so oversized or
    /// negative inputs never fail.
    pub fn insert(&self, word: u32, value: i64) -> u32 {
        let bits = (value as u32) & self.value_mask();
        (word & !self.mask()) | bits.checked_shl(self.lsb as u32).unwrap_or(0)
    }

    pub fn extract(&self, word: u32) -> u32 {
        word.checked_shr(self.lsb as u32).unwrap_or(0) & self.value_mask()
    }

    fn validate(&self) -> Result<(), TmcError> {
        if self.bits == 0 || self.bits > 32 || self.lsb >= 32 || self.lsb + self.bits > 32 {
            return Err(TmcError::FieldOutOfRange);
        }
        Ok(())
    }
}

/// A named, addressable 32-bit register.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDescriptor {
    pub name: &'static str,
    /// 7-bit register address.
    pub address: u8,
    pub mode: AccessMode,
    pub fields: &'static [Field],
}

impl RegisterDescriptor {
    /// Looks up a field by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Result<&Field, TmcError> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or(TmcError::UnknownField)
    }

    /// Applies `updates` on top of `old_value` and returns the new register word.
    ///
    /// Every field name is resolved before the result is returned; an unknown name fails the
    /// whole call with [`TmcError::UnknownField`]. Later updates of the same field win.
    pub fn set_fields<'a, I>(&self, old_value: u32, updates: I) -> Result<u32, TmcError>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut value = old_value;
        for (name, field_value) in updates {
            value = self.field(name)?.insert(value, field_value);
        }
        Ok(value)
    }

    pub fn get_field(&self, value: u32, name: &str) -> Result<u32, TmcError> {
        Ok(self.field(name)?.extract(value))
    }

    /// Checks the address range and the field layout: every field fits the 32-bit word, names
    /// are unique ignoring case, and no two fields share a bit.
    pub fn validate(&self) -> Result<(), TmcError> {
        if self.address > 0x7F {
            return Err(TmcError::AddressOutOfRange);
        }
        for (i, field) in self.fields.iter().enumerate() {
            field.validate()?;
            for other in &self.fields[..i] {
                if other.name.eq_ignore_ascii_case(field.name) {
                    return Err(TmcError::DuplicateField);
                }
                if other.mask() & field.mask() != 0 {
                    return Err(TmcError::FieldOverlap);
                }
            }
        }
        Ok(())
    }
}
