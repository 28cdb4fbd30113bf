use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TmcError {
    // Register access
    UnknownRegister,
    UnknownField,
    ReadOnlyWrite,
    WriteOnlyRead,
    DirtyQueueOverflow,

    // Bus and pins
    SpiTransferError,
    GpioPinError,

    // Used by catalog validation
    FieldOutOfRange,
    FieldOverlap,
    DuplicateField,
    DuplicateRegister,
    DuplicateAddress,
    AddressOutOfRange,
    CatalogTooLarge,

    // Used by register profiles
    ProfileDecodeError,
    ProfileEncodeError,
}

impl TmcError {
    /// True for errors raised by the bus or the enable pin rather than by the
    /// register model. After one of these the register cache may no longer
    /// match the chip.
    pub fn is_hardware(&self) -> bool {
        matches!(self, TmcError::SpiTransferError | TmcError::GpioPinError)
    }
}

impl core::fmt::Display for TmcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            TmcError::UnknownRegister => "unknown register",
            TmcError::UnknownField => "unknown field",
            TmcError::ReadOnlyWrite => "attempting to write to read-only register",
            TmcError::WriteOnlyRead => "attempting to read write-only register",
            TmcError::DirtyQueueOverflow => "dirty queue overflow",
            TmcError::SpiTransferError => "spi transfer failed",
            TmcError::GpioPinError => "gpio pin error",
            TmcError::FieldOutOfRange => "field exceeds 32-bit register",
            TmcError::FieldOverlap => "fields overlap",
            TmcError::DuplicateField => "duplicate field name",
            TmcError::DuplicateRegister => "duplicate register name",
            TmcError::DuplicateAddress => "duplicate register address",
            TmcError::AddressOutOfRange => "register address exceeds 7 bits",
            TmcError::CatalogTooLarge => "register catalog too large",
            TmcError::ProfileDecodeError => "profile decode failed",
            TmcError::ProfileEncodeError => "profile encode failed",
        };
        f.write_str(msg)
    }
}

#[test]
fn test_hardware_errors() {
    assert!(TmcError::SpiTransferError.is_hardware());
    assert!(TmcError::GpioPinError.is_hardware());
    assert!(!TmcError::ReadOnlyWrite.is_hardware());
    assert!(!TmcError::UnknownField.is_hardware());
}

#[test]
fn test_postcard_encoding_is_compact() {
    let bytes = postcard::to_allocvec(&TmcError::ReadOnlyWrite).unwrap();
    assert_eq!(bytes.len(), 1);
    let back: TmcError = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(back, TmcError::ReadOnlyWrite);
}
