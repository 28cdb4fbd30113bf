//! TMC5160 motion controller over SPI.
//!
//! Registers are described by a static catalog ([`reg::TMC5160_REGISTERS`]) of named fields.
//! Updates are merged into a local register image and sent in one datagram per register when
//! committed.

pub mod bank;
pub mod datagram;
pub mod driver;
pub mod field;
pub mod profile;
pub mod reg;
pub mod state;

pub use bank::{RegisterBank, RegisterId, MAX_REGISTERS};
pub use datagram::{Request, Response, SpiLink, SpiStatus, DATAGRAM_LEN, WRITE_FLAG};
pub use driver::{EnableLine, RampMode, TmcDriver};
pub use field::{AccessMode, Field, RegisterDescriptor};
pub use profile::{FieldSetting, RegisterProfile, RegisterSetting};
pub use reg::TMC5160_REGISTERS;
pub use state::DeviceState;
