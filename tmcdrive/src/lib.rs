#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod tmc5160;

pub use generic::tmc_error::TmcError;
