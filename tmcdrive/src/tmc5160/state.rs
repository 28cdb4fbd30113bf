//! Local register image and the dirty queue.
//!
//! Field updates are merged into a pending 32-bit value per register. Pending values wait in an
//! insertion-ordered queue until [`DeviceState::commit`] sends them, one write datagram per
//! register, in the order the registers were first dirtied. Updating an already dirty register
//! merges into its pending value and keeps its place in the queue.

use embedded_hal::spi::SpiDevice;
use heapless::{FnvIndexMap, Vec};

use generic::tmc_error::TmcError;

use super::bank::{RegisterBank, RegisterId, MAX_REGISTERS};
use super::datagram::SpiLink;

pub struct DeviceState {
    bank: RegisterBank,
    cache: [u32; MAX_REGISTERS],
    dirty: FnvIndexMap<RegisterId, u32, MAX_REGISTERS>,
}

impl DeviceState {
    /// All cached values start at zero.
    pub fn new(bank: RegisterBank) -> Self {
        DeviceState { bank, cache: [0; MAX_REGISTERS], dirty: FnvIndexMap::new() }
    }

    pub fn bank(&self) -> &RegisterBank {
        &self.bank
    }

    /// Merges `updates` into the pending value of `register` (or its cached value if it is not
    /// dirty yet) and queues the result.
    ///
    /// Nothing is queued if the register or any field name is unknown.
    pub fn request_update<'a, I>(&mut self, register: &str, updates: I) -> Result<(), TmcError>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let (id, reg) = self.bank.lookup(register)?;
        let base = match self.dirty.get(&id) {
            Some(pending) => *pending,
            None => self.cache[id.index()],
        };
        let value = reg.set_fields(base, updates)?;
        self.dirty.insert(id, value).map_err(|_| TmcError::DirtyQueueOverflow)?;
        Ok(())
    }

    /// Like [`request_update`](Self::request_update) for several registers, all or nothing: if any
    /// register or field is unknown the queue is left as it was.
    pub fn request_updates<'a, R, I>(&mut self, registers: R) -> Result<(), TmcError>
    where
        R: IntoIterator<Item = (&'a str, I)>,
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let saved = self.dirty.clone();
        for (register, updates) in registers {
            if let Err(e) = self.request_update(register, updates) {
                self.dirty = saved;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Sends every pending value, oldest first, and returns how many registers were written.
    ///
    /// Each register is dropped from the queue once its datagram went out. On error the drain
    /// stops: registers already written stay committed, while the failing register and everything
    /// after it stay queued in order so that the next commit retries exactly those. A read-only
    /// register can never be written, so it is discarded along with the
    /// [`TmcError::ReadOnlyWrite`] it raised.
    pub fn commit<SPI: SpiDevice>(&mut self, link: &mut SpiLink<SPI>) -> Result<usize, TmcError> {
        let pending: Vec<(RegisterId, u32), MAX_REGISTERS> =
            self.dirty.iter().map(|(id, value)| (*id, *value)).collect();
        self.dirty.clear();

        for (i, &(id, value)) in pending.iter().enumerate() {
            let reg = self.bank.register(id);
            let result = if reg.mode.is_writable() {
                link.write(reg.address, value).map(|_| ())
            } else {
                warn!("dropping write to read-only register {}", reg.name);
                Err(TmcError::ReadOnlyWrite)
            };
            if let Err(e) = result {
                let keep_from = if e == TmcError::ReadOnlyWrite { i + 1 } else { i };
                for &(id, value) in &pending[keep_from..] {
                    self.dirty.insert(id, value).map_err(|_| TmcError::DirtyQueueOverflow)?;
                }
                return Err(e);
            }
            self.cache[id.index()] = value;
        }
        Ok(pending.len())
    }

    /// Drops every pending value without sending it.
    pub fn discard_pending(&mut self) {
        self.dirty.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Pending `(register name, value)` pairs in commit order.
    pub fn pending(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.dirty.iter().map(move |(id, value)| (self.bank.register(*id).name, *value))
    }

    pub fn pending_value(&self, register: &str) -> Result<Option<u32>, TmcError> {
        let id = self.bank.id(register)?;
        Ok(self.dirty.get(&id).copied())
    }

    /// Last value written to or read from `register`.
    pub fn cached(&self, register: &str) -> Result<u32, TmcError> {
        let id = self.bank.id(register)?;
        Ok(self.cache[id.index()])
    }

    /// Records a value read back from the chip.
    pub fn store(&mut self, id: RegisterId, value: u32) {
        self.cache[id.index()] = value;
    }
}
