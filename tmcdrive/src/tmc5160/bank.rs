//! Validated register catalog, indexed by name and by address.

use heapless::FnvIndexMap;

use generic::tmc_error::TmcError;

use super::field::RegisterDescriptor;
use super::reg::TMC5160_REGISTERS;

/// Upper bound on the number of registers in one bank. Also the capacity of the dirty queue.
pub const MAX_REGISTERS: usize = 64;

const ADDRESS_SPACE: usize = 0x80;

/// Position of a register within its [`RegisterBank`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterId(u8);

impl RegisterId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct RegisterBank {
    registers: &'static [RegisterDescriptor],
    by_name: FnvIndexMap<&'static str, RegisterId, MAX_REGISTERS>,
    by_address: [Option<RegisterId>; ADDRESS_SPACE],
}

impl RegisterBank {
    /// Builds a bank from a static register table, checking every descriptor (see
    /// [`RegisterDescriptor::validate`]) and that names and addresses are unique.
    pub fn new(registers: &'static [RegisterDescriptor]) -> Result<Self, TmcError> {
        if registers.len() > MAX_REGISTERS {
            return Err(TmcError::CatalogTooLarge);
        }
        let mut by_name = FnvIndexMap::new();
        let mut by_address = [None; ADDRESS_SPACE];
        for (i, reg) in registers.iter().enumerate() {
            reg.validate()?;
            let id = RegisterId(i as u8);
            let slot = &mut by_address[reg.address as usize];
            if slot.is_some() {
                return Err(TmcError::DuplicateAddress);
            }
            *slot = Some(id);
            match by_name.insert(reg.name, id) {
                Ok(None) => {}
                Ok(Some(_)) => return Err(TmcError::DuplicateRegister),
                Err(_) => return Err(TmcError::CatalogTooLarge),
            }
        }
        Ok(RegisterBank { registers, by_name, by_address })
    }

    /// The built-in TMC5160 register map.
    pub fn tmc5160() -> Result<Self, TmcError> {
        Self::new(TMC5160_REGISTERS)
    }

    pub fn id(&self, name: &str) -> Result<RegisterId, TmcError> {
        self.by_name.get(name).copied().ok_or(TmcError::UnknownRegister)
    }

    pub fn lookup(&self, name: &str) -> Result<(RegisterId, &RegisterDescriptor), TmcError> {
        let id = self.id(name)?;
        Ok((id, self.register(id)))
    }

    pub fn by_address(&self, address: u8) -> Option<RegisterId> {
        self.by_address.get(address as usize).copied().flatten()
    }

    /// # Panics
    ///
    /// If `id` was handed out by a different, smaller bank.
    pub fn register(&self, id: RegisterId) -> &RegisterDescriptor {
        &self.registers[id.index()]
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegisterId, &RegisterDescriptor)> + '_ {
        self.registers.iter().enumerate().map(|(i, r)| (RegisterId(i as u8), r))
    }
}
