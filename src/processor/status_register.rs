use std::convert::From;

use bitflags::bitflags;

use crate::utils;

bitflags! {
    /// Processor Status Word bits
    pub struct PswFlags: u16 {
        const C = 0o001; // carry
        const V = 0o002; // overflow
        const Z = 0o004; // zero
        const N = 0o010; // negative
        const T = 0o020; // trace trap

        const PRIORITY = 0o340;

        const CONDITION_CODES = Self::C.bits | Self::V.bits | Self::Z.bits | Self::N.bits;
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct StatusRegister {
    psw: u16,
}

impl StatusRegister {
    pub fn new(psw: u16) -> Self {
        Self { psw }
    }

    pub fn reset(&mut self, psw: u16) {
        self.psw = psw;
    }

    /// True when every bit of `flag` is set
    pub fn get(&self, flag: PswFlags) -> bool {
        self.psw & flag.bits() == flag.bits()
    }

    pub fn set(&mut self, flag: PswFlags) {
        self.psw |= flag.bits();
    }

    pub fn clear(&mut self, flag: PswFlags) {
        self.psw &= !flag.bits();
    }

    pub fn set_value(&mut self, flag: PswFlags, condition: bool) {
        match condition {
            true => self.set(flag),
            false => self.clear(flag),
        }
    }

    /// Update N and Z from a byte or word result
    pub fn auto_set_nz(&mut self, byte_mode: bool, value: u16) {
        self.set_value(PswFlags::N, value & utils::sign_bit(byte_mode) != 0);
        self.set_value(PswFlags::Z, value & utils::value_mask(byte_mode) == 0);
    }

    /// Processor priority, 0..=7
    pub fn priority(&self) -> u16 {
        utils::bvs(self.psw, 7, 5)
    }
}

impl From<u16> for StatusRegister {
    fn from(value: u16) -> Self {
        Self { psw: value }
    }
}

impl From<StatusRegister> for u16 {
    fn from(value: StatusRegister) -> Self {
        value.psw
    }
}
