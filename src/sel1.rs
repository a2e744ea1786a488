//! SEL1 system register (0o177716).
//!
//! On a BK-0010 this register tells the monitor where to start: the high
//! byte of a read is the start address. The low byte carries keyboard and
//! tape state bits. Writes drive the tape and sound outputs.

use bitflags::bitflags;
use log::debug;

use crate::errors::BusError;
use crate::hardware::{DEFAULT_START_ADDRESS, INITIAL_PSW, SEL1_REGISTER_ADDRESS};
use crate::interfaces::{Device, ResetVector};

bitflags! {
    pub struct Sel1Bits: u16 {
        /// Set by any write, cleared once read back
        const WRITTEN = 0o004;
        const TAPE_INPUT = 0o040;
        const KEY_RELEASED = 0o100;
        const READY = 0o200;

        const IDLE = Self::KEY_RELEASED.bits | Self::READY.bits;
    }
}

pub struct Sel1Register {
    start_address: u16,
    addresses: [u16; 1],
    state: Sel1Bits,
    output: u16,
}

impl Sel1Register {
    pub fn new(start_address: u16) -> Self {
        Self {
            start_address,
            addresses: [SEL1_REGISTER_ADDRESS],
            state: Sel1Bits::IDLE,
            output: 0,
        }
    }

    /// Last value written by the processor
    pub fn output(&self) -> u16 {
        self.output
    }
}

/// Starts at the monitor ROM entry point
impl Default for Sel1Register {
    fn default() -> Self {
        Self::new(DEFAULT_START_ADDRESS)
    }
}

impl Device for Sel1Register {
    fn id(&self) -> &'static str {
        "SEL1"
    }

    fn addresses(&self) -> &[u16] {
        &self.addresses
    }

    fn reset(&mut self) {
        self.state = Sel1Bits::IDLE;
        self.output = 0;
    }

    fn read(&mut self, _address: u16) -> Result<u16, BusError> {
        let value = (self.start_address & 0o177400) | self.state.bits();
        self.state.remove(Sel1Bits::WRITTEN);
        Ok(value)
    }

    fn write(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError> {
        self.output = match (byte_mode, address & 1) {
            (false, _) => value,
            (true, 0) => (self.output & 0o177400) | value,
            (true, _) => (self.output & 0o377) | (value << 8),
        };
        debug!("SEL1 output {:06o}", self.output);
        self.state.insert(Sel1Bits::WRITTEN);
        Ok(())
    }

    fn reset_vector(&self) -> Option<ResetVector> {
        Some(ResetVector {
            pc: self.start_address,
            psw: INITIAL_PSW,
        })
    }
}
