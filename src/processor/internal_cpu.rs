use crate::hardware::REGISTER_COUNT;
use crate::processor::status_register::{PswFlags, StatusRegister};

pub const R0: usize = 0;
pub const R1: usize = 1;
pub const R2: usize = 2;
pub const R3: usize = 3;
pub const R4: usize = 4;
pub const R5: usize = 5;
pub const SP: usize = 6; // Stack Pointer
pub const PC: usize = 7; // Program Counter

/// Architectural state of the processor: the eight general registers and the
/// PSW. Opcode handlers work on this alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InternalCpu {
    pub registers: [u16; REGISTER_COUNT],
    pub psw: StatusRegister,
}

impl InternalCpu {
    /// Read a register. Byte reads return the low byte.
    pub fn read_register(&self, byte_mode: bool, register: usize) -> u16 {
        let value = self.registers[register];
        if byte_mode {
            value & 0o377
        } else {
            value
        }
    }

    /// Write a register. Byte writes replace the low byte and keep the high
    /// one.
    pub fn write_register(&mut self, byte_mode: bool, register: usize, value: u16) {
        self.registers[register] = if byte_mode {
            (self.registers[register] & 0o177400) | (value & 0o377)
        } else {
            value
        };
    }

    pub fn increment_register(&mut self, byte_mode: bool, register: usize) {
        let step = step_size(byte_mode, register);
        self.registers[register] = self.registers[register].wrapping_add(step);
    }

    pub fn decrement_register(&mut self, byte_mode: bool, register: usize) {
        let step = step_size(byte_mode, register);
        self.registers[register] = self.registers[register].wrapping_sub(step);
    }

    pub fn pc(&self) -> u16 {
        self.registers[PC]
    }

    pub fn set_pc(&mut self, value: u16) {
        self.registers[PC] = value;
    }

    pub fn sp(&self) -> u16 {
        self.registers[SP]
    }

    pub fn set_sp(&mut self, value: u16) {
        self.registers[SP] = value;
    }

    pub fn flag(&self, flag: PswFlags) -> bool {
        self.psw.get(flag)
    }
}

/// Autoincrement/autodecrement quantum. SP and PC always move by a word so
/// they stay even.
pub fn step_size(byte_mode: bool, register: usize) -> u16 {
    if byte_mode && register < SP {
        1
    } else {
        2
    }
}
