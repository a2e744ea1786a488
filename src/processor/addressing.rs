//! PDP-11 operand addressing.
//!
//! An operand specifier is six bits: a 3-bit mode and a 3-bit register. An
//! operand is resolved in two phases. `resolve` runs the mode's pre action
//! (autodecrement), fetches index words and deferred pointers and returns the
//! operand location. The post action (autoincrement) is kept aside and only
//! applied by `complete` once the access through the location succeeded, so a
//! failed access leaves the register untouched.

use crate::errors::BusError;
use crate::interfaces::Bus;
use crate::processor::internal_cpu::{step_size, InternalCpu, PC};
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    Register,              // Rn
    RegisterDeferred,      // (Rn)
    Autoincrement,         // (Rn)+
    AutoincrementDeferred, // @(Rn)+
    Autodecrement,         // -(Rn)
    AutodecrementDeferred, // @-(Rn)
    Index,                 // X(Rn)
    IndexDeferred,         // @X(Rn)
}
use AddressingMode::*;

impl AddressingMode {
    pub fn from_code(code: u16) -> Self {
        match code & 0o7 {
            0 => Register,
            1 => RegisterDeferred,
            2 => Autoincrement,
            3 => AutoincrementDeferred,
            4 => Autodecrement,
            5 => AutodecrementDeferred,
            6 => Index,
            _ => IndexDeferred,
        }
    }
}

/// Decoded 6-bit operand specifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operand {
    pub mode: AddressingMode,
    pub register: usize,
}

impl Operand {
    pub fn decode(field: u16) -> Self {
        Self {
            mode: AddressingMode::from_code(utils::bvs(field, 5, 3)),
            register: utils::bvs(field, 2, 0) as usize,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Register(usize),
    Memory(u16),
}

/// Operand location with its pending post action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedOperand {
    pub location: Location,
    post_increment: Option<(usize, u16)>,
}

impl ResolvedOperand {
    /// Address of a memory operand. Register operands have none.
    pub fn effective_address(&self) -> Option<u16> {
        match self.location {
            Location::Register(_) => None,
            Location::Memory(address) => Some(address),
        }
    }

    pub fn is_register(&self) -> bool {
        matches!(self.location, Location::Register(_))
    }
}

/// Compute the location of `operand`, running its pre action
pub fn resolve(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    byte_mode: bool,
    operand: Operand,
) -> Result<ResolvedOperand, BusError> {
    let register = operand.register;
    let memory = |address| ResolvedOperand {
        location: Location::Memory(address),
        post_increment: None,
    };

    let resolved = match operand.mode {
        Register => ResolvedOperand {
            location: Location::Register(register),
            post_increment: None,
        },
        RegisterDeferred => memory(cpu.registers[register]),
        Autoincrement => ResolvedOperand {
            location: Location::Memory(cpu.registers[register]),
            post_increment: Some((register, step_size(byte_mode, register))),
        },
        AutoincrementDeferred => {
            let pointer = bus.read_memory(false, cpu.registers[register])?;
            ResolvedOperand {
                location: Location::Memory(pointer),
                post_increment: Some((register, 2)),
            }
        }
        Autodecrement => {
            cpu.decrement_register(byte_mode, register);
            memory(cpu.registers[register])
        }
        AutodecrementDeferred => {
            cpu.decrement_register(false, register);
            memory(bus.read_memory(false, cpu.registers[register])?)
        }
        Index => memory(indexed_address(cpu, bus, register)?),
        IndexDeferred => {
            let address = indexed_address(cpu, bus, register)?;
            memory(bus.read_memory(false, address)?)
        }
    };

    Ok(resolved)
}

// X(Rn): the index word follows the instruction. PC is advanced past it
// before Rn is sampled, which makes X(PC) relative to the next word.
fn indexed_address(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    register: usize,
) -> Result<u16, BusError> {
    let index = bus.read_memory(false, cpu.pc())?;
    cpu.increment_register(false, PC);
    Ok(cpu.registers[register].wrapping_add(index))
}

pub fn read(
    cpu: &InternalCpu,
    bus: &mut dyn Bus,
    byte_mode: bool,
    operand: &ResolvedOperand,
) -> Result<u16, BusError> {
    match operand.location {
        Location::Register(register) => Ok(cpu.read_register(byte_mode, register)),
        Location::Memory(address) => bus.read_memory(byte_mode, address),
    }
}

/// Write `value` to the operand location. The program counter only takes even
/// values.
pub fn write(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    byte_mode: bool,
    operand: &ResolvedOperand,
    value: u16,
) -> Result<(), BusError> {
    match operand.location {
        Location::Register(register) => {
            if register == PC {
                let target = match byte_mode {
                    true => (cpu.pc() & 0o177400) | (value & 0o377),
                    false => value,
                };
                if target & 1 != 0 {
                    return Err(BusError::OddAddress { address: target });
                }
            }
            cpu.write_register(byte_mode, register, value);
            Ok(())
        }
        Location::Memory(address) => bus.write_memory(byte_mode, address, value),
    }
}

/// Apply the post action of a resolved operand
pub fn complete(cpu: &mut InternalCpu, operand: &ResolvedOperand) {
    if let Some((register, step)) = operand.post_increment {
        cpu.registers[register] = cpu.registers[register].wrapping_add(step);
    }
}

/// Resolve, read and complete a source operand
pub fn load(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    byte_mode: bool,
    operand: Operand,
) -> Result<u16, BusError> {
    let resolved = resolve(cpu, bus, byte_mode, operand)?;
    let value = read(cpu, bus, byte_mode, &resolved)?;
    complete(cpu, &resolved);
    Ok(value)
}

/// Write to an already resolved operand and complete it
pub fn store(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    byte_mode: bool,
    operand: &ResolvedOperand,
    value: u16,
) -> Result<(), BusError> {
    write(cpu, bus, byte_mode, operand, value)?;
    complete(cpu, operand);
    Ok(())
}
