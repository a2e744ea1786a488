/// BK-0010 computer abstraction.
///
/// A `Computer` wires a `Cpu` to the system `Bus`. Build one, attach memories
/// and devices (a `Sel1Register` tells the processor where to start), `reset`
/// and run it one instruction at a time or until it halts.
use log::info;

use crate::errors::{BkError, BusError};
use crate::hardware::REGISTER_COUNT;
use crate::interfaces::Bus as BusTrait;
use crate::interfaces::{Device, Memory};
use crate::processor::bus::Bus;
use crate::processor::cpu::Cpu;

pub struct Computer {
    cpu: Cpu,
    bus: Bus,
}

/// Machine state a host can save and restore. ROM contents are left out, they
/// come back when the ROMs are attached again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputerState {
    pub registers: [u16; REGISTER_COUNT],
    pub psw: u16,
    pub ram: Vec<RamSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RamSnapshot {
    pub start_address: u16,
    pub data: Vec<u8>,
}

impl Computer {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new("BK"),
        }
    }

    pub fn add_memory(&mut self, memory: impl Memory + 'static) -> Result<(), BkError> {
        self.bus.add_memory(Box::new(memory))?;
        Ok(())
    }

    pub fn add_device(&mut self, device: impl Device + 'static) -> Result<(), BkError> {
        self.bus.add_device(Box::new(device))?;
        Ok(())
    }

    /// Reset every device, then the processor
    pub fn reset(&mut self) {
        info!("Computer reset");
        self.bus.reset_devices();
        self.cpu.reset(&self.bus);
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn read_memory(&mut self, byte_mode: bool, address: u16) -> Result<u16, BusError> {
        self.bus.read_memory(byte_mode, address)
    }

    pub fn write_memory(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError> {
        self.bus.write_memory(byte_mode, address, value)
    }

    pub fn execute_single_instruction(&mut self) {
        self.cpu.execute_single_instruction(&mut self.bus);
    }

    /// Run up to `max_instructions`, stopping early once the processor
    /// halts. Returns how many steps were run.
    pub fn run(&mut self, max_instructions: usize) -> usize {
        let mut executed = 0;
        while executed < max_instructions && !self.cpu.is_halted() {
            self.cpu.execute_single_instruction(&mut self.bus);
            executed += 1;
        }
        executed
    }

    pub fn state(&self) -> ComputerState {
        let mut registers = [0; REGISTER_COUNT];
        for (register, value) in registers.iter_mut().enumerate() {
            *value = self.cpu.read_register(false, register);
        }

        let ram = self
            .bus
            .memories()
            .iter()
            .filter(|memory| !memory.is_read_only())
            .map(|memory| RamSnapshot {
                start_address: memory.start_address(),
                data: memory.contents().to_vec(),
            })
            .collect();

        ComputerState {
            registers,
            psw: self.cpu.psw(),
            ram,
        }
    }

    /// Apply a saved state. Every RAM snapshot must match an attached RAM,
    /// nothing is changed when one doesn't. The processor leaves HALT or
    /// WAIT and runs from the saved PC.
    pub fn restore_state(&mut self, state: &ComputerState) -> Result<(), BkError> {
        for snapshot in state.ram.iter() {
            self.check_snapshot(snapshot)?;
        }
        for snapshot in state.ram.iter() {
            if let Some(memory) = self.bus.memory_mut(snapshot.start_address) {
                memory.load(0, &snapshot.data)?;
            }
        }

        for (register, value) in state.registers.iter().enumerate() {
            self.cpu.write_register(false, register, *value);
        }
        self.cpu.set_psw(state.psw);
        self.cpu.resume();
        info!("Computer state restored");
        Ok(())
    }

    fn check_snapshot(&self, snapshot: &RamSnapshot) -> Result<(), BkError> {
        let memory = self
            .bus
            .memories()
            .iter()
            .find(|memory| {
                memory.start_address() == snapshot.start_address && !memory.is_read_only()
            })
            .ok_or_else(|| {
                BkError::InvalidState(format!(
                    "no RAM attached at {:06o}",
                    snapshot.start_address
                ))
            })?;
        if memory.size() != snapshot.data.len() {
            return Err(BkError::InvalidState(format!(
                "RAM at {:06o} has {} bytes, snapshot has {}",
                snapshot.start_address,
                memory.size(),
                snapshot.data.len()
            )));
        }
        Ok(())
    }
}

impl Default for Computer {
    fn default() -> Self {
        Self::new()
    }
}
