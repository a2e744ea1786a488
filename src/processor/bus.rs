use std::collections::HashMap;

use log::{info, trace};

use crate::errors::{BusError, ConfigurationError};
use crate::interfaces::AddressRange;
use crate::interfaces::Bus as BusTrait;
use crate::interfaces::{Device, Memory, ResetVector};
use crate::utils;

/// BK system bus: a flat 16-bit address space shared by memories and the
/// registers of memory-mapped devices.
pub struct Bus {
    id: &'static str,
    memories: Vec<Box<dyn Memory>>,
    devices: Vec<Box<dyn Device>>,
    // register address -> index in `devices`
    device_registers: HashMap<u16, usize>,
}

impl Bus {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            memories: Vec::new(),
            devices: Vec::new(),
            device_registers: HashMap::new(),
        }
    }

    pub fn add_memory(&mut self, memory: Box<dyn Memory>) -> Result<(), ConfigurationError> {
        let (id, start, size) = (memory.id(), memory.start_address(), memory.size());
        if start & 1 != 0 || size & 1 != 0 || size == 0 {
            return Err(ConfigurationError::MisalignedRegion { id, start, size });
        }
        if start as usize + size > 1 << 16 {
            return Err(ConfigurationError::OutOfAddressSpace { id, start, size });
        }

        let range = AddressRange {
            start,
            end: (start as usize + size - 1) as u16,
        };
        self.check_overlap(id, range)?;

        info!("Bus ({}) attached {id} at {range}", self.id);
        self.memories.push(memory);
        Ok(())
    }

    pub fn add_device(&mut self, device: Box<dyn Device>) -> Result<(), ConfigurationError> {
        let id = device.id();
        for &address in device.addresses() {
            if address & 1 != 0 {
                return Err(ConfigurationError::MisalignedRegister { id, address });
            }
            self.check_overlap(id, register_range(address))?;
        }

        let index = self.devices.len();
        for &address in device.addresses() {
            self.device_registers.insert(address, index);
            info!(
                "Bus ({}) attached {id} register at {address:06o}",
                self.id
            );
        }
        self.devices.push(device);
        Ok(())
    }

    fn check_overlap(&self, id: &'static str, range: AddressRange) -> Result<(), ConfigurationError> {
        let memories = self
            .memories
            .iter()
            .map(|memory| (memory.id(), memory_range(memory.as_ref())));
        let registers = self
            .device_registers
            .iter()
            .map(|(&address, &index)| (self.devices[index].id(), register_range(address)));

        for (other_id, other_range) in memories.chain(registers) {
            let min_start = std::cmp::min(other_range.start as u32, range.start as u32);
            let max_end = std::cmp::max(other_range.end as u32, range.end as u32) + 1;

            let new_size = (range.end - range.start) as u32 + 1;
            let other_size = (other_range.end - other_range.start) as u32 + 1;

            if new_size + other_size > max_end - min_start {
                return Err(ConfigurationError::Overlap {
                    id,
                    range,
                    other_id,
                    other_range,
                });
            }
        }
        Ok(())
    }

    pub fn memories(&self) -> &[Box<dyn Memory>] {
        &self.memories
    }

    /// Memory starting at `start_address`, if any
    pub fn memory_mut(&mut self, start_address: u16) -> Option<&mut (dyn Memory + 'static)> {
        self.memories
            .iter_mut()
            .find(|memory| memory.start_address() == start_address)
            .map(|memory| memory.as_mut())
    }

    fn memory_at(&self, address: u16) -> Option<&dyn Memory> {
        self.memories
            .iter()
            .find(|memory| memory.contains(address))
            .map(|memory| memory.as_ref())
    }

    fn memory_at_mut(&mut self, address: u16) -> Option<&mut (dyn Memory + 'static)> {
        self.memories
            .iter_mut()
            .find(|memory| memory.contains(address))
            .map(|memory| memory.as_mut())
    }

    fn device_at(&mut self, address: u16) -> Option<&mut (dyn Device + 'static)> {
        let index = *self.device_registers.get(&(address & !1))?;
        Some(self.devices[index].as_mut())
    }
}

fn memory_range(memory: &dyn Memory) -> AddressRange {
    let start = memory.start_address();
    AddressRange {
        start,
        end: (start as usize + memory.size() - 1) as u16,
    }
}

fn register_range(address: u16) -> AddressRange {
    AddressRange {
        start: address,
        end: address + 1,
    }
}

impl BusTrait for Bus {
    fn read_memory(&mut self, byte_mode: bool, address: u16) -> Result<u16, BusError> {
        let address = if byte_mode { address } else { address & !1 };

        let data = if let Some(device) = self.device_at(address) {
            let word = device.read(address & !1)?;
            match (byte_mode, utils::bv(address, 0)) {
                (false, _) => word,
                (true, 0) => word & 0o377,
                (true, _) => word >> 8,
            }
        } else {
            self.memory_at(address)
                .ok_or(BusError::Unmapped { address })?
                .read(byte_mode, address)?
        };

        trace!(
            "Bus ({0}) read from: {address:06o} <- {data:06o}",
            self.id
        );
        Ok(data)
    }

    fn write_memory(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError> {
        let (address, value) = match byte_mode {
            true => (address, value & 0o377),
            false => (address & !1, value),
        };
        trace!(
            "Bus ({0}) write to: {address:06o} <- {value:06o}",
            self.id
        );

        if let Some(device) = self.device_at(address) {
            return device.write(byte_mode, address, value);
        }
        self.memory_at_mut(address)
            .ok_or(BusError::Unmapped { address })?
            .write(byte_mode, address, value)
    }

    fn reset_devices(&mut self) {
        info!("Bus ({}) reset", self.id);
        for memory in self.memories.iter_mut() {
            memory.reset();
        }
        for device in self.devices.iter_mut() {
            device.reset();
        }
    }

    fn reset_vector(&self) -> Option<ResetVector> {
        self.devices.iter().find_map(|device| device.reset_vector())
    }

    fn pending_interrupt(&self) -> Option<u16> {
        self.devices
            .iter()
            .filter(|device| device.is_interrupt_requested())
            .find_map(|device| device.interrupt_vector())
    }

    fn acknowledge_interrupt(&mut self, vector: u16) {
        let requester = self.devices.iter_mut().find(|device| {
            device.is_interrupt_requested() && device.interrupt_vector() == Some(vector)
        });
        if let Some(device) = requester {
            device.acknowledge_interrupt();
        }
    }
}
