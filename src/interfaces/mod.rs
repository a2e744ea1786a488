use std::fmt;

use crate::errors::{BkError, BusError};
use crate::hardware::INITIAL_PSW;

/// Inclusive range of bus addresses occupied by a memory or a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u16,
    pub end: u16,
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}-{:06o}", self.start, self.end)
    }
}

/// Start conditions advertised by the system configuration device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetVector {
    pub pc: u16,
    pub psw: u16,
}

impl Default for ResetVector {
    fn default() -> Self {
        Self {
            pc: 0,
            psw: INITIAL_PSW,
        }
    }
}

/// System bus as seen by the processor.
///
/// Byte accesses use the full address. Word accesses are aligned down to the
/// even address containing them.
pub trait Bus {
    /// Read a byte (0..0o377) or a word from `address`
    fn read_memory(&mut self, byte_mode: bool, address: u16) -> Result<u16, BusError>;

    /// Write a byte or a word of `value` to `address`
    fn write_memory(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError>;

    /// Broadcast a reset to every attached device
    fn reset_devices(&mut self);

    /// Start conditions supplied by a system configuration device, if any
    fn reset_vector(&self) -> Option<ResetVector>;

    /// Vector of the first device currently requesting an interrupt
    fn pending_interrupt(&self) -> Option<u16>;

    /// Tell the device owning `vector` its request has been accepted
    fn acknowledge_interrupt(&mut self, vector: u16);
}

/// A contiguous span of RAM or ROM attached to the bus
pub trait Memory: Send {
    fn id(&self) -> &'static str;

    /// First byte address covered by this memory
    fn start_address(&self) -> u16;

    /// Memory size in bytes
    fn size(&self) -> usize;

    /// Read a byte or a word at the absolute bus `address`. Word reads expect
    /// an even address.
    fn read(&self, byte_mode: bool, address: u16) -> Result<u16, BusError>;

    /// Write a byte or a word at the absolute bus `address`
    fn write(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError>;

    fn is_read_only(&self) -> bool;

    /// Raw little-endian contents
    fn contents(&self) -> &[u8];

    /// Host side load of `data` starting `offset` bytes into the memory. ROMs
    /// accept it too, this is how images get attached.
    fn load(&mut self, offset: usize, data: &[u8]) -> Result<(), BkError>;

    fn reset(&mut self) {}

    fn contains(&self, address: u16) -> bool {
        let start = self.start_address() as usize;
        (start..start + self.size()).contains(&(address as usize))
    }
}

/// A memory-mapped peripheral owning one or more word-aligned registers
pub trait Device: Send {
    fn id(&self) -> &'static str;

    /// Word-aligned addresses of the device registers
    fn addresses(&self) -> &[u16];

    fn reset(&mut self);

    /// Read the word register at the even `address`
    fn read(&mut self, address: u16) -> Result<u16, BusError>;

    /// Write a byte or a word to a register. Byte writes carry the real
    /// (possibly odd) address and a value in 0..0o377.
    fn write(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError>;

    fn interrupt_vector(&self) -> Option<u16> {
        None
    }

    fn is_interrupt_requested(&self) -> bool {
        false
    }

    /// Called once the processor has entered the interrupt vector
    fn acknowledge_interrupt(&mut self) {}

    /// Only the system configuration device answers this
    fn reset_vector(&self) -> Option<ResetVector> {
        None
    }
}
