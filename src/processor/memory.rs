//! RAM and ROM regions attached to the system bus.
//!
//! Both keep their contents as little-endian bytes: the low byte of a word
//! lives at the even address.

use crate::errors::{BkError, BusError};
use crate::interfaces::Memory;

const RAM_ID: &str = "RAM";
const ROM_ID: &str = "ROM";

pub struct Ram {
    start_address: u16,
    memory: Vec<u8>,
}

impl Ram {
    /// Zero filled RAM of `size` bytes
    pub fn new(start_address: u16, size: usize) -> Self {
        Self {
            start_address,
            memory: vec![0; size],
        }
    }

    pub fn from_bytes(start_address: u16, data: &[u8]) -> Self {
        Self {
            start_address,
            memory: data.to_vec(),
        }
    }

    pub fn from_words(start_address: u16, words: &[u16]) -> Self {
        Self {
            start_address,
            memory: words_to_bytes(words),
        }
    }
}

impl Memory for Ram {
    fn id(&self) -> &'static str {
        RAM_ID
    }

    fn start_address(&self) -> u16 {
        self.start_address
    }

    fn size(&self) -> usize {
        self.memory.len()
    }

    fn read(&self, byte_mode: bool, address: u16) -> Result<u16, BusError> {
        let offset = offset(self, address)?;
        Ok(read_value(&self.memory, byte_mode, offset))
    }

    fn write(&mut self, byte_mode: bool, address: u16, value: u16) -> Result<(), BusError> {
        let offset = offset(self, address)?;
        write_value(&mut self.memory, byte_mode, offset, value);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn contents(&self) -> &[u8] {
        &self.memory
    }

    fn load(&mut self, offset: usize, data: &[u8]) -> Result<(), BkError> {
        load_into(&mut self.memory, RAM_ID, offset, data)
    }
}

/// Read only memory. Writes fail with a bus error.
pub struct Rom {
    start_address: u16,
    memory: Vec<u8>,
}

impl Rom {
    pub fn new(start_address: u16, size: usize) -> Self {
        Self {
            start_address,
            memory: vec![0; size],
        }
    }

    pub fn from_bytes(start_address: u16, data: &[u8]) -> Self {
        Self {
            start_address,
            memory: data.to_vec(),
        }
    }

    pub fn from_words(start_address: u16, words: &[u16]) -> Self {
        Self {
            start_address,
            memory: words_to_bytes(words),
        }
    }
}

impl Memory for Rom {
    fn id(&self) -> &'static str {
        ROM_ID
    }

    fn start_address(&self) -> u16 {
        self.start_address
    }

    fn size(&self) -> usize {
        self.memory.len()
    }

    fn read(&self, byte_mode: bool, address: u16) -> Result<u16, BusError> {
        let offset = offset(self, address)?;
        Ok(read_value(&self.memory, byte_mode, offset))
    }

    fn write(&mut self, _byte_mode: bool, address: u16, _value: u16) -> Result<(), BusError> {
        Err(BusError::ReadOnly { id: ROM_ID, address })
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn contents(&self) -> &[u8] {
        &self.memory
    }

    fn load(&mut self, offset: usize, data: &[u8]) -> Result<(), BkError> {
        load_into(&mut self.memory, ROM_ID, offset, data)
    }
}

fn words_to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

fn offset(memory: &dyn Memory, address: u16) -> Result<usize, BusError> {
    if !memory.contains(address) {
        return Err(BusError::Unmapped { address });
    }
    Ok((address - memory.start_address()) as usize)
}

fn read_value(memory: &[u8], byte_mode: bool, offset: usize) -> u16 {
    if byte_mode {
        return memory[offset] as u16;
    }
    let offset = offset & !1;
    // an odd sized region has no high byte for its last word
    let high = memory.get(offset + 1).copied().unwrap_or(0);
    u16::from_le_bytes([memory[offset], high])
}

fn write_value(memory: &mut [u8], byte_mode: bool, offset: usize, value: u16) {
    if byte_mode {
        memory[offset] = value as u8;
        return;
    }
    let offset = offset & !1;
    let [low, high] = value.to_le_bytes();
    memory[offset] = low;
    if let Some(byte) = memory.get_mut(offset + 1) {
        *byte = high;
    }
}

fn load_into(memory: &mut [u8], id: &str, offset: usize, data: &[u8]) -> Result<(), BkError> {
    let end = offset + data.len();
    if end > memory.len() {
        return Err(BkError::InvalidState(format!(
            "{} bytes at offset {offset} don't fit in {id} of {} bytes",
            data.len(),
            memory.len()
        )));
    }
    memory[offset..end].copy_from_slice(data);
    Ok(())
}
