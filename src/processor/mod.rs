pub mod bus;
pub mod cpu;
pub mod memory;
pub mod opcodes;
pub mod status_register;

#[cfg(test)]
mod tests;

mod addressing;
mod instruction;
mod instruction_set;
mod internal_cpu;
