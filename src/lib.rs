//! BK-0010 emulator core
//!
//! PDP-11 compatible K1801VM1 processor, memories and the system bus of the
//! BK family of home computers.

mod computer;
mod errors;
mod hardware;
mod interfaces;
mod metrics;
mod processor;
mod runner;
mod sel1;
mod settings;
mod types;
mod utils;

pub use computer::{Computer, ComputerState, RamSnapshot};
pub use errors::{BkError, BusError, ConfigurationError};
pub use hardware::*;
pub use interfaces::{AddressRange, Bus, Device, Memory, ResetVector};
pub use processor::bus::Bus as SystemBus;
pub use processor::cpu::{Cpu, CpuState, Trap};
pub use processor::memory::{Ram, Rom};
pub use processor::opcodes;
pub use processor::status_register::{PswFlags, StatusRegister};
pub use runner::{Runner, RunnerCommand};
pub use sel1::{Sel1Bits, Sel1Register};
pub use settings::ComputerSettings;
