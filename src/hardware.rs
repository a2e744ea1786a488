//! BK-0010 hardware constants
//!
//! Addresses and vectors are written in octal, the way PDP-11 documentation
//! does.

// Processor
// ---------

pub const REGISTER_COUNT: usize = 8;

/// PSW loaded at reset: priority 7, every interrupt masked
pub const INITIAL_PSW: u16 = 0o340;

/// Bus request level shared by every BK peripheral
pub const DEVICE_INTERRUPT_PRIORITY: u16 = 4;

// Trap vectors
// ------------
//
// Each vector is a pair of words: new PC, then new PSW

pub const BUS_ERROR_VECTOR: u16 = 0o004;
pub const RESERVED_INSTRUCTION_VECTOR: u16 = 0o010;
pub const BREAKPOINT_VECTOR: u16 = 0o014;
pub const IOT_VECTOR: u16 = 0o020;
pub const EMT_VECTOR: u16 = 0o030;
pub const TRAP_VECTOR: u16 = 0o034;

// Peripherals
// -----------

/// SEL1: system configuration, tape and keyboard state bits
pub const SEL1_REGISTER_ADDRESS: u16 = 0o177716;

/// Monitor ROM entry point of a stock BK-0010
pub const DEFAULT_START_ADDRESS: u16 = 0o100000;
