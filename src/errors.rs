//! BK errors
//!
//! All errors the emulator core can produce

use thiserror::Error;

use crate::interfaces::AddressRange;

/// BK error type
///
/// All host facing errors are encapsuled inside this error type
#[derive(Debug, Error)]
pub enum BkError {
    #[error("Bus configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid machine state: {0}")]
    InvalidState(String),

    #[error("Runner error: {details}")]
    RunnerError { details: String },
}

/// Bus access errors
///
/// A failed access is what the processor sees as a bus error: it traps through
/// vector 4 and carries on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("No memory or device mapped at address {address:06o}")]
    Unmapped { address: u16 },

    #[error("'{id}' refused write to address {address:06o}")]
    ReadOnly { id: &'static str, address: u16 },

    #[error("Instruction fetch or jump to odd address {address:06o}")]
    OddAddress { address: u16 },
}

/// Errors attaching memories or devices to the bus
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("'{id}' (with address {range}) overlaps with '{other_id}' (with address {other_range})")]
    Overlap {
        id: &'static str,
        range: AddressRange,
        other_id: &'static str,
        other_range: AddressRange,
    },

    #[error("'{id}' must start on an even address and have an even, non-zero size (start {start:06o}, size {size})")]
    MisalignedRegion {
        id: &'static str,
        start: u16,
        size: usize,
    },

    #[error("'{id}' doesn't fit in the 16-bit address space (start {start:06o}, size {size})")]
    OutOfAddressSpace {
        id: &'static str,
        start: u16,
        size: usize,
    },

    #[error("'{id}' register address {address:06o} is not word aligned")]
    MisalignedRegister { id: &'static str, address: u16 },
}
