use crate::interfaces::Bus;
use crate::processor::cpu::Trap;
use crate::processor::internal_cpu::InternalCpu;

pub type Opcode = u16;

#[derive(Clone)]
pub struct Instruction {
    pub name: &'static str,
    pub opcode: Opcode,
    // bits of `opcode` that identify the instruction, the rest are operands
    pub mask: u16,
    pub byte_operation: bool,
    pub instruction: InstructionKind,
}

impl Instruction {
    pub fn matches(&self, opcode: Opcode) -> bool {
        opcode & self.mask == self.opcode
    }
}

/// How the processor feeds operands to an opcode handler and where the result
/// goes. Source operands sit in bits 11..6, destination operands in bits 5..0.
#[derive(Clone, Copy)]
pub enum InstructionKind {
    /// Whole opcode handed to the handler, no operands
    ConditionCode(fn(&mut InternalCpu, Opcode)),
    /// Result written to the destination without reading it
    StoreOp(fn(&mut InternalCpu, bool) -> u16),
    /// Destination read, nothing written back
    ExecOnOperand(fn(&mut InternalCpu, bool, u16)),
    ReadModifyWrite(fn(&mut InternalCpu, bool, u16) -> u16),
    /// Source read, result written to the destination. A byte moved into a
    /// register is sign extended to the whole register.
    Move(fn(&mut InternalCpu, bool, u16) -> u16),
    /// Source and destination read, nothing written back
    ExecOnOperands(fn(&mut InternalCpu, bool, u16, u16)),
    /// Source and destination read, result written to the destination
    Combine(fn(&mut InternalCpu, bool, u16, u16) -> u16),
    /// Register (bits 8..6) combined into the destination
    RegisterCombine(fn(&mut InternalCpu, u16, u16) -> u16),
    /// Taken when the handler says so, offset in the low byte
    Branch(fn(&InternalCpu) -> bool),
    /// Control flow, stack and trap instructions decoding their own operands
    Misc(fn(&mut InternalCpu, &mut dyn Bus, Opcode) -> Result<ExecutionFlow, Trap>),
}

/// What the processor does once an instruction completed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionFlow {
    Continue,
    Halt,
    Wait,
    /// Like `Continue` but without a trace trap on this instruction (RTT)
    SkipTrace,
}
