
use log::{debug, trace, warn};

use crate::errors::BusError;
use crate::hardware::*;
use crate::interfaces::Bus;
use crate::processor::addressing::{self, Operand};
use crate::processor::instruction::{ExecutionFlow, Instruction, InstructionKind, Opcode};
use crate::processor::instruction_set::{self, InstructionSet, LEGAL_INSTRUCTION_SET};
use crate::processor::internal_cpu::{self, InternalCpu};
use crate::processor::status_register::{PswFlags, StatusRegister};
use crate::utils;

use InstructionKind::*;

/// Synchronous processor faults and interrupts. Each one enters its vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    BusError,
    ReservedInstruction,
    Breakpoint,
    Trace,
    Iot,
    Emt,
    Trap,
    Interrupt(u16),
}

impl Trap {
    pub fn vector(&self) -> u16 {
        match self {
            Trap::BusError => BUS_ERROR_VECTOR,
            Trap::ReservedInstruction => RESERVED_INSTRUCTION_VECTOR,
            Trap::Breakpoint | Trap::Trace => BREAKPOINT_VECTOR,
            Trap::Iot => IOT_VECTOR,
            Trap::Emt => EMT_VECTOR,
            Trap::Trap => TRAP_VECTOR,
            Trap::Interrupt(vector) => *vector,
        }
    }
}

impl From<BusError> for Trap {
    fn from(_: BusError) -> Self {
        Trap::BusError
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuState {
    Running,
    /// Stopped by WAIT until an interrupt is accepted
    Waiting,
    /// Stopped by HALT or a double bus error until the next reset
    Halted,
}

/// K1801VM1 (PDP-11 compatible) processor emulator.
///
/// The processor owns its registers and PSW only. Every operation touching
/// memory gets the bus it runs on, so a single owner can hold both.
pub struct Cpu {
    internal: InternalCpu,
    state: CpuState,
    // set after an instruction executed with T, serviced before the next one
    trace_pending: bool,
    instruction_set: &'static InstructionSet,
}

impl Cpu {
    pub const R0: usize = internal_cpu::R0;
    pub const R1: usize = internal_cpu::R1;
    pub const R2: usize = internal_cpu::R2;
    pub const R3: usize = internal_cpu::R3;
    pub const R4: usize = internal_cpu::R4;
    pub const R5: usize = internal_cpu::R5;
    pub const SP: usize = internal_cpu::SP;
    pub const PC: usize = internal_cpu::PC;

    pub fn new() -> Self {
        Self {
            internal: InternalCpu {
                psw: StatusRegister::new(INITIAL_PSW),
                ..Default::default()
            },
            state: CpuState::Running,
            trace_pending: false,
            instruction_set: &LEGAL_INSTRUCTION_SET,
        }
    }

    /// Load PC and PSW from the reset vector advertised on the bus. General
    /// registers keep their values.
    pub fn reset(&mut self, bus: &dyn Bus) {
        let vector = bus.reset_vector().unwrap_or_default();
        debug!(
            "CPU reset: PC {:06o}, PSW {:06o}",
            vector.pc, vector.psw
        );
        self.internal.set_pc(vector.pc);
        self.internal.psw.reset(vector.psw);
        self.state = CpuState::Running;
        self.trace_pending = false;
    }

    /// Run one instruction to completion.
    ///
    /// A pending trace trap or an accepted interrupt is entered first. Once
    /// in its vector, the instruction there runs in the same step.
    pub fn execute_single_instruction(&mut self, bus: &mut dyn Bus) {
        if self.state == CpuState::Halted {
            return;
        }

        if self.trace_pending {
            self.trace_pending = false;
            self.enter_trap(bus, Trap::Trace);
        } else if let Some(vector) = self.accepted_interrupt(bus) {
            self.state = CpuState::Running;
            if self.enter_trap(bus, Trap::Interrupt(vector)) {
                bus.acknowledge_interrupt(vector);
            }
        }

        if self.state != CpuState::Running {
            return;
        }

        let psw = self.internal.psw;
        let flow = match self.fetch_and_execute(bus) {
            Ok(flow) => flow,
            Err(trap) => {
                // condition codes of a faulting instruction are discarded
                self.internal.psw = psw;
                self.enter_trap(bus, trap);
                return;
            }
        };

        match flow {
            ExecutionFlow::Halt => {
                debug!("HALT at {:06o}", self.internal.pc().wrapping_sub(2));
                self.state = CpuState::Halted;
            }
            ExecutionFlow::Wait => self.state = CpuState::Waiting,
            ExecutionFlow::Continue | ExecutionFlow::SkipTrace => {}
        }

        self.trace_pending = self.internal.flag(PswFlags::T) && flow == ExecutionFlow::Continue;
    }

    fn accepted_interrupt(&self, bus: &dyn Bus) -> Option<u16> {
        if self.internal.psw.priority() >= DEVICE_INTERRUPT_PRIORITY {
            return None;
        }
        bus.pending_interrupt()
    }

    fn fetch_and_execute(&mut self, bus: &mut dyn Bus) -> Result<ExecutionFlow, Trap> {
        let address = self.internal.pc();
        if address & 1 != 0 {
            debug!("Instruction fetch at odd address {:06o}", address);
            return Err(Trap::BusError);
        }
        let opcode = bus.read_memory(false, address)?;
        self.internal.set_pc(address.wrapping_add(2));

        let instruction_set = self.instruction_set;
        let instruction = match instruction_set.lookup(opcode) {
            Some(instruction) => instruction,
            None => {
                debug!("Reserved instruction {:06o} at {:06o}", opcode, address);
                return Err(Trap::ReservedInstruction);
            }
        };
        trace!("{:06o}: {:06o} {}", address, opcode, instruction.name);

        self.exec(bus, instruction, opcode)
    }

    fn exec(
        &mut self,
        bus: &mut dyn Bus,
        instruction: &Instruction,
        opcode: Opcode,
    ) -> Result<ExecutionFlow, Trap> {
        let cpu = &mut self.internal;
        let byte_mode = instruction.byte_operation;
        let source = Operand::decode(utils::bvs(opcode, 11, 6));
        let destination = Operand::decode(opcode);

        match instruction.instruction {
            ConditionCode(fun) => fun(cpu, opcode),
            StoreOp(fun) => {
                let destination = addressing::resolve(cpu, bus, byte_mode, destination)?;
                let result = fun(cpu, byte_mode);
                addressing::store(cpu, bus, byte_mode, &destination, result)?;
            }
            ExecOnOperand(fun) => {
                let operand = addressing::load(cpu, bus, byte_mode, destination)?;
                fun(cpu, byte_mode, operand);
            }
            ReadModifyWrite(fun) => {
                let destination = addressing::resolve(cpu, bus, byte_mode, destination)?;
                let operand = addressing::read(cpu, bus, byte_mode, &destination)?;
                let result = fun(cpu, byte_mode, operand);
                addressing::store(cpu, bus, byte_mode, &destination, result)?;
            }
            Move(fun) => {
                let operand = addressing::load(cpu, bus, byte_mode, source)?;
                let destination = addressing::resolve(cpu, bus, byte_mode, destination)?;
                let result = fun(cpu, byte_mode, operand);
                if byte_mode && destination.is_register() {
                    let extended = utils::sign_extend_byte(result);
                    addressing::store(cpu, bus, false, &destination, extended)?;
                } else {
                    addressing::store(cpu, bus, byte_mode, &destination, result)?;
                }
            }
            ExecOnOperands(fun) => {
                let source = addressing::load(cpu, bus, byte_mode, source)?;
                let destination = addressing::load(cpu, bus, byte_mode, destination)?;
                fun(cpu, byte_mode, source, destination);
            }
            Combine(fun) => {
                let source = addressing::load(cpu, bus, byte_mode, source)?;
                let destination = addressing::resolve(cpu, bus, byte_mode, destination)?;
                let operand = addressing::read(cpu, bus, byte_mode, &destination)?;
                let result = fun(cpu, byte_mode, source, operand);
                addressing::store(cpu, bus, byte_mode, &destination, result)?;
            }
            RegisterCombine(fun) => {
                let register = cpu.read_register(false, utils::bvs(opcode, 8, 6) as usize);
                let destination = addressing::resolve(cpu, bus, false, destination)?;
                let operand = addressing::read(cpu, bus, false, &destination)?;
                let result = fun(cpu, register, operand);
                addressing::store(cpu, bus, false, &destination, result)?;
            }
            Branch(fun) => {
                if fun(cpu) {
                    let offset = utils::sign_extend_byte(opcode) << 1;
                    cpu.set_pc(cpu.pc().wrapping_add(offset));
                }
            }
            Misc(fun) => return fun(cpu, bus, opcode),
        }

        Ok(ExecutionFlow::Continue)
    }

    /// Push PSW and PC, then load PC and PSW from the trap vector. A bus
    /// error on the way in halts the processor and returns false.
    fn enter_trap(&mut self, bus: &mut dyn Bus, trap: Trap) -> bool {
        let vector = trap.vector();
        debug!(
            "{:?} trap at PC {:06o}, vector {:03o}",
            trap,
            self.internal.pc(),
            vector
        );

        let entered = self.push_and_load_vector(bus, vector);
        if let Err(error) = entered {
            warn!(
                "Double bus error entering vector {:03o} ({}), halting",
                vector, error
            );
            self.state = CpuState::Halted;
            return false;
        }
        true
    }

    fn push_and_load_vector(&mut self, bus: &mut dyn Bus, vector: u16) -> Result<(), BusError> {
        let cpu = &mut self.internal;
        let psw = u16::from(cpu.psw);
        let pc = cpu.pc();
        instruction_set::push(cpu, bus, psw)?;
        instruction_set::push(cpu, bus, pc)?;

        let new_pc = bus.read_memory(false, vector)?;
        let new_psw = bus.read_memory(false, vector.wrapping_add(2))?;
        cpu.set_pc(new_pc);
        cpu.psw = new_psw.into();
        Ok(())
    }

    // Registers and PSW

    pub fn read_register(&self, byte_mode: bool, register: usize) -> u16 {
        self.internal.read_register(byte_mode, register)
    }

    pub fn write_register(&mut self, byte_mode: bool, register: usize, value: u16) {
        self.internal.write_register(byte_mode, register, value);
    }

    pub fn increment_register(&mut self, byte_mode: bool, register: usize) {
        self.internal.increment_register(byte_mode, register);
    }

    pub fn decrement_register(&mut self, byte_mode: bool, register: usize) {
        self.internal.decrement_register(byte_mode, register);
    }

    pub fn psw(&self) -> u16 {
        self.internal.psw.into()
    }

    pub fn set_psw(&mut self, psw: u16) {
        self.internal.psw = psw.into();
    }

    /// True when every bit of `flags` is set
    pub fn is_psw_flag_set(&self, flags: PswFlags) -> bool {
        self.internal.psw.get(flags)
    }

    pub fn set_psw_flag_state(&mut self, flags: PswFlags, state: bool) {
        self.internal.psw.set_value(flags, state);
    }

    /// Leave HALT or WAIT and drop a pending trace trap, as after restoring
    /// a saved machine
    pub fn resume(&mut self) {
        self.state = CpuState::Running;
        self.trace_pending = false;
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
