use once_cell::sync::Lazy;

use crate::errors::BusError;
use crate::interfaces::Bus;
use crate::processor::addressing::{self, AddressingMode, Operand};
use crate::processor::cpu::Trap;
use crate::processor::instruction::{ExecutionFlow, Instruction, InstructionKind, Opcode};
use crate::processor::internal_cpu::{InternalCpu, R5, SP};
use crate::processor::opcodes::*;
use crate::processor::status_register::PswFlags;
use crate::utils;

use InstructionKind::*;

/// K1801VM1 instruction set, decoded once
pub static LEGAL_INSTRUCTION_SET: Lazy<InstructionSet> =
    Lazy::new(InstructionSet::new_legal_opcode_set);

// Opcode masks: the bits of an instruction word naming the operation
const EXACT: u16 = 0o177777;
const CONDITION_CODE_GROUP: u16 = 0o177760;
const REGISTER_ONLY: u16 = 0o177770;
const SINGLE_OPERAND: u16 = 0o177700;
const REGISTER_AND_OPERAND: u16 = 0o177000;
const BRANCH_OFFSET: u16 = 0o177400;
const DOUBLE_OPERAND: u16 = 0o170000;

macro_rules! instruction {
    ($name:expr, $opcode:expr, $mask:expr, $kind:ident($fun:expr)) => {
        Instruction {
            name: $name,
            opcode: $opcode,
            mask: $mask,
            byte_operation: false,
            instruction: $kind($fun),
        }
    };
    ($name:expr, $opcode:expr, $mask:expr, byte, $kind:ident($fun:expr)) => {
        Instruction {
            name: $name,
            opcode: $opcode,
            mask: $mask,
            byte_operation: true,
            instruction: $kind($fun),
        }
    };
}

pub struct InstructionSet {
    instructions: Vec<Instruction>,
    // index into `instructions` for every possible instruction word
    decode_table: Vec<Option<u16>>,
}

impl InstructionSet {
    #[rustfmt::skip]
    pub fn new_legal_opcode_set() -> Self {
        let instructions = vec![
            // Control
            instruction!("HALT",  HALT,  EXACT, Misc(halt)),
            instruction!("WAIT",  WAIT,  EXACT, Misc(wait)),
            instruction!("RTI",   RTI,   EXACT, Misc(rti)),
            instruction!("BPT",   BPT,   EXACT, Misc(bpt)),
            instruction!("IOT",   IOT,   EXACT, Misc(iot)),
            instruction!("RESET", RESET, EXACT, Misc(reset)),
            instruction!("RTT",   RTT,   EXACT, Misc(rtt)),

            // Condition codes. Named forms first, any other combination of
            // flags decodes through the group entries.
            instruction!("NOP", NOP, EXACT, ConditionCode(condition_code)),
            instruction!("CLC", CLC, EXACT, ConditionCode(condition_code)),
            instruction!("CLV", CLV, EXACT, ConditionCode(condition_code)),
            instruction!("CLZ", CLZ, EXACT, ConditionCode(condition_code)),
            instruction!("CLN", CLN, EXACT, ConditionCode(condition_code)),
            instruction!("CCC", CCC, EXACT, ConditionCode(condition_code)),
            instruction!("SEC", SEC, EXACT, ConditionCode(condition_code)),
            instruction!("SEV", SEV, EXACT, ConditionCode(condition_code)),
            instruction!("SEZ", SEZ, EXACT, ConditionCode(condition_code)),
            instruction!("SEN", SEN, EXACT, ConditionCode(condition_code)),
            instruction!("SCC", SCC, EXACT, ConditionCode(condition_code)),
            instruction!("CL",  NOP, CONDITION_CODE_GROUP, ConditionCode(condition_code)),
            instruction!("SE",  0o260, CONDITION_CODE_GROUP, ConditionCode(condition_code)),

            // Jumps and subroutines
            instruction!("JMP",  JMP,  SINGLE_OPERAND, Misc(jmp)),
            instruction!("RTS",  RTS,  REGISTER_ONLY, Misc(rts)),
            instruction!("JSR",  JSR,  REGISTER_AND_OPERAND, Misc(jsr)),
            instruction!("MARK", MARK, SINGLE_OPERAND, Misc(mark)),
            instruction!("SOB",  SOB,  REGISTER_AND_OPERAND, Misc(sob)),

            // Single operand
            instruction!("SWAB", SWAB, SINGLE_OPERAND, ReadModifyWrite(swab)),
            instruction!("CLR",  CLR,  SINGLE_OPERAND, StoreOp(clr)),
            instruction!("COM",  COM,  SINGLE_OPERAND, ReadModifyWrite(com)),
            instruction!("INC",  INC,  SINGLE_OPERAND, ReadModifyWrite(inc)),
            instruction!("DEC",  DEC,  SINGLE_OPERAND, ReadModifyWrite(dec)),
            instruction!("NEG",  NEG,  SINGLE_OPERAND, ReadModifyWrite(neg)),
            instruction!("ADC",  ADC,  SINGLE_OPERAND, ReadModifyWrite(adc)),
            instruction!("SBC",  SBC,  SINGLE_OPERAND, ReadModifyWrite(sbc)),
            instruction!("TST",  TST,  SINGLE_OPERAND, ExecOnOperand(tst)),
            instruction!("ROR",  ROR,  SINGLE_OPERAND, ReadModifyWrite(ror)),
            instruction!("ROL",  ROL,  SINGLE_OPERAND, ReadModifyWrite(rol)),
            instruction!("ASR",  ASR,  SINGLE_OPERAND, ReadModifyWrite(asr)),
            instruction!("ASL",  ASL,  SINGLE_OPERAND, ReadModifyWrite(asl)),
            instruction!("SXT",  SXT,  SINGLE_OPERAND, StoreOp(sxt)),

            instruction!("CLRB", CLRB, SINGLE_OPERAND, byte, StoreOp(clr)),
            instruction!("COMB", COMB, SINGLE_OPERAND, byte, ReadModifyWrite(com)),
            instruction!("INCB", INCB, SINGLE_OPERAND, byte, ReadModifyWrite(inc)),
            instruction!("DECB", DECB, SINGLE_OPERAND, byte, ReadModifyWrite(dec)),
            instruction!("NEGB", NEGB, SINGLE_OPERAND, byte, ReadModifyWrite(neg)),
            instruction!("ADCB", ADCB, SINGLE_OPERAND, byte, ReadModifyWrite(adc)),
            instruction!("SBCB", SBCB, SINGLE_OPERAND, byte, ReadModifyWrite(sbc)),
            instruction!("TSTB", TSTB, SINGLE_OPERAND, byte, ExecOnOperand(tst)),
            instruction!("RORB", RORB, SINGLE_OPERAND, byte, ReadModifyWrite(ror)),
            instruction!("ROLB", ROLB, SINGLE_OPERAND, byte, ReadModifyWrite(rol)),
            instruction!("ASRB", ASRB, SINGLE_OPERAND, byte, ReadModifyWrite(asr)),
            instruction!("ASLB", ASLB, SINGLE_OPERAND, byte, ReadModifyWrite(asl)),
            instruction!("MTPS", MTPS, SINGLE_OPERAND, byte, ExecOnOperand(mtps)),
            instruction!("MFPS", MFPS, SINGLE_OPERAND, byte, Misc(mfps)),

            // Double operand
            instruction!("MOV", MOV, DOUBLE_OPERAND, Move(mov)),
            instruction!("CMP", CMP, DOUBLE_OPERAND, ExecOnOperands(cmp)),
            instruction!("BIT", BIT, DOUBLE_OPERAND, ExecOnOperands(bit)),
            instruction!("BIC", BIC, DOUBLE_OPERAND, Combine(bic)),
            instruction!("BIS", BIS, DOUBLE_OPERAND, Combine(bis)),
            instruction!("ADD", ADD, DOUBLE_OPERAND, Combine(add)),
            instruction!("SUB", SUB, DOUBLE_OPERAND, Combine(sub)),
            instruction!("XOR", XOR, REGISTER_AND_OPERAND, RegisterCombine(xor)),

            instruction!("MOVB", MOVB, DOUBLE_OPERAND, byte, Move(mov)),
            instruction!("CMPB", CMPB, DOUBLE_OPERAND, byte, ExecOnOperands(cmp)),
            instruction!("BITB", BITB, DOUBLE_OPERAND, byte, ExecOnOperands(bit)),
            instruction!("BICB", BICB, DOUBLE_OPERAND, byte, Combine(bic)),
            instruction!("BISB", BISB, DOUBLE_OPERAND, byte, Combine(bis)),

            // Branches
            instruction!("BR",   BR,   BRANCH_OFFSET, Branch(br)),
            instruction!("BNE",  BNE,  BRANCH_OFFSET, Branch(bne)),
            instruction!("BEQ",  BEQ,  BRANCH_OFFSET, Branch(beq)),
            instruction!("BGE",  BGE,  BRANCH_OFFSET, Branch(bge)),
            instruction!("BLT",  BLT,  BRANCH_OFFSET, Branch(blt)),
            instruction!("BGT",  BGT,  BRANCH_OFFSET, Branch(bgt)),
            instruction!("BLE",  BLE,  BRANCH_OFFSET, Branch(ble)),
            instruction!("BPL",  BPL,  BRANCH_OFFSET, Branch(bpl)),
            instruction!("BMI",  BMI,  BRANCH_OFFSET, Branch(bmi)),
            instruction!("BHI",  BHI,  BRANCH_OFFSET, Branch(bhi)),
            instruction!("BLOS", BLOS, BRANCH_OFFSET, Branch(blos)),
            instruction!("BVC",  BVC,  BRANCH_OFFSET, Branch(bvc)),
            instruction!("BVS",  BVS,  BRANCH_OFFSET, Branch(bvs)),
            instruction!("BCC",  BCC,  BRANCH_OFFSET, Branch(bcc)),
            instruction!("BCS",  BCS,  BRANCH_OFFSET, Branch(bcs)),

            // Traps
            instruction!("EMT",  EMT,  BRANCH_OFFSET, Misc(emt)),
            instruction!("TRAP", TRAP, BRANCH_OFFSET, Misc(trap)),
        ];

        Self::from_instructions(instructions)
    }

    /// Build the decode table. When several instructions match a word the one
    /// with the longest mask wins.
    fn from_instructions(instructions: Vec<Instruction>) -> Self {
        let decode_table = (0..=u16::MAX)
            .map(|opcode| {
                instructions
                    .iter()
                    .enumerate()
                    .filter(|(_, instruction)| instruction.matches(opcode))
                    .max_by_key(|(_, instruction)| instruction.mask.count_ones())
                    .map(|(index, _)| index as u16)
            })
            .collect();

        Self {
            instructions,
            decode_table,
        }
    }

    pub fn lookup(&self, opcode: Opcode) -> Option<&Instruction> {
        self.decode_table[opcode as usize].map(|index| &self.instructions[index as usize])
    }
}

// Stack
// -----

pub fn push(cpu: &mut InternalCpu, bus: &mut dyn Bus, value: u16) -> Result<(), BusError> {
    cpu.decrement_register(false, SP);
    bus.write_memory(false, cpu.sp(), value)
}

pub fn pop(cpu: &mut InternalCpu, bus: &mut dyn Bus) -> Result<u16, BusError> {
    let value = bus.read_memory(false, cpu.sp())?;
    cpu.increment_register(false, SP);
    Ok(value)
}

// Instruction Set
// ---------------

// Condition codes

/// CLx/SEx - Clear or Set Condition Codes
///
/// Bit 4 of the opcode selects set (1) or clear (0), bits 3..0 the N Z V C
/// flags affected. NOP is the clear form with no flag selected.
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn condition_code(cpu: &mut InternalCpu, opcode: Opcode) {
    let flags = PswFlags::from_bits_truncate(opcode) & PswFlags::CONDITION_CODES;
    cpu.psw.set_value(flags, opcode & 0o20 != 0);
}

// Single operand

/// CLR(B) - Clear Destination
///
/// Operation:
/// 0 -> (dst)
///
/// Condition codes:
/// N Z V C
/// 0 1 0 0
pub fn clr(cpu: &mut InternalCpu, _byte_mode: bool) -> u16 {
    cpu.psw.clear(PswFlags::CONDITION_CODES);
    cpu.psw.set(PswFlags::Z);
    0
}

/// COM(B) - Complement Destination
///
/// Operation:
/// ~(dst) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + 0 1
pub fn com(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let result = !operand & utils::value_mask(byte_mode);
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw.clear(PswFlags::V);
    cpu.psw.set(PswFlags::C);
    result
}

/// INC(B) - Increment Destination
///
/// Operation:
/// (dst) + 1 -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + -
pub fn inc(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let mask = utils::value_mask(byte_mode);
    let result = operand.wrapping_add(1) & mask;
    cpu.psw.auto_set_nz(byte_mode, result);
    // largest positive number wraps to the most negative one
    cpu.psw
        .set_value(PswFlags::V, result == utils::sign_bit(byte_mode));
    result
}

/// DEC(B) - Decrement Destination
///
/// Operation:
/// (dst) - 1 -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + -
pub fn dec(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let mask = utils::value_mask(byte_mode);
    let result = operand.wrapping_sub(1) & mask;
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw
        .set_value(PswFlags::V, operand & mask == utils::sign_bit(byte_mode));
    result
}

/// NEG(B) - Negate Destination
///
/// Operation:
/// -(dst) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn neg(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let result = 0u16.wrapping_sub(operand) & utils::value_mask(byte_mode);
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw
        .set_value(PswFlags::V, result == utils::sign_bit(byte_mode));
    cpu.psw.set_value(PswFlags::C, result != 0);
    result
}

/// ADC(B) - Add Carry
///
/// Operation:
/// (dst) + C -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn adc(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let mask = utils::value_mask(byte_mode);
    let operand = operand & mask;
    let carry = cpu.psw.get(PswFlags::C);
    let result = operand.wrapping_add(carry as u16) & mask;
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw.set_value(
        PswFlags::V,
        carry && operand == utils::sign_bit(byte_mode) - 1,
    );
    cpu.psw.set_value(PswFlags::C, carry && operand == mask);
    result
}

/// SBC(B) - Subtract Carry
///
/// Operation:
/// (dst) - C -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn sbc(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let mask = utils::value_mask(byte_mode);
    let operand = operand & mask;
    let carry = cpu.psw.get(PswFlags::C);
    let result = operand.wrapping_sub(carry as u16) & mask;
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw
        .set_value(PswFlags::V, operand == utils::sign_bit(byte_mode));
    cpu.psw.set_value(PswFlags::C, carry && operand == 0);
    result
}

/// TST(B) - Test Destination
///
/// Operation:
/// (dst) is compared with 0
///
/// Condition codes:
/// N Z V C
/// + + 0 0
pub fn tst(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) {
    cpu.psw.auto_set_nz(byte_mode, operand);
    cpu.psw.clear(PswFlags::V | PswFlags::C);
}

// V of the shift and rotate family is N xor C after the operation
fn set_shift_flags(cpu: &mut InternalCpu, byte_mode: bool, result: u16, carry: bool) {
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw.set_value(PswFlags::C, carry);
    let negative = cpu.psw.get(PswFlags::N);
    cpu.psw.set_value(PswFlags::V, negative != carry);
}

/// ROR(B) - Rotate Right
///
/// Operation:
/// C -> sign bit, bit 0 -> C
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn ror(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let operand = operand & utils::value_mask(byte_mode);
    let carry_in = if cpu.psw.get(PswFlags::C) {
        utils::sign_bit(byte_mode)
    } else {
        0
    };
    let result = (operand >> 1) | carry_in;
    set_shift_flags(cpu, byte_mode, result, utils::bv(operand, 0) != 0);
    result
}

/// ROL(B) - Rotate Left
///
/// Operation:
/// sign bit -> C, C -> bit 0
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn rol(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let carry_in = cpu.psw.get(PswFlags::C) as u16;
    let result = ((operand << 1) | carry_in) & utils::value_mask(byte_mode);
    let carry = operand & utils::sign_bit(byte_mode) != 0;
    set_shift_flags(cpu, byte_mode, result, carry);
    result
}

/// ASR(B) - Arithmetic Shift Right
///
/// Operation:
/// sign bit kept, bit 0 -> C
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn asr(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let operand = operand & utils::value_mask(byte_mode);
    let result = (operand >> 1) | (operand & utils::sign_bit(byte_mode));
    set_shift_flags(cpu, byte_mode, result, utils::bv(operand, 0) != 0);
    result
}

/// ASL(B) - Arithmetic Shift Left
///
/// Operation:
/// sign bit -> C, 0 -> bit 0
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn asl(cpu: &mut InternalCpu, byte_mode: bool, operand: u16) -> u16 {
    let result = (operand << 1) & utils::value_mask(byte_mode);
    let carry = operand & utils::sign_bit(byte_mode) != 0;
    set_shift_flags(cpu, byte_mode, result, carry);
    result
}

/// SWAB - Swap Bytes
///
/// Condition codes (from the new low byte):
/// N Z V C
/// + + 0 0
pub fn swab(cpu: &mut InternalCpu, _byte_mode: bool, operand: u16) -> u16 {
    let result = operand.rotate_left(8);
    cpu.psw.auto_set_nz(true, result);
    cpu.psw.clear(PswFlags::V | PswFlags::C);
    result
}

/// SXT - Sign Extend
///
/// Operation:
/// 0 -> (dst) if N is clear, -1 -> (dst) if N is set
///
/// Condition codes:
/// N Z V C
/// - + 0 -
pub fn sxt(cpu: &mut InternalCpu, _byte_mode: bool) -> u16 {
    let negative = cpu.psw.get(PswFlags::N);
    cpu.psw.set_value(PswFlags::Z, !negative);
    cpu.psw.clear(PswFlags::V);
    if negative {
        0o177777
    } else {
        0
    }
}

/// MTPS - Move Byte To Processor Status Word
///
/// The T bit can't be changed this way.
pub fn mtps(cpu: &mut InternalCpu, _byte_mode: bool, operand: u16) {
    let psw = u16::from(cpu.psw);
    let kept = psw & !0o377 | psw & PswFlags::T.bits();
    cpu.psw = (kept | operand & 0o377 & !PswFlags::T.bits()).into();
}

/// MFPS - Move Byte From Processor Status Word
///
/// A register destination receives the sign extended PSW low byte.
///
/// Condition codes:
/// N Z V C
/// + + 0 -
pub fn mfps(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    opcode: Opcode,
) -> Result<ExecutionFlow, Trap> {
    let destination = addressing::resolve(cpu, bus, true, Operand::decode(opcode))?;
    let value = u16::from(cpu.psw) & 0o377;
    cpu.psw.auto_set_nz(true, value);
    cpu.psw.clear(PswFlags::V);
    if destination.is_register() {
        addressing::store(cpu, bus, false, &destination, utils::sign_extend_byte(value))?;
    } else {
        addressing::store(cpu, bus, true, &destination, value)?;
    }
    Ok(ExecutionFlow::Continue)
}

// Double operand

/// MOV(B) - Move Source to Destination
///
/// Operation:
/// (src) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + 0 -
pub fn mov(cpu: &mut InternalCpu, byte_mode: bool, source: u16) -> u16 {
    cpu.psw.auto_set_nz(byte_mode, source);
    cpu.psw.clear(PswFlags::V);
    source
}

/// CMP(B) - Compare Source to Destination
///
/// Operation:
/// (src) - (dst), only condition codes change
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn cmp(cpu: &mut InternalCpu, byte_mode: bool, source: u16, destination: u16) {
    let mask = utils::value_mask(byte_mode);
    let (source, destination) = (source & mask, destination & mask);
    let result = source.wrapping_sub(destination) & mask;
    cpu.psw.auto_set_nz(byte_mode, result);
    let overflow = (source ^ destination) & (source ^ result) & utils::sign_bit(byte_mode);
    cpu.psw.set_value(PswFlags::V, overflow != 0);
    cpu.psw.set_value(PswFlags::C, source < destination);
}

/// BIT(B) - Bit Test
///
/// Operation:
/// (src) & (dst), only condition codes change
///
/// Condition codes:
/// N Z V C
/// + + 0 -
pub fn bit(cpu: &mut InternalCpu, byte_mode: bool, source: u16, destination: u16) {
    cpu.psw.auto_set_nz(byte_mode, source & destination);
    cpu.psw.clear(PswFlags::V);
}

/// BIC(B) - Bit Clear
///
/// Operation:
/// ~(src) & (dst) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + 0 -
pub fn bic(cpu: &mut InternalCpu, byte_mode: bool, source: u16, destination: u16) -> u16 {
    let result = !source & destination;
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw.clear(PswFlags::V);
    result
}

/// BIS(B) - Bit Set
///
/// Operation:
/// (src) | (dst) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + 0 -
pub fn bis(cpu: &mut InternalCpu, byte_mode: bool, source: u16, destination: u16) -> u16 {
    let result = source | destination;
    cpu.psw.auto_set_nz(byte_mode, result);
    cpu.psw.clear(PswFlags::V);
    result
}

/// ADD - Add Source to Destination
///
/// Operation:
/// (src) + (dst) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn add(cpu: &mut InternalCpu, _byte_mode: bool, source: u16, destination: u16) -> u16 {
    let (result, carry) = destination.overflowing_add(source);
    cpu.psw.auto_set_nz(false, result);
    let overflow = !(source ^ destination) & (source ^ result) & 0o100000;
    cpu.psw.set_value(PswFlags::V, overflow != 0);
    cpu.psw.set_value(PswFlags::C, carry);
    result
}

/// SUB - Subtract Source from Destination
///
/// Operation:
/// (dst) - (src) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + + +
pub fn sub(cpu: &mut InternalCpu, _byte_mode: bool, source: u16, destination: u16) -> u16 {
    let (result, borrow) = destination.overflowing_sub(source);
    cpu.psw.auto_set_nz(false, result);
    let overflow = (source ^ destination) & (destination ^ result) & 0o100000;
    cpu.psw.set_value(PswFlags::V, overflow != 0);
    cpu.psw.set_value(PswFlags::C, borrow);
    result
}

/// XOR - Exclusive OR
///
/// Operation:
/// R ^ (dst) -> (dst)
///
/// Condition codes:
/// N Z V C
/// + + 0 -
pub fn xor(cpu: &mut InternalCpu, register: u16, destination: u16) -> u16 {
    let result = register ^ destination;
    cpu.psw.auto_set_nz(false, result);
    cpu.psw.clear(PswFlags::V);
    result
}

// Branches

fn sign_differs(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::N) != cpu.psw.get(PswFlags::V)
}

/// BR - Branch Always
pub fn br(_cpu: &InternalCpu) -> bool {
    true
}

/// BNE - Branch if Not Equal (Z = 0)
pub fn bne(cpu: &InternalCpu) -> bool {
    !cpu.psw.get(PswFlags::Z)
}

/// BEQ - Branch if Equal (Z = 1)
pub fn beq(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::Z)
}

/// BGE - Branch if Greater or Equal (N xor V = 0)
pub fn bge(cpu: &InternalCpu) -> bool {
    !sign_differs(cpu)
}

/// BLT - Branch if Less Than (N xor V = 1)
pub fn blt(cpu: &InternalCpu) -> bool {
    sign_differs(cpu)
}

/// BGT - Branch if Greater Than (Z or (N xor V) = 0)
pub fn bgt(cpu: &InternalCpu) -> bool {
    !(cpu.psw.get(PswFlags::Z) || sign_differs(cpu))
}

/// BLE - Branch if Less or Equal (Z or (N xor V) = 1)
pub fn ble(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::Z) || sign_differs(cpu)
}

/// BPL - Branch if Plus (N = 0)
pub fn bpl(cpu: &InternalCpu) -> bool {
    !cpu.psw.get(PswFlags::N)
}

/// BMI - Branch if Minus (N = 1)
pub fn bmi(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::N)
}

/// BHI - Branch if Higher (C = 0 and Z = 0)
pub fn bhi(cpu: &InternalCpu) -> bool {
    !cpu.psw.get(PswFlags::C) && !cpu.psw.get(PswFlags::Z)
}

/// BLOS - Branch if Lower or Same (C or Z = 1)
pub fn blos(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::C) || cpu.psw.get(PswFlags::Z)
}

/// BVC - Branch if Overflow Clear
pub fn bvc(cpu: &InternalCpu) -> bool {
    !cpu.psw.get(PswFlags::V)
}

/// BVS - Branch if Overflow Set
pub fn bvs(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::V)
}

/// BCC - Branch if Carry Clear (also BHIS)
pub fn bcc(cpu: &InternalCpu) -> bool {
    !cpu.psw.get(PswFlags::C)
}

/// BCS - Branch if Carry Set (also BLO)
pub fn bcs(cpu: &InternalCpu) -> bool {
    cpu.psw.get(PswFlags::C)
}

// Jumps and subroutines

// Address of a JMP/JSR destination. Jumping to a register is reserved.
fn jump_target(
    cpu: &mut InternalCpu,
    bus: &mut dyn Bus,
    opcode: Opcode,
) -> Result<u16, Trap> {
    let operand = Operand::decode(opcode);
    if operand.mode == AddressingMode::Register {
        return Err(Trap::ReservedInstruction);
    }
    let destination = addressing::resolve(cpu, bus, false, operand)?;
    addressing::complete(cpu, &destination);
    let address = destination.effective_address().unwrap_or_default();
    if address & 1 != 0 {
        return Err(BusError::OddAddress { address }.into());
    }
    Ok(address)
}

/// JMP - Jump
///
/// Operation:
/// (dst) address -> PC
pub fn jmp(cpu: &mut InternalCpu, bus: &mut dyn Bus, opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    let address = jump_target(cpu, bus, opcode)?;
    cpu.set_pc(address);
    Ok(ExecutionFlow::Continue)
}

/// JSR - Jump to Subroutine
///
/// Operation:
/// R -> -(SP), PC -> R, (dst) address -> PC
pub fn jsr(cpu: &mut InternalCpu, bus: &mut dyn Bus, opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    let register = utils::bvs(opcode, 8, 6) as usize;
    let address = jump_target(cpu, bus, opcode)?;
    let linkage = cpu.registers[register];
    push(cpu, bus, linkage)?;
    cpu.registers[register] = cpu.pc();
    cpu.set_pc(address);
    Ok(ExecutionFlow::Continue)
}

/// RTS - Return from Subroutine
///
/// Operation:
/// R -> PC, (SP)+ -> R
pub fn rts(cpu: &mut InternalCpu, bus: &mut dyn Bus, opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    let register = utils::bvs(opcode, 2, 0) as usize;
    let address = cpu.registers[register];
    if address & 1 != 0 {
        return Err(BusError::OddAddress { address }.into());
    }
    let saved = pop(cpu, bus)?;
    cpu.set_pc(address);
    cpu.registers[register] = saved;
    Ok(ExecutionFlow::Continue)
}

/// MARK - Mark
///
/// Operation:
/// PC + 2 * nn -> SP, R5 -> PC, (SP)+ -> R5
pub fn mark(cpu: &mut InternalCpu, bus: &mut dyn Bus, opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    let parameters = utils::bvs(opcode, 5, 0);
    cpu.set_sp(cpu.pc().wrapping_add(parameters * 2));
    let address = cpu.registers[R5];
    if address & 1 != 0 {
        return Err(BusError::OddAddress { address }.into());
    }
    let saved = pop(cpu, bus)?;
    cpu.set_pc(address);
    cpu.registers[R5] = saved;
    Ok(ExecutionFlow::Continue)
}

/// SOB - Subtract One and Branch
///
/// Operation:
/// R - 1 -> R, if R != 0: PC - 2 * nn -> PC
pub fn sob(cpu: &mut InternalCpu, _bus: &mut dyn Bus, opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    let register = utils::bvs(opcode, 8, 6) as usize;
    let counter = cpu.registers[register].wrapping_sub(1);
    cpu.registers[register] = counter;
    if counter != 0 {
        let offset = utils::bvs(opcode, 5, 0) * 2;
        cpu.set_pc(cpu.pc().wrapping_sub(offset));
    }
    Ok(ExecutionFlow::Continue)
}

// Control

/// HALT - Halt the processor until the next reset
pub fn halt(_cpu: &mut InternalCpu, _bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    Ok(ExecutionFlow::Halt)
}

/// WAIT - Wait for an interrupt
pub fn wait(_cpu: &mut InternalCpu, _bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    Ok(ExecutionFlow::Wait)
}

fn return_from_interrupt(cpu: &mut InternalCpu, bus: &mut dyn Bus) -> Result<(), Trap> {
    let pc = pop(cpu, bus)?;
    let psw = pop(cpu, bus)?;
    cpu.set_pc(pc);
    cpu.psw = psw.into();
    Ok(())
}

/// RTI - Return from Interrupt
///
/// Operation:
/// (SP)+ -> PC, (SP)+ -> PSW
pub fn rti(cpu: &mut InternalCpu, bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    return_from_interrupt(cpu, bus)?;
    Ok(ExecutionFlow::Continue)
}

/// RTT - Return from Trap
///
/// Same as RTI but a T bit restored from the stack only traps after the
/// next instruction.
pub fn rtt(cpu: &mut InternalCpu, bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    return_from_interrupt(cpu, bus)?;
    Ok(ExecutionFlow::SkipTrace)
}

/// RESET - Reset External Bus
pub fn reset(_cpu: &mut InternalCpu, bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    bus.reset_devices();
    Ok(ExecutionFlow::Continue)
}

/// BPT - Breakpoint Trap (vector 14)
pub fn bpt(_cpu: &mut InternalCpu, _bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    Err(Trap::Breakpoint)
}

/// IOT - Input/Output Trap (vector 20)
pub fn iot(_cpu: &mut InternalCpu, _bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    Err(Trap::Iot)
}

/// EMT - Emulator Trap (vector 30). The low byte is left for the handler to
/// fetch from the instruction word.
pub fn emt(_cpu: &mut InternalCpu, _bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    Err(Trap::Emt)
}

/// TRAP - Trap (vector 34)
pub fn trap(_cpu: &mut InternalCpu, _bus: &mut dyn Bus, _opcode: Opcode) -> Result<ExecutionFlow, Trap> {
    Err(Trap::Trap)
}
