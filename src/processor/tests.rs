#![allow(non_snake_case)]

use crate::processor::instruction::InstructionKind;
use crate::processor::instruction_set;
use crate::processor::instruction_set::LEGAL_INSTRUCTION_SET;
use crate::processor::internal_cpu::*;
use crate::processor::opcodes::*;
use crate::processor::status_register::*;

fn cpu_with_psw(psw: u16) -> InternalCpu {
    InternalCpu {
        psw: StatusRegister::new(psw),
        ..Default::default()
    }
}

fn psw(cpu: &InternalCpu) -> u16 {
    cpu.psw.into()
}

//////////////////////////////////////////////////////////////////////
// DECODING
//////////////////////////////////////////////////////////////////////

#[test]
fn test_decode_names() {
    let cases = [
        (0o000000, "HALT"),
        (0o000240, "NOP"),
        (0o000257, "CCC"),
        (0o000243, "CL"),
        (0o000263, "SE"),
        (0o005000, "CLR"),
        (0o105037, "CLRB"),
        (0o012701, "MOV"),
        (0o112701, "MOVB"),
        (0o160102, "SUB"),
        (0o074012, "XOR"),
        (0o077102, "SOB"),
        (0o004737, "JSR"),
        (0o000207, "RTS"),
        (0o000137, "JMP"),
        (0o000300, "SWAB"),
        (0o006404, "MARK"),
        (0o106427, "MTPS"),
        (0o106700, "MFPS"),
        (0o100377, "BPL"),
        (0o001376, "BNE"),
        (0o001776, "BEQ"),
        (0o104000, "EMT"),
        (0o104777, "TRAP"),
    ];

    for (opcode, name) in cases {
        let instruction = LEGAL_INSTRUCTION_SET
            .lookup(opcode)
            .unwrap_or_else(|| panic!("{opcode:06o} should decode"));
        assert_eq!(instruction.name, name, "decoding {opcode:06o}");
    }
}

#[test]
fn test_reserved_instructions() {
    let reserved = [
        0o000007, // MFPT
        0o000077,
        0o000210,
        0o000230, // SPL
        0o006500, // MFPI
        0o006600, // MTPI
        0o007000,
        0o070000, // MUL
        0o071000, // DIV
        0o072000, // ASH
        0o073000, // ASHC
        0o075000, // FIS
        0o106500, // MFPD
        0o106600, // MTPD
        0o107000,
        0o170000, // FPP
        0o177777,
    ];

    for opcode in reserved {
        assert!(
            LEGAL_INSTRUCTION_SET.lookup(opcode).is_none(),
            "{opcode:06o} should be reserved"
        );
    }
}

#[test]
fn test_byte_operation_flag() {
    let clrb = LEGAL_INSTRUCTION_SET.lookup(CLRB).unwrap();
    let sub = LEGAL_INSTRUCTION_SET.lookup(SUB).unwrap();
    let swab = LEGAL_INSTRUCTION_SET.lookup(SWAB).unwrap();

    assert!(clrb.byte_operation);
    assert!(!sub.byte_operation);
    assert!(!swab.byte_operation);
    assert!(matches!(clrb.instruction, InstructionKind::StoreOp(_)));
}

//////////////////////////////////////////////////////////////////////
// CONDITION CODES
//////////////////////////////////////////////////////////////////////

#[test]
fn test_condition_code_instructions() {
    let mut cpu = cpu_with_psw(0o340);

    instruction_set::condition_code(&mut cpu, SEC);
    assert_eq!(psw(&cpu), 0o341);
    instruction_set::condition_code(&mut cpu, SEN);
    assert_eq!(psw(&cpu), 0o351);
    instruction_set::condition_code(&mut cpu, NOP);
    assert_eq!(psw(&cpu), 0o351);
    instruction_set::condition_code(&mut cpu, CLC);
    assert_eq!(psw(&cpu), 0o350);
    instruction_set::condition_code(&mut cpu, SCC);
    assert_eq!(psw(&cpu), 0o357);
    instruction_set::condition_code(&mut cpu, CCC);
    assert_eq!(psw(&cpu), 0o340);

    // combined form: SEV | SEZ
    instruction_set::condition_code(&mut cpu, 0o266);
    assert_eq!(psw(&cpu), 0o346);
}

#[test]
fn test_condition_codes_keep_trace_bit() {
    let mut cpu = cpu_with_psw(0o20);

    instruction_set::condition_code(&mut cpu, SCC);
    instruction_set::condition_code(&mut cpu, CCC);
    assert_eq!(psw(&cpu), 0o20);
}

//////////////////////////////////////////////////////////////////////
// SINGLE OPERAND
//////////////////////////////////////////////////////////////////////

#[test]
fn test_single_operand_CLR() {
    let mut cpu = cpu_with_psw(0o357);

    assert_eq!(instruction_set::clr(&mut cpu, false), 0);
    assert_eq!(psw(&cpu), 0o344);
}

#[test]
fn test_single_operand_COM() {
    let mut cpu = InternalCpu::default();

    assert_eq!(instruction_set::com(&mut cpu, false, 0o177777), 0);
    assert!(cpu.psw.get(PswFlags::Z));
    assert!(cpu.psw.get(PswFlags::C));

    assert_eq!(instruction_set::com(&mut cpu, true, 0o177400), 0o377);
    assert!(cpu.psw.get(PswFlags::N));
    assert!(!cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_single_operand_INC_DEC() {
    let mut cpu = InternalCpu::default();

    assert_eq!(instruction_set::inc(&mut cpu, false, 0o77777), 0o100000);
    assert!(cpu.psw.get(PswFlags::V));
    assert!(cpu.psw.get(PswFlags::N));

    assert_eq!(instruction_set::inc(&mut cpu, true, 0o377), 0);
    assert!(cpu.psw.get(PswFlags::Z));
    assert!(!cpu.psw.get(PswFlags::V));

    assert_eq!(instruction_set::dec(&mut cpu, true, 0o200), 0o177);
    assert!(cpu.psw.get(PswFlags::V));

    // C is left alone
    cpu.psw.set(PswFlags::C);
    assert_eq!(instruction_set::dec(&mut cpu, false, 0), 0o177777);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(!cpu.psw.get(PswFlags::V));
}

#[test]
fn test_single_operand_NEG() {
    let mut cpu = InternalCpu::default();

    assert_eq!(instruction_set::neg(&mut cpu, false, 1), 0o177777);
    assert!(cpu.psw.get(PswFlags::N));
    assert!(cpu.psw.get(PswFlags::C));

    assert_eq!(instruction_set::neg(&mut cpu, false, 0), 0);
    assert!(!cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::Z));

    assert_eq!(instruction_set::neg(&mut cpu, true, 0o200), 0o200);
    assert!(cpu.psw.get(PswFlags::V));
}

#[test]
fn test_single_operand_ADC_SBC() {
    let mut cpu = InternalCpu::default();

    cpu.psw.set(PswFlags::C);
    assert_eq!(instruction_set::adc(&mut cpu, false, 0o177777), 0);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::Z));

    assert_eq!(instruction_set::adc(&mut cpu, true, 0o177), 0o200);
    assert!(cpu.psw.get(PswFlags::V));
    assert!(!cpu.psw.get(PswFlags::C));

    cpu.psw.clear(PswFlags::CONDITION_CODES);
    assert_eq!(instruction_set::adc(&mut cpu, false, 5), 5);

    cpu.psw.set(PswFlags::C);
    assert_eq!(instruction_set::sbc(&mut cpu, false, 0), 0o177777);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::N));

    cpu.psw.set(PswFlags::C);
    assert_eq!(instruction_set::sbc(&mut cpu, false, 0o100000), 0o77777);
    assert!(cpu.psw.get(PswFlags::V));
    assert!(!cpu.psw.get(PswFlags::C));
}

#[test]
fn test_single_operand_TST() {
    let mut cpu = cpu_with_psw(0o3);

    instruction_set::tst(&mut cpu, true, 0o177600);
    assert_eq!(psw(&cpu), PswFlags::N.bits());

    instruction_set::tst(&mut cpu, false, 0);
    assert_eq!(psw(&cpu), PswFlags::Z.bits());
}

#[test]
fn test_shifts_and_rotates() {
    let mut cpu = InternalCpu::default();

    // ROR: C goes into the sign bit
    cpu.psw.set(PswFlags::C);
    assert_eq!(instruction_set::ror(&mut cpu, false, 1), 0o100000);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::N));
    assert!(!cpu.psw.get(PswFlags::V));

    assert_eq!(instruction_set::ror(&mut cpu, true, 0o2), 0o201);
    assert!(!cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::V));

    // ROL: sign bit goes into C
    cpu.psw.clear(PswFlags::C);
    assert_eq!(instruction_set::rol(&mut cpu, false, 0o100001), 0o2);
    assert!(cpu.psw.get(PswFlags::C));
    assert_eq!(instruction_set::rol(&mut cpu, true, 0o100), 0o201);
    assert!(!cpu.psw.get(PswFlags::C));

    // ASR keeps the sign
    assert_eq!(instruction_set::asr(&mut cpu, false, 0o100003), 0o140001);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(!cpu.psw.get(PswFlags::V));
    assert_eq!(instruction_set::asr(&mut cpu, true, 0o177600), 0o300);

    // ASL
    assert_eq!(instruction_set::asl(&mut cpu, false, 0o40000), 0o100000);
    assert!(!cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::V));
    assert_eq!(instruction_set::asl(&mut cpu, true, 0o200), 0);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_single_operand_SWAB() {
    let mut cpu = cpu_with_psw(0o3);

    assert_eq!(instruction_set::swab(&mut cpu, false, 0o177400), 0o377);
    assert!(cpu.psw.get(PswFlags::N));
    assert!(!cpu.psw.get(PswFlags::V));
    assert!(!cpu.psw.get(PswFlags::C));

    assert_eq!(instruction_set::swab(&mut cpu, false, 0o377), 0o177400);
    assert!(cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_single_operand_SXT() {
    let mut cpu = cpu_with_psw(0o10);

    assert_eq!(instruction_set::sxt(&mut cpu, false), 0o177777);
    assert!(!cpu.psw.get(PswFlags::Z));

    cpu.psw.clear(PswFlags::N);
    assert_eq!(instruction_set::sxt(&mut cpu, false), 0);
    assert!(cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_MTPS_keeps_trace_bit() {
    let mut cpu = cpu_with_psw(0o20);

    instruction_set::mtps(&mut cpu, true, 0o341);
    assert_eq!(psw(&cpu), 0o361);

    instruction_set::mtps(&mut cpu, true, 0o17);
    assert_eq!(psw(&cpu), 0o37);
}

//////////////////////////////////////////////////////////////////////
// DOUBLE OPERAND
//////////////////////////////////////////////////////////////////////

#[test]
fn test_double_operand_MOV() {
    let mut cpu = cpu_with_psw(0o3);

    assert_eq!(instruction_set::mov(&mut cpu, false, 0o100000), 0o100000);
    assert_eq!(psw(&cpu), 0o11);

    assert_eq!(instruction_set::mov(&mut cpu, true, 0o400), 0o400);
    assert!(cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_double_operand_CMP() {
    let mut cpu = InternalCpu::default();

    instruction_set::cmp(&mut cpu, false, 5, 5);
    assert!(cpu.psw.get(PswFlags::Z));

    instruction_set::cmp(&mut cpu, false, 1, 2);
    assert!(cpu.psw.get(PswFlags::N));
    assert!(cpu.psw.get(PswFlags::C));

    // -32768 - 1 overflows
    instruction_set::cmp(&mut cpu, false, 0o100000, 1);
    assert!(cpu.psw.get(PswFlags::V));
    assert!(!cpu.psw.get(PswFlags::C));

    instruction_set::cmp(&mut cpu, true, 0o177401, 0o1);
    assert!(cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_double_operand_bit_instructions() {
    let mut cpu = InternalCpu::default();

    instruction_set::bit(&mut cpu, false, 0o10, 0o7);
    assert!(cpu.psw.get(PswFlags::Z));

    assert_eq!(instruction_set::bic(&mut cpu, false, 0o17, 0o177777), 0o177760);
    assert!(cpu.psw.get(PswFlags::N));

    assert_eq!(instruction_set::bis(&mut cpu, false, 0o17, 0o60), 0o77);
    assert!(!cpu.psw.get(PswFlags::N));

    assert_eq!(instruction_set::xor(&mut cpu, 0o177777, 0o177777), 0);
    assert!(cpu.psw.get(PswFlags::Z));
}

#[test]
fn test_double_operand_ADD_SUB() {
    let mut cpu = InternalCpu::default();

    assert_eq!(instruction_set::add(&mut cpu, false, 0o77777, 1), 0o100000);
    assert!(cpu.psw.get(PswFlags::V));
    assert!(!cpu.psw.get(PswFlags::C));

    assert_eq!(instruction_set::add(&mut cpu, false, 0o177777, 1), 0);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::Z));
    assert!(!cpu.psw.get(PswFlags::V));

    // SUB computes dst - src
    assert_eq!(instruction_set::sub(&mut cpu, false, 1, 0), 0o177777);
    assert!(cpu.psw.get(PswFlags::C));
    assert!(cpu.psw.get(PswFlags::N));

    assert_eq!(instruction_set::sub(&mut cpu, false, 1, 0o100000), 0o77777);
    assert!(cpu.psw.get(PswFlags::V));
    assert!(!cpu.psw.get(PswFlags::C));
}

//////////////////////////////////////////////////////////////////////
// BRANCHES
//////////////////////////////////////////////////////////////////////

#[test]
fn test_branch_conditions() {
    let n = PswFlags::N.bits();
    let z = PswFlags::Z.bits();
    let v = PswFlags::V.bits();
    let c = PswFlags::C.bits();

    let cases: [(fn(&InternalCpu) -> bool, u16, bool); 20] = [
        (instruction_set::br, 0, true),
        (instruction_set::bne, z, false),
        (instruction_set::beq, z, true),
        (instruction_set::bge, n | v, true),
        (instruction_set::bge, n, false),
        (instruction_set::blt, v, true),
        (instruction_set::bgt, 0, true),
        (instruction_set::bgt, z, false),
        (instruction_set::ble, n, true),
        (instruction_set::ble, 0, false),
        (instruction_set::bpl, n, false),
        (instruction_set::bmi, n, true),
        (instruction_set::bhi, 0, true),
        (instruction_set::bhi, c, false),
        (instruction_set::blos, z, true),
        (instruction_set::bvc, v, false),
        (instruction_set::bvs, v, true),
        (instruction_set::bcc, c, false),
        (instruction_set::bcs, c, true),
        (instruction_set::bcs, 0, false),
    ];

    for (index, (branch, flags, taken)) in cases.iter().enumerate() {
        let cpu = cpu_with_psw(*flags);
        assert_eq!(branch(&cpu), *taken, "case {index}");
    }
}
