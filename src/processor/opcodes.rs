//! Octal opcode constants of the K1801VM1 instruction set.
//!
//! Operand carrying opcodes are the base value with every operand field
//! zeroed: `CLR | 0o10` is `CLR (R0)`, `MOV | 0o2701` is `MOV #n, R1`.

/// Bit 15 turns a single or double operand word instruction into its byte
/// variant
pub const BYTE_OPERATION_FLAG: u16 = 0o100000;

// Control
pub const HALT: u16 = 0o000000;
pub const WAIT: u16 = 0o000001;
pub const RTI: u16 = 0o000002;
pub const BPT: u16 = 0o000003;
pub const IOT: u16 = 0o000004;
pub const RESET: u16 = 0o000005;
pub const RTT: u16 = 0o000006;

// Condition codes
pub const NOP: u16 = 0o000240;
pub const CLC: u16 = 0o000241;
pub const CLV: u16 = 0o000242;
pub const CLZ: u16 = 0o000244;
pub const CLN: u16 = 0o000250;
pub const CCC: u16 = 0o000257;
pub const SEC: u16 = 0o000261;
pub const SEV: u16 = 0o000262;
pub const SEZ: u16 = 0o000264;
pub const SEN: u16 = 0o000270;
pub const SCC: u16 = 0o000277;

// Jumps and subroutines
pub const JMP: u16 = 0o000100;
pub const RTS: u16 = 0o000200;
pub const JSR: u16 = 0o004000;
pub const MARK: u16 = 0o006400;
pub const SOB: u16 = 0o077000;

// Single operand
pub const SWAB: u16 = 0o000300;
pub const CLR: u16 = 0o005000;
pub const COM: u16 = 0o005100;
pub const INC: u16 = 0o005200;
pub const DEC: u16 = 0o005300;
pub const NEG: u16 = 0o005400;
pub const ADC: u16 = 0o005500;
pub const SBC: u16 = 0o005600;
pub const TST: u16 = 0o005700;
pub const ROR: u16 = 0o006000;
pub const ROL: u16 = 0o006100;
pub const ASR: u16 = 0o006200;
pub const ASL: u16 = 0o006300;
pub const SXT: u16 = 0o006700;
pub const MTPS: u16 = 0o106400;
pub const MFPS: u16 = 0o106700;

pub const CLRB: u16 = CLR | BYTE_OPERATION_FLAG;
pub const COMB: u16 = COM | BYTE_OPERATION_FLAG;
pub const INCB: u16 = INC | BYTE_OPERATION_FLAG;
pub const DECB: u16 = DEC | BYTE_OPERATION_FLAG;
pub const NEGB: u16 = NEG | BYTE_OPERATION_FLAG;
pub const ADCB: u16 = ADC | BYTE_OPERATION_FLAG;
pub const SBCB: u16 = SBC | BYTE_OPERATION_FLAG;
pub const TSTB: u16 = TST | BYTE_OPERATION_FLAG;
pub const RORB: u16 = ROR | BYTE_OPERATION_FLAG;
pub const ROLB: u16 = ROL | BYTE_OPERATION_FLAG;
pub const ASRB: u16 = ASR | BYTE_OPERATION_FLAG;
pub const ASLB: u16 = ASL | BYTE_OPERATION_FLAG;

// Double operand
pub const MOV: u16 = 0o010000;
pub const CMP: u16 = 0o020000;
pub const BIT: u16 = 0o030000;
pub const BIC: u16 = 0o040000;
pub const BIS: u16 = 0o050000;
pub const ADD: u16 = 0o060000;
pub const XOR: u16 = 0o074000;
pub const SUB: u16 = 0o160000;

pub const MOVB: u16 = MOV | BYTE_OPERATION_FLAG;
pub const CMPB: u16 = CMP | BYTE_OPERATION_FLAG;
pub const BITB: u16 = BIT | BYTE_OPERATION_FLAG;
pub const BICB: u16 = BIC | BYTE_OPERATION_FLAG;
pub const BISB: u16 = BIS | BYTE_OPERATION_FLAG;

// Branches
pub const BR: u16 = 0o000400;
pub const BNE: u16 = 0o001000;
pub const BEQ: u16 = 0o001400;
pub const BGE: u16 = 0o002000;
pub const BLT: u16 = 0o002400;
pub const BGT: u16 = 0o003000;
pub const BLE: u16 = 0o003400;
pub const BPL: u16 = 0o100000;
pub const BMI: u16 = 0o100400;
pub const BHI: u16 = 0o101000;
pub const BLOS: u16 = 0o101400;
pub const BVC: u16 = 0o102000;
pub const BVS: u16 = 0o102400;
pub const BCC: u16 = 0o103000;
pub const BCS: u16 = 0o103400;

// Traps
pub const EMT: u16 = 0o104000;
pub const TRAP: u16 = 0o104400;
