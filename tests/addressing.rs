use bk_emulator::opcodes::*;
use bk_emulator::{
    BusError, Computer, Cpu, CpuState, Device, PswFlags, Ram, Rom, Sel1Register,
};

const START: u16 = 0o100000;
const STACK: u16 = 0o1000;
const RAM_SIZE: usize = 0o40000;
const UNMAPPED: u16 = 0o160000;

// handler for vector V lives at HANDLERS + 4 * V, zeroed RAM makes it a HALT
const HANDLERS: u16 = 0o2000;

fn handler(vector: u16) -> u16 {
    HANDLERS + 4 * vector
}

fn test_computer(program: &[u16]) -> Computer {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut computer = Computer::new();
    computer.add_memory(Ram::new(0, RAM_SIZE)).unwrap();
    computer.add_device(Sel1Register::new(START)).unwrap();
    computer.add_memory(Rom::from_words(START, program)).unwrap();

    for vector in [0o4, 0o10, 0o14, 0o20, 0o30, 0o34, 0o100] {
        computer.write_memory(false, vector, handler(vector)).unwrap();
        computer.write_memory(false, vector + 2, 0o340).unwrap();
    }

    computer.reset();
    computer.cpu_mut().write_register(false, Cpu::SP, STACK);
    computer
}

fn register(computer: &Computer, register: usize) -> u16 {
    computer.cpu().read_register(false, register)
}

fn word(computer: &mut Computer, address: u16) -> u16 {
    computer.read_memory(false, address).unwrap()
}

//////////////////////////////////////////////////////////////////////
// AUTOINCREMENT / AUTODECREMENT
//////////////////////////////////////////////////////////////////////

#[test]
fn test_byte_autoincrement_quantum() {
    let mut computer = test_computer(&[CLRB | 0o20, CLRB | 0o26]);
    computer.cpu_mut().write_register(false, Cpu::R0, 0o1000);

    // CLRB (R0)+
    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::R0), 0o1001);

    // CLRB (SP)+, the stack pointer always moves by words
    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::SP), 0o1002);
}

#[test]
fn test_autoincrement_not_applied_on_bus_error() {
    // MOV (R0)+, R1
    let mut computer = test_computer(&[MOV | 0o2001]);
    computer.cpu_mut().write_register(false, Cpu::R0, UNMAPPED);
    computer.cpu_mut().write_register(false, Cpu::R1, 0o7);

    computer.execute_single_instruction();

    assert_eq!(register(&computer, Cpu::R0), UNMAPPED);
    assert_eq!(register(&computer, Cpu::R1), 0o7);
    assert_eq!(register(&computer, Cpu::PC), handler(0o4));
}

#[test]
fn test_autodecrement_kept_on_bus_error() {
    // CLR -(R0)
    let mut computer = test_computer(&[CLR | 0o40]);
    computer.cpu_mut().write_register(false, Cpu::R0, UNMAPPED + 2);

    computer.execute_single_instruction();

    assert_eq!(register(&computer, Cpu::R0), UNMAPPED);
    assert_eq!(register(&computer, Cpu::PC), handler(0o4));
}

//////////////////////////////////////////////////////////////////////
// TRAPS
//////////////////////////////////////////////////////////////////////

#[test]
fn test_trap_instructions_enter_their_vectors() {
    let cases = [
        (BPT, 0o14),
        (IOT, 0o20),
        (EMT | 0o12, 0o30),
        (TRAP | 0o377, 0o34),
        (0o075040, 0o10), // FADD, not on this processor
    ];

    for (opcode, vector) in cases {
        let mut computer = test_computer(&[SEC, opcode]);
        computer.execute_single_instruction();
        computer.execute_single_instruction();

        assert_eq!(register(&computer, Cpu::PC), handler(vector), "{opcode:06o}");
        assert_eq!(register(&computer, Cpu::SP), STACK - 4, "{opcode:06o}");
        assert_eq!(word(&mut computer, STACK - 2), 0o341, "{opcode:06o}");
        assert_eq!(word(&mut computer, STACK - 4), START + 4, "{opcode:06o}");
        assert_eq!(computer.cpu().psw(), 0o340, "{opcode:06o}");

        // the handler is a HALT
        computer.execute_single_instruction();
        assert!(computer.cpu().is_halted(), "{opcode:06o}");
    }
}

#[test]
fn test_jump_to_odd_address_is_bus_error() {
    // JMP @#100001
    let mut computer = test_computer(&[JMP | 0o37, START + 1]);

    computer.execute_single_instruction();

    assert_eq!(register(&computer, Cpu::PC), handler(0o4));
    assert_eq!(word(&mut computer, STACK - 4), START + 4);
}

#[test]
fn test_trap_without_stack_halts() {
    let mut computer = test_computer(&[IOT]);
    computer.cpu_mut().write_register(false, Cpu::SP, UNMAPPED);

    computer.execute_single_instruction();

    assert_eq!(computer.cpu().state(), CpuState::Halted);
}

#[test]
fn test_rti_returns_from_trap() {
    let mut computer = test_computer(&[EMT, INC, HALT]);
    // handler: SEC, RTI
    computer.write_memory(false, handler(0o30), SEC).unwrap();
    computer.write_memory(false, handler(0o30) + 2, RTI).unwrap();

    computer.run(10);

    assert!(computer.cpu().is_halted());
    assert_eq!(register(&computer, Cpu::PC), START + 6);
    assert_eq!(register(&computer, Cpu::SP), STACK);
    // PSW came back from the stack, INC R0 ran after the return
    assert!(!computer.cpu().is_psw_flag_set(PswFlags::C));
    assert_eq!(register(&computer, Cpu::R0), 1);
}

//////////////////////////////////////////////////////////////////////
// SUBROUTINES AND LOOPS
//////////////////////////////////////////////////////////////////////

#[test]
fn test_jsr_rts() {
    let mut computer = test_computer(&[
        JSR | 0o737, // JSR PC, @#100010
        START + 0o10,
        HALT,
        NOP,
        INC,         // INC R0
        RTS | 0o7,   // RTS PC
    ]);

    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::PC), START + 0o10);
    assert_eq!(register(&computer, Cpu::SP), STACK - 2);
    assert_eq!(word(&mut computer, STACK - 2), START + 4);

    computer.run(10);
    assert!(computer.cpu().is_halted());
    assert_eq!(register(&computer, Cpu::R0), 1);
    assert_eq!(register(&computer, Cpu::SP), STACK);
    assert_eq!(register(&computer, Cpu::PC), START + 6);
}

#[test]
fn test_jsr_with_linkage_register() {
    let mut computer = test_computer(&[
        JSR | 0o537, // JSR R5, @#100010
        START + 0o10,
        HALT,
        NOP,
        RTS | 0o5,   // RTS R5
    ]);
    computer.cpu_mut().write_register(false, Cpu::R5, 0o123);

    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::R5), START + 4);
    assert_eq!(word(&mut computer, STACK - 2), 0o123);

    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::PC), START + 4);
    assert_eq!(register(&computer, Cpu::R5), 0o123);
    assert_eq!(register(&computer, Cpu::SP), STACK);
}

#[test]
fn test_mark_returns_and_drops_parameters() {
    let mut computer = test_computer(&[
        MOV | 0o0546,   // MOV R5, -(SP)
        MOV | 0o2746,   // MOV #11, -(SP)
        0o11,
        MOV | 0o2746,   // MOV #22, -(SP)
        0o22,
        MOV | 0o2746,   // MOV #MARK 2, -(SP)
        MARK | 0o2,
        MOV | 0o0605,   // MOV SP, R5
        JSR | 0o767,    // JSR PC, SUB
        0o2,
        HALT,
        MOV | 0o6500,   // SUB: MOV 4(R5), R0
        0o4,
        RTS | 0o5,      // RTS R5
    ]);
    computer.cpu_mut().write_register(false, Cpu::R5, 0o4444);

    // up to the RTS R5 that jumps to the MARK on the stack
    computer.run(8);
    assert_eq!(register(&computer, Cpu::R0), 0o11);
    assert_eq!(register(&computer, Cpu::PC), STACK - 0o10);
    assert_eq!(register(&computer, Cpu::R5), START + 0o24);
    assert_eq!(register(&computer, Cpu::SP), STACK - 0o10);

    // MARK 2: SP past the parameters, PC from R5, R5 restored
    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::PC), START + 0o24);
    assert_eq!(register(&computer, Cpu::R5), 0o4444);
    assert_eq!(register(&computer, Cpu::SP), STACK);

    computer.execute_single_instruction();
    assert!(computer.cpu().is_halted());
}

#[test]
fn test_jmp_autoincrement_deferred() {
    // JMP @(R0)+ through a jump table in RAM
    let mut computer = test_computer(&[JMP | 0o130, HALT, INC | 0o2, HALT]);
    computer.write_memory(false, 0o3000, START + 4).unwrap();
    computer.cpu_mut().write_register(false, Cpu::R0, 0o3000);

    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::PC), START + 4);
    assert_eq!(register(&computer, Cpu::R0), 0o3002);

    computer.run(10);
    assert!(computer.cpu().is_halted());
    assert_eq!(register(&computer, Cpu::R2), 1);
}

#[test]
fn test_jmp_indexed() {
    let mut computer = test_computer(&[
        JMP | 0o161, // JMP 4(R1)
        0o4,
        HALT,
        INC | 0o2,   // INC R2
        HALT,
    ]);
    computer.cpu_mut().write_register(false, Cpu::R1, START + 2);

    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::PC), START + 6);
    assert_eq!(register(&computer, Cpu::R1), START + 2);

    computer.run(10);
    assert_eq!(register(&computer, Cpu::R2), 1);
    assert_eq!(register(&computer, Cpu::PC), START + 0o12);
}

#[test]
fn test_sob_loop_sum() {
    let mut computer = test_computer(&[
        MOV | 0o2701, // MOV #10., R1
        0o12,
        CLR,          // CLR R0
        ADD | 0o0100, // ADD R1, R0
        SOB | 0o102,  // SOB R1, .-2
        HALT,
    ]);

    let executed = computer.run(100);

    assert!(computer.cpu().is_halted());
    assert_eq!(executed, 2 + 2 * 10 + 1);
    assert_eq!(register(&computer, Cpu::R0), 55);
    assert_eq!(register(&computer, Cpu::R1), 0);
}

#[test]
fn test_branch_backwards_until_zero() {
    let mut computer = test_computer(&[
        DEC,         // DEC R0
        BNE | 0o376, // BNE .-2
        HALT,
    ]);
    computer.cpu_mut().write_register(false, Cpu::R0, 3);

    computer.run(100);

    assert_eq!(register(&computer, Cpu::R0), 0);
    assert!(computer.cpu().is_psw_flag_set(PswFlags::Z));
    assert_eq!(register(&computer, Cpu::PC), START + 6);
}

//////////////////////////////////////////////////////////////////////
// BYTE MOVES
//////////////////////////////////////////////////////////////////////

#[test]
fn test_movb_sign_extends_into_register() {
    let mut computer = test_computer(&[
        MOVB | 0o2701, // MOVB #200, R1
        0o200,
        MOVB | 0o0137, // MOVB R1, @#2000
        0o2000,
    ]);
    computer.write_memory(false, 0o2000, 0o52525).unwrap();

    computer.execute_single_instruction();
    assert_eq!(register(&computer, Cpu::R1), 0o177600);
    assert!(computer.cpu().is_psw_flag_set(PswFlags::N));

    computer.execute_single_instruction();
    assert_eq!(word(&mut computer, 0o2000), 0o52600);
}

#[test]
fn test_mfps_to_register_sign_extends() {
    // SEN, MFPS R2
    let mut computer = test_computer(&[SEN, MFPS | 0o02]);
    computer.cpu_mut().write_register(false, Cpu::R2, 0o1234);

    computer.execute_single_instruction();
    computer.execute_single_instruction();

    assert_eq!(register(&computer, Cpu::R2), 0o177750);
}

//////////////////////////////////////////////////////////////////////
// INTERRUPTS
//////////////////////////////////////////////////////////////////////

const TIMER_REGISTER: u16 = 0o177660;
const TIMER_VECTOR: u16 = 0o100;

/// Requests a single interrupt once armed by a register write
struct OneShotTimer {
    addresses: [u16; 1],
    requested: bool,
}

impl OneShotTimer {
    fn new() -> Self {
        Self {
            addresses: [TIMER_REGISTER],
            requested: false,
        }
    }
}

impl Device for OneShotTimer {
    fn id(&self) -> &'static str {
        "TIMER"
    }

    fn addresses(&self) -> &[u16] {
        &self.addresses
    }

    fn reset(&mut self) {
        self.requested = false;
    }

    fn read(&mut self, _address: u16) -> Result<u16, BusError> {
        Ok(self.requested as u16)
    }

    fn write(&mut self, _byte_mode: bool, _address: u16, value: u16) -> Result<(), BusError> {
        self.requested = value != 0;
        Ok(())
    }

    fn interrupt_vector(&self) -> Option<u16> {
        Some(TIMER_VECTOR)
    }

    fn is_interrupt_requested(&self) -> bool {
        self.requested
    }

    fn acknowledge_interrupt(&mut self) {
        self.requested = false;
    }
}

#[test]
fn test_wait_for_device_interrupt() {
    let mut computer = test_computer(&[
        MTPS | 0o27, // MTPS #0
        0,
        WAIT,
        HALT,
    ]);
    computer.add_device(OneShotTimer::new()).unwrap();
    // handler: INC R2, RTI
    computer.write_memory(false, handler(TIMER_VECTOR), INC | 0o2).unwrap();
    computer.write_memory(false, handler(TIMER_VECTOR) + 2, RTI).unwrap();

    computer.run(10);
    assert_eq!(computer.cpu().state(), CpuState::Waiting);
    assert_eq!(register(&computer, Cpu::PC), START + 6);

    computer.write_memory(false, TIMER_REGISTER, 1).unwrap();
    computer.run(10);

    assert!(computer.cpu().is_halted());
    assert_eq!(register(&computer, Cpu::R2), 1);
    assert_eq!(register(&computer, Cpu::PC), START + 8);
    assert_eq!(computer.read_memory(false, TIMER_REGISTER), Ok(0));
}

#[test]
fn test_interrupt_masked_by_priority() {
    let mut computer = test_computer(&[NOP, NOP, HALT]);
    computer.add_device(OneShotTimer::new()).unwrap();
    computer.write_memory(false, TIMER_REGISTER, 1).unwrap();

    computer.run(10);

    assert_eq!(register(&computer, Cpu::PC), START + 6);
    assert_eq!(register(&computer, Cpu::SP), STACK);
    assert_eq!(computer.read_memory(false, TIMER_REGISTER), Ok(1));
}
