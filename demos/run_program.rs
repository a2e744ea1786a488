//! Sum 10..1 on an emulated BK-0010 and print the registers.
//!
//! Run with `RUST_LOG=debug cargo run --example run_program` to follow the
//! processor.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use bk_emulator::opcodes::*;
use bk_emulator::{Computer, ComputerSettings, Cpu, Ram, Runner, Sel1Register};

const START: u16 = 0o1000;

const PROGRAM: [u16; 6] = [
    MOV | 0o2701, // MOV #10., R1
    0o12,
    CLR,          // CLR R0
    ADD | 0o0100, // ADD R1, R0
    SOB | 0o102,  // SOB R1, .-2
    HALT,
];

fn main() -> Result<()> {
    env_logger::init();

    let mut words = vec![0; 0o40000 / 2];
    let offset = START as usize / 2;
    words[offset..offset + PROGRAM.len()].copy_from_slice(&PROGRAM);

    let mut computer = Computer::new();
    computer.add_memory(Ram::from_words(0, &words))?;
    computer.add_device(Sel1Register::new(START))?;
    computer.reset();
    computer.cpu_mut().write_register(false, Cpu::SP, START);

    let runner = Runner::start(computer, ComputerSettings::default())?;
    let mut halted = false;
    for _ in 0..100 {
        halted = runner.with_computer(|computer| computer.cpu().is_halted())?;
        if halted {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    let computer = runner.stop()?;

    if !halted {
        bail!("program didn't halt");
    }

    let state = computer.state();
    for (register, value) in state.registers.iter().enumerate() {
        println!("R{register}: {value:06o}");
    }
    println!("PSW: {:06o}", state.psw);
    Ok(())
}
