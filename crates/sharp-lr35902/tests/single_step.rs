//! Single-instruction vectors from `tests/data/instructions.json`.
//!
//! Each case loads registers and RAM, runs one instruction through the
//! fetch/decode/execute path, and compares the full register file plus the
//! listed RAM bytes.

use emu_core::{Bus, SimpleBus};
use serde::Deserialize;
use sharp_lr35902::{Lr35902, Registers, opcodes};
use std::fs;

#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    extra: u8,
}

#[derive(Deserialize)]
struct CpuState {
    a: u8,
    f: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    h: u8,
    l: u8,
    sp: u16,
    pc: u16,
    ram: Vec<(u16, u8)>,
}

impl CpuState {
    fn registers(&self) -> Registers {
        Registers {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
        }
    }
}

/// Fetch one instruction, gather its operand little-endian, execute it.
fn step(cpu: &mut Lr35902, bus: &mut impl Bus) -> u8 {
    let opcode = cpu.fetch(bus);
    let desc = opcodes::lookup(opcode).expect("opcode in table");
    let mut operand = 0u16;
    for i in 0..desc.operand_len {
        operand |= u16::from(cpu.fetch(bus)) << (8 * i);
    }
    cpu.execute(bus, opcode, operand).expect("implemented opcode")
}

#[test]
fn instruction_vectors() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/instructions.json");
    let data = fs::read_to_string(path).expect("read vectors");
    let cases: Vec<TestCase> = serde_json::from_str(&data).expect("parse vectors");
    assert!(!cases.is_empty());

    for case in &cases {
        let mut bus = SimpleBus::new();
        for &(addr, value) in &case.initial.ram {
            bus.load(addr, &[value]);
        }
        let mut cpu = Lr35902::with_registers(case.initial.registers());

        let extra = step(&mut cpu, &mut bus);

        assert_eq!(cpu.regs, case.final_state.registers(), "{}: registers", case.name);
        assert_eq!(extra, case.extra, "{}: extra cycles", case.name);
        for &(addr, value) in &case.final_state.ram {
            assert_eq!(bus.peek(addr), value, "{}: ram ${addr:04X}", case.name);
        }
    }
}
