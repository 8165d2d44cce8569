use std::io;
use std::io::Write;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use crate::decoder::{decode, Op};
use crate::registers::{RegisterTable, REGISTER_COUNT, ZERO};
use crate::utils::GenericResult;


/// Start of the 32-word memory window reported in the trace dump. Addresses
/// outside the window are simulated but never reported.
pub const MEMORY_DUMP_BASE: u32 = 0x0001_0000;
pub const MEMORY_DUMP_WORDS: u32 = 32;

/// Architectural state: 32 registers, program counter, and a sparse
/// word-addressed data memory where unmapped addresses read as 0.
pub struct MachineState {
    registers: [u32; REGISTER_COUNT],
    pc: u32,
    memory: FxHashMap<u32, u32>,
}

impl MachineState {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            pc: 0,
            memory: FxHashMap::default(),
        }
    }

    pub fn read_register(&self, index: u8) -> u32 {
        self.registers[usize::from(index)]
    }

    /// Writes to the zero register are discarded.
    pub fn write_register(&mut self, index: u8, value: u32) {
        if index != ZERO {
            self.registers[usize::from(index)] = value;
        }
    }

    pub fn load_word(&self, address: u32) -> u32 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    pub fn store_word(&mut self, address: u32, value: u32) {
        self.memory.insert(address, value);
    }
}

pub enum StepOutcome {
    /// The program counter value after the step.
    Continue(u32),
    /// Termination signalled by `halt`.
    Halted,
}

/// Advances the machine state by one decoded instruction. Does not assign the
/// program counter; the driver applies the returned value.
pub fn execute(op: &Op, state: &mut MachineState) -> StepOutcome {
    use StepOutcome::*;
    let pc = state.pc;
    let next = pc.wrapping_add(4);
    match *op {
        Op::Add { rd, rs1, rs2 } => {
            let value = state.read_register(rs1).wrapping_add(state.read_register(rs2));
            state.write_register(rd, value);
            Continue(next)
        }
        Op::Sub { rd, rs1, rs2 } => {
            let value = state.read_register(rs1).wrapping_sub(state.read_register(rs2));
            state.write_register(rd, value);
            Continue(next)
        }
        Op::Slt { rd, rs1, rs2 } => {
            let less = (state.read_register(rs1) as i32) < (state.read_register(rs2) as i32);
            state.write_register(rd, u32::from(less));
            Continue(next)
        }
        Op::Srl { rd, rs1, rs2 } => {
            let value = state.read_register(rs1) >> (state.read_register(rs2) & 0x1f);
            state.write_register(rd, value);
            Continue(next)
        }
        Op::Or { rd, rs1, rs2 } => {
            let value = state.read_register(rs1) | state.read_register(rs2);
            state.write_register(rd, value);
            Continue(next)
        }
        Op::And { rd, rs1, rs2 } => {
            let value = state.read_register(rs1) & state.read_register(rs2);
            state.write_register(rd, value);
            Continue(next)
        }
        Op::Addi { rd, rs1, imm } => {
            let value = state.read_register(rs1).wrapping_add(imm as u32);
            state.write_register(rd, value);
            Continue(next)
        }
        Op::Lw { rd, rs1, imm } => {
            let address = state.read_register(rs1).wrapping_add(imm as u32);
            let value = state.load_word(address);
            state.write_register(rd, value);
            Continue(next)
        }
        Op::Jalr { rd, rs1, imm } => {
            let target = state.read_register(rs1).wrapping_add(imm as u32) & !1;
            state.write_register(rd, next);
            Continue(target)
        }
        Op::Sw { rs1, rs2, imm } => {
            let address = state.read_register(rs1).wrapping_add(imm as u32);
            state.store_word(address, state.read_register(rs2));
            Continue(next)
        }
        // The offset is a byte displacement in both branches; it is applied
        // as decoded, without further scaling.
        Op::Beq { rs1, rs2, imm } => {
            if state.read_register(rs1) == state.read_register(rs2) {
                Continue(pc.wrapping_add(imm as u32))
            } else {
                Continue(next)
            }
        }
        Op::Bne { rs1, rs2, imm } => {
            if state.read_register(rs1) != state.read_register(rs2) {
                Continue(pc.wrapping_add(imm as u32))
            } else {
                Continue(next)
            }
        }
        Op::Jal { rd, imm } => {
            state.write_register(rd, next);
            Continue(pc.wrapping_add(imm as u32))
        }
        Op::Auipc { rd, imm } => {
            state.write_register(rd, pc.wrapping_add((imm as u32) << 12));
            Continue(next)
        }
        Op::Rst => {
            state.registers = [0; REGISTER_COUNT];
            Continue(next)
        }
        Op::Halt => Halted,
        Op::Unknown => Continue(next),
    }
}

/// One entry of the execution trace: the program counter after the step and
/// all 32 register values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: u32,
    pub registers: [u32; REGISTER_COUNT],
}

pub struct Simulation {
    pub trace: Vec<Snapshot>,
    state: MachineState,
}

pub enum DumpState<'a> {
    None,
    Instructions(&'a mut StandardStream),
}

/// Fetch-execute driver. The program counter and the list index coincide only
/// while execution is strictly sequential; after each step the index moves by
/// the byte pc delta divided by 4, and a delta of 0 still advances it by one,
/// which is how the trailing self-referential branch steps off the end of the
/// program.
pub fn run(lines: &[impl AsRef<str>], mut dump_state: DumpState<'_>) -> GenericResult<Simulation> {
    let registers = RegisterTable::new();
    let mut state = MachineState::new();
    let mut trace = Vec::new();
    let mut index = 0i64;
    while index >= 0 && (index as usize) < lines.len() {
        let line = lines[index as usize].as_ref();
        let op = match rvbits::from_bit_string(line) {
            Ok(word) => decode(word),
            Err(error) => {
                // A corrupt line must not abort the run; it degrades to a no-op.
                warning!("instruction {}: {}", index + 1, error);
                Op::Unknown
            }
        };

        if let DumpState::Instructions(output) = &mut dump_state {
            output.set_color(ColorSpec::new().set_fg(Some(Color::White)).set_bold(true))?;
            write!(output, "[0x{:08x}]", state.pc)?;
            output.reset()?;
            writeln!(output, " {}", op.disassemble(&registers))?;
        }

        let pc = state.pc;
        let (post_pc, halted) = match execute(&op, &mut state) {
            StepOutcome::Continue(next) => (next, false),
            StepOutcome::Halted => (pc.wrapping_add(4), true),
        };
        state.pc = post_pc;
        trace.push(Snapshot {
            pc: post_pc,
            registers: state.registers,
        });
        if halted {
            break;
        }

        let delta = i64::from(post_pc) - i64::from(pc);
        index += if delta == 0 { 1 } else { delta / 4 };
    }
    Ok(Simulation { trace, state })
}

impl Simulation {
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Binary-literal trace: per step the post-step pc and all registers as
    /// `0b`-prefixed 32-bit words, then the fixed memory window.
    pub fn write_binary<W: Write>(&self, output: &mut W) -> io::Result<()> {
        for snapshot in &self.trace {
            writeln!(
                output,
                "0b{:032b} {}",
                snapshot.pc,
                snapshot
                    .registers
                    .iter()
                    .map(|value| format!("0b{:032b}", value))
                    .join(" ")
            )?;
        }
        for address in memory_window() {
            writeln!(output, "0x{:08X}:0b{:032b}", address, self.state.load_word(address))?;
        }
        Ok(())
    }

    /// Same structure as `write_binary`, values as unsigned decimal integers.
    pub fn write_decimal<W: Write>(&self, output: &mut W) -> io::Result<()> {
        for snapshot in &self.trace {
            writeln!(
                output,
                "{} {}",
                snapshot.pc,
                snapshot.registers.iter().map(|value| value.to_string()).join(" ")
            )?;
        }
        for address in memory_window() {
            writeln!(output, "0x{:08X}:{}", address, self.state.load_word(address))?;
        }
        Ok(())
    }
}

fn memory_window() -> impl Iterator<Item = u32> {
    (0..MEMORY_DUMP_WORDS).map(|index| MEMORY_DUMP_BASE + index * 4)
}
