use rvbits::opcode;

use crate::registers::RegisterTable;

#[cfg(test)]
mod tests;

/// A decoded instruction. `Unknown` covers every word the dispatch cannot
/// place; it executes as a no-op rather than aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add { rd: u8, rs1: u8, rs2: u8 },
    Sub { rd: u8, rs1: u8, rs2: u8 },
    Slt { rd: u8, rs1: u8, rs2: u8 },
    Srl { rd: u8, rs1: u8, rs2: u8 },
    Or { rd: u8, rs1: u8, rs2: u8 },
    And { rd: u8, rs1: u8, rs2: u8 },
    Addi { rd: u8, rs1: u8, imm: i32 },
    Lw { rd: u8, rs1: u8, imm: i32 },
    Jalr { rd: u8, rs1: u8, imm: i32 },
    Sw { rs1: u8, rs2: u8, imm: i32 },
    Beq { rs1: u8, rs2: u8, imm: i32 },
    Bne { rs1: u8, rs2: u8, imm: i32 },
    Jal { rd: u8, imm: i32 },
    Auipc { rd: u8, imm: i32 },
    Rst,
    Halt,
    Unknown,
}

/// Recovers the format, operand fields and mnemonic from an instruction word,
/// dispatching on the low 7 opcode bits.
pub fn decode(word: u32) -> Op {
    let rd = rvbits::rd(word);
    let rs1 = rvbits::rs1(word);
    let rs2 = rvbits::rs2(word);
    match rvbits::opcode(word) {
        opcode::OP => match (rvbits::funct7(word), rvbits::funct3(word)) {
            (0b0000000, 0b000) => Op::Add { rd, rs1, rs2 },
            (0b0100000, 0b000) => Op::Sub { rd, rs1, rs2 },
            (0b0000000, 0b010) => Op::Slt { rd, rs1, rs2 },
            (0b0000000, 0b101) => Op::Srl { rd, rs1, rs2 },
            (0b0000000, 0b110) => Op::Or { rd, rs1, rs2 },
            (0b0000000, 0b111) => Op::And { rd, rs1, rs2 },
            _ => Op::Unknown,
        },
        opcode::OP_IMM | opcode::LOAD | opcode::JALR => {
            let imm = rvbits::i_immediate(word);
            match (rvbits::opcode(word), rvbits::funct3(word)) {
                (opcode::OP_IMM, 0b000) => Op::Addi { rd, rs1, imm },
                (opcode::LOAD, 0b010) => Op::Lw { rd, rs1, imm },
                (opcode::JALR, 0b000) => Op::Jalr { rd, rs1, imm },
                _ => Op::Unknown,
            }
        }
        opcode::STORE => match rvbits::funct3(word) {
            0b010 => Op::Sw {
                rs1,
                rs2,
                imm: rvbits::s_immediate(word),
            },
            _ => Op::Unknown,
        },
        opcode::BRANCH => {
            let imm = rvbits::b_immediate(word);
            match rvbits::funct3(word) {
                0b000 => Op::Beq { rs1, rs2, imm },
                0b001 => Op::Bne { rs1, rs2, imm },
                _ => Op::Unknown,
            }
        }
        opcode::JAL => Op::Jal {
            rd,
            imm: rvbits::j_immediate(word),
        },
        opcode::AUIPC => Op::Auipc {
            rd,
            imm: rvbits::u_immediate(word),
        },
        opcode::SYSTEM => match rvbits::funct3(word) {
            0b001 => Op::Rst,
            0b010 => Op::Halt,
            _ => Op::Unknown,
        },
        _ => Op::Unknown,
    }
}

impl Op {
    /// Renders the instruction in assembly syntax with ABI register names.
    pub fn disassemble(&self, registers: &RegisterTable) -> String {
        let name = |index: u8| registers.name(index).unwrap_or("?");
        match *self {
            Op::Add { rd, rs1, rs2 } => format!("add {}, {}, {}", name(rd), name(rs1), name(rs2)),
            Op::Sub { rd, rs1, rs2 } => format!("sub {}, {}, {}", name(rd), name(rs1), name(rs2)),
            Op::Slt { rd, rs1, rs2 } => format!("slt {}, {}, {}", name(rd), name(rs1), name(rs2)),
            Op::Srl { rd, rs1, rs2 } => format!("srl {}, {}, {}", name(rd), name(rs1), name(rs2)),
            Op::Or { rd, rs1, rs2 } => format!("or {}, {}, {}", name(rd), name(rs1), name(rs2)),
            Op::And { rd, rs1, rs2 } => format!("and {}, {}, {}", name(rd), name(rs1), name(rs2)),
            Op::Addi { rd, rs1, imm } => format!("addi {}, {}, {}", name(rd), name(rs1), imm),
            Op::Lw { rd, rs1, imm } => format!("lw {}, {}({})", name(rd), imm, name(rs1)),
            Op::Jalr { rd, rs1, imm } => format!("jalr {}, {}, {}", name(rd), name(rs1), imm),
            Op::Sw { rs1, rs2, imm } => format!("sw {}, {}({})", name(rs2), imm, name(rs1)),
            Op::Beq { rs1, rs2, imm } => format!("beq {}, {}, {}", name(rs1), name(rs2), imm),
            Op::Bne { rs1, rs2, imm } => format!("bne {}, {}, {}", name(rs1), name(rs2), imm),
            Op::Jal { rd, imm } => format!("jal {}, {}", name(rd), imm),
            Op::Auipc { rd, imm } => format!("auipc {}, {}", name(rd), imm),
            Op::Rst => "rst".to_string(),
            Op::Halt => "halt".to_string(),
            Op::Unknown => "unknown".to_string(),
        }
    }
}
