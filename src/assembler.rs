use std::error::Error;
use std::fmt;

use rustc_hash::FxHashMap;
use rvbits::FieldError;
use smallvec::SmallVec;

use crate::catalog::{Catalog, Descriptor, Format};
use crate::decoder::{decode, Op};
use crate::registers::RegisterTable;

#[cfg(test)]
mod tests;

/// Label name → byte address of the labelled instruction.
pub type LabelTable = FxHashMap<String, u32>;

#[derive(Debug, PartialEq, Eq)]
pub enum AssemblyError {
    BadLabel { line: usize, label: String },
    DuplicateLabel { line: usize, label: String },
    UnknownMnemonic { line: usize, mnemonic: String },
    UnknownRegister { line: usize, name: String },
    BadOperands { line: usize, mnemonic: String, expected: &'static str },
    BadImmediate { line: usize, token: String },
    ImmediateOutOfRange { line: usize, value: i64, width: u32 },
    OddOffset { line: usize, value: i64 },
    Field { line: usize, error: FieldError },
    MissingTerminator,
    MisplacedTerminator,
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::BadLabel { line, label } => {
                write!(f, "line {}: label `{}' must start with a letter", line, label)
            }
            AssemblyError::DuplicateLabel { line, label } => {
                write!(f, "line {}: duplicate label `{}'", line, label)
            }
            AssemblyError::UnknownMnemonic { line, mnemonic } => {
                write!(f, "line {}: unknown instruction `{}'", line, mnemonic)
            }
            AssemblyError::UnknownRegister { line, name } => {
                write!(f, "line {}: unknown register `{}'", line, name)
            }
            AssemblyError::BadOperands { line, mnemonic, expected } => {
                write!(f, "line {}: `{}' expects {}", line, mnemonic, expected)
            }
            AssemblyError::BadImmediate { line, token } => {
                write!(f, "line {}: invalid immediate or label `{}'", line, token)
            }
            AssemblyError::ImmediateOutOfRange { line, value, width } => {
                write!(
                    f,
                    "line {}: immediate {} is out of range for {} bits",
                    line, value, width
                )
            }
            AssemblyError::OddOffset { line, value } => {
                write!(f, "line {}: offset {} must be even", line, value)
            }
            AssemblyError::Field { line, error } => write!(f, "line {}: {}", line, error),
            AssemblyError::MissingTerminator => {
                write!(f, "missing terminating instruction (beq zero, zero, 0 or halt)")
            }
            AssemblyError::MisplacedTerminator => {
                write!(f, "terminating instruction (beq zero, zero, 0 or halt) must be last")
            }
        }
    }
}

impl Error for AssemblyError {}

pub struct Assembler {
    catalog: Catalog,
    registers: RegisterTable,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            registers: RegisterTable::new(),
        }
    }

    /// Translates assembly source into encoded instruction words. Fails fast
    /// on the first error, and enforces that the program ends with a
    /// terminator (`beq zero, zero, 0` or `halt`).
    pub fn assemble(&self, source: &str) -> Result<Vec<u32>, AssemblyError> {
        let (labels, lines) = resolve_labels(source)?;
        let mut program = Vec::with_capacity(lines.len());
        let mut has_terminator = false;
        let mut last_is_terminator = false;
        for (index, (line_number, text)) in lines.iter().enumerate() {
            let pc = (index * 4) as u32;
            let word = self.encode_line(*line_number, text, &labels, pc)?;
            last_is_terminator = is_terminator(word);
            has_terminator |= last_is_terminator;
            program.push(word);
        }
        if !has_terminator {
            return Err(AssemblyError::MissingTerminator);
        }
        if !last_is_terminator {
            return Err(AssemblyError::MisplacedTerminator);
        }
        Ok(program)
    }

    fn encode_line(
        &self,
        line: usize,
        text: &str,
        labels: &LabelTable,
        pc: u32,
    ) -> Result<u32, AssemblyError> {
        let tokens: SmallVec<[&str; 4]> = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .collect();
        let mnemonic = tokens.first().copied().unwrap_or(text);
        let descriptor =
            self.catalog
                .get(mnemonic)
                .ok_or_else(|| AssemblyError::UnknownMnemonic {
                    line,
                    mnemonic: mnemonic.to_string(),
                })?;
        match descriptor.format {
            Format::R => self.encode_r(line, descriptor, &tokens),
            Format::I => self.encode_i(line, descriptor, &tokens),
            Format::S => self.encode_s(line, descriptor, &tokens),
            Format::B => self.encode_b(line, descriptor, &tokens, labels, pc),
            Format::J => self.encode_j(line, descriptor, &tokens, labels, pc),
            Format::U => self.encode_u(line, descriptor, &tokens),
            Format::NoOperand => self.encode_no_operand(line, descriptor, &tokens),
        }
    }

    fn encode_r(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
    ) -> Result<u32, AssemblyError> {
        let [_, rd, rs1, rs2] = expect_operands(line, descriptor, tokens, "rd, rs1, rs2")?;
        let rd = self.register(line, rd)?;
        let rs1 = self.register(line, rs1)?;
        let rs2 = self.register(line, rs2)?;
        pack(
            line,
            rvbits::r_instruction(
                descriptor.opcode,
                rd,
                descriptor.funct3.unwrap_or(0),
                rs1,
                rs2,
                descriptor.funct7.unwrap_or(0),
            ),
        )
    }

    fn encode_i(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
    ) -> Result<u32, AssemblyError> {
        // Memory syntax `op rd, imm(rs1)` for loads, `op rd, rs1, imm` otherwise.
        let (rd, rs1, imm) = if descriptor.opcode == rvbits::opcode::LOAD {
            let [_, rd, operand] = expect_operands(line, descriptor, tokens, "rd, imm(rs1)")?;
            let (imm, rs1) = self.memory_operand(line, descriptor, operand)?;
            (self.register(line, rd)?, rs1, imm)
        } else {
            let [_, rd, rs1, imm] = expect_operands(line, descriptor, tokens, "rd, rs1, imm")?;
            (
                self.register(line, rd)?,
                self.register(line, rs1)?,
                immediate(line, imm, 12)?,
            )
        };
        pack(
            line,
            rvbits::i_instruction(
                descriptor.opcode,
                rd,
                descriptor.funct3.unwrap_or(0),
                rs1,
                imm,
            ),
        )
    }

    fn encode_s(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
    ) -> Result<u32, AssemblyError> {
        let [_, rs2, operand] = expect_operands(line, descriptor, tokens, "rs2, imm(rs1)")?;
        let rs2 = self.register(line, rs2)?;
        let (imm, rs1) = self.memory_operand(line, descriptor, operand)?;
        pack(
            line,
            rvbits::s_instruction(
                descriptor.opcode,
                imm,
                descriptor.funct3.unwrap_or(0),
                rs1,
                rs2,
            ),
        )
    }

    fn encode_b(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
        labels: &LabelTable,
        pc: u32,
    ) -> Result<u32, AssemblyError> {
        let [_, rs1, rs2, target] = expect_operands(line, descriptor, tokens, "rs1, rs2, target")?;
        let rs1 = self.register(line, rs1)?;
        let rs2 = self.register(line, rs2)?;
        let imm = branch_target(line, target, labels, pc, 13)?;
        pack(
            line,
            rvbits::b_instruction(
                descriptor.opcode,
                imm,
                descriptor.funct3.unwrap_or(0),
                rs1,
                rs2,
            ),
        )
    }

    fn encode_j(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
        labels: &LabelTable,
        pc: u32,
    ) -> Result<u32, AssemblyError> {
        let [_, rd, target] = expect_operands(line, descriptor, tokens, "rd, target")?;
        let rd = self.register(line, rd)?;
        let imm = branch_target(line, target, labels, pc, 21)?;
        pack(line, rvbits::j_instruction(descriptor.opcode, rd, imm))
    }

    fn encode_u(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
    ) -> Result<u32, AssemblyError> {
        let [_, rd, imm] = expect_operands(line, descriptor, tokens, "rd, imm")?;
        let rd = self.register(line, rd)?;
        let imm = immediate(line, imm, 20)?;
        pack(line, rvbits::u_instruction(descriptor.opcode, rd, imm))
    }

    fn encode_no_operand(
        &self,
        line: usize,
        descriptor: &Descriptor,
        tokens: &[&str],
    ) -> Result<u32, AssemblyError> {
        let [_] = expect_operands(line, descriptor, tokens, "no operands")?;
        pack(
            line,
            rvbits::i_instruction(descriptor.opcode, 0, descriptor.funct3.unwrap_or(0), 0, 0),
        )
    }

    fn register(&self, line: usize, name: &str) -> Result<u8, AssemblyError> {
        self.registers
            .index(name)
            .ok_or_else(|| AssemblyError::UnknownRegister {
                line,
                name: name.to_string(),
            })
    }

    /// Parses the `imm(rs1)` surface syntax of loads and stores.
    fn memory_operand(
        &self,
        line: usize,
        descriptor: &Descriptor,
        token: &str,
    ) -> Result<(i32, u8), AssemblyError> {
        let malformed = || AssemblyError::BadOperands {
            line,
            mnemonic: descriptor.mnemonic.to_string(),
            expected: "a memory operand of the form imm(rs1)",
        };
        let open = token.find('(').ok_or_else(malformed)?;
        let close = token.len() - 1;
        if !token.ends_with(')') || open + 1 > close {
            return Err(malformed());
        }
        let imm = immediate(line, &token[..open], 12)?;
        let rs1 = self.register(line, &token[open + 1..close])?;
        Ok((imm, rs1))
    }
}

/// Single forward pass binding each label to instruction index × 4 and
/// stripping labels from the remaining instruction text.
pub fn resolve_labels(source: &str) -> Result<(LabelTable, Vec<(usize, &str)>), AssemblyError> {
    let mut labels = LabelTable::default();
    let mut lines = Vec::new();
    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        let mut text = raw_line.trim();
        if text.is_empty() {
            continue;
        }
        if let Some((label, rest)) = text.split_once(':') {
            let label = label.trim();
            if !label.chars().next().map_or(false, char::is_alphabetic) {
                return Err(AssemblyError::BadLabel {
                    line: line_number,
                    label: label.to_string(),
                });
            }
            if labels.contains_key(label) {
                return Err(AssemblyError::DuplicateLabel {
                    line: line_number,
                    label: label.to_string(),
                });
            }
            labels.insert(label.to_string(), (lines.len() * 4) as u32);
            text = rest.trim();
        }
        if text.is_empty() {
            continue;
        }
        lines.push((line_number, text));
    }
    Ok((labels, lines))
}

/// Resolves a branch/jump target: a label becomes the byte offset from the
/// current instruction, anything else must be an offset literal.
fn branch_target(
    line: usize,
    token: &str,
    labels: &LabelTable,
    pc: u32,
    width: u32,
) -> Result<i32, AssemblyError> {
    let value = match labels.get(token) {
        Some(&address) => i64::from(address) - i64::from(pc),
        None => token
            .parse::<i64>()
            .map_err(|_| AssemblyError::BadImmediate {
                line,
                token: token.to_string(),
            })?,
    };
    rvbits::check_multiple_of_two(value, "offset")
        .map_err(|_| AssemblyError::OddOffset { line, value })?;
    rvbits::check_signed(value, width)
        .map_err(|_| AssemblyError::ImmediateOutOfRange { line, value, width })?;
    Ok(value as i32)
}

fn immediate(line: usize, token: &str, width: u32) -> Result<i32, AssemblyError> {
    let value = token
        .parse::<i64>()
        .map_err(|_| AssemblyError::BadImmediate {
            line,
            token: token.to_string(),
        })?;
    rvbits::check_signed(value, width)
        .map_err(|_| AssemblyError::ImmediateOutOfRange { line, value, width })?;
    Ok(value as i32)
}

fn expect_operands<'a, const N: usize>(
    line: usize,
    descriptor: &Descriptor,
    tokens: &[&'a str],
    expected: &'static str,
) -> Result<[&'a str; N], AssemblyError> {
    <[&str; N]>::try_from(tokens).map_err(|_| AssemblyError::BadOperands {
        line,
        mnemonic: descriptor.mnemonic.to_string(),
        expected,
    })
}

fn pack(line: usize, result: rvbits::Result<u32>) -> Result<u32, AssemblyError> {
    result.map_err(|error| AssemblyError::Field { line, error })
}

pub fn is_terminator(word: u32) -> bool {
    matches!(
        decode(word),
        Op::Halt
            | Op::Beq {
                rs1: 0,
                rs2: 0,
                imm: 0
            }
    )
}
