//! Bit-level assembly and disassembly of 32-bit instruction words.
//!
//! Each format has a packer (`*_instruction`) that validates its fields and an
//! unpacker side (`opcode`, `rd`, ..., `*_immediate`) that recovers them.
//! The scrambled B and J immediates live here so they can be tested in
//! isolation from any particular encoder or decoder.

use std::error::Error;
use std::fmt;

pub const WORD_BITS: usize = 32;

pub mod opcode {
    macro_rules! opcodes {
        ($($name: ident $bits6to2: literal,)+) => ($(pub const $name: u8 = $bits6to2 << 2 | 0b11;)+)
    }

    opcodes!(
        LOAD    0b00000,
        OP_IMM  0b00100,
        AUIPC   0b00101,
        STORE   0b01000,
        OP      0b01100,
        BRANCH  0b11000,
        JALR    0b11001,
        JAL     0b11011,
        SYSTEM  0b11100,
    );
}

pub type Result<T> = std::result::Result<T, FieldError>;

#[derive(Debug, PartialEq, Eq)]
pub enum FieldError {
    OutOfRange {
        value: i64,
        min: i64,
        max: i64,
        name: &'static str,
    },
    NotMultipleOfTwo {
        value: i64,
        name: &'static str,
    },
    BadWord {
        word: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::OutOfRange { value, min, max, name } => {
                write!(f, "{} = {} is out of range: {} .. {}", name, value, min, max)
            }
            FieldError::NotMultipleOfTwo { value, name } => {
                write!(f, "{} = {} is not a multiple of 2", name, value)
            }
            FieldError::BadWord { word } => {
                write!(f, "`{}' is not a 32-bit binary word", word)
            }
        }
    }
}

impl Error for FieldError {}

// Packers

pub fn r_instruction(opcode: u8, rd: u8, funct3: u8, rs1: u8, rs2: u8, funct7: u8) -> Result<u32> {
    check_opcode(opcode)?;
    check_register(rd)?;
    check_funct3(funct3)?;
    check_register(rs1)?;
    check_register(rs2)?;
    check_funct7(funct7)?;
    Ok(u32::from(opcode)
        | (u32::from(rd) << 7)
        | (u32::from(funct3) << 12)
        | (u32::from(rs1) << 15)
        | (u32::from(rs2) << 20)
        | (u32::from(funct7) << 25))
}

pub fn i_instruction(opcode: u8, rd: u8, funct3: u8, rs1: u8, imm: i32) -> Result<u32> {
    check_opcode(opcode)?;
    check_register(rd)?;
    check_funct3(funct3)?;
    check_register(rs1)?;
    check_signed(i64::from(imm), 12)?;
    Ok(u32::from(opcode)
        | (u32::from(rd) << 7)
        | (u32::from(funct3) << 12)
        | (u32::from(rs1) << 15)
        | ((imm as u32 & 0xfff) << 20))
}

pub fn s_instruction(opcode: u8, imm: i32, funct3: u8, rs1: u8, rs2: u8) -> Result<u32> {
    check_opcode(opcode)?;
    check_signed(i64::from(imm), 12)?;
    check_funct3(funct3)?;
    check_register(rs1)?;
    check_register(rs2)?;
    let imm = imm as u32;
    Ok(u32::from(opcode)
        | ((imm & 0b11111) << 7)
        | (u32::from(funct3) << 12)
        | (u32::from(rs1) << 15)
        | (u32::from(rs2) << 20)
        | ((imm >> 5 & 0b111_1111) << 25))
}

pub fn b_instruction(opcode: u8, imm: i32, funct3: u8, rs1: u8, rs2: u8) -> Result<u32> {
    check_opcode(opcode)?;
    check_signed(i64::from(imm), 13)?;
    check_multiple_of_two(i64::from(imm), "imm")?;
    check_funct3(funct3)?;
    check_register(rs1)?;
    check_register(rs2)?;
    let imm = imm as u32;
    Ok(u32::from(opcode)
        | ((imm >> 11 & 0b1) << 7)
        | ((imm >> 1 & 0b1111) << 8)
        | (u32::from(funct3) << 12)
        | (u32::from(rs1) << 15)
        | (u32::from(rs2) << 20)
        | ((imm >> 5 & 0b11_1111) << 25)
        | ((imm >> 12 & 0b1) << 31))
}

pub fn u_instruction(opcode: u8, rd: u8, imm: i32) -> Result<u32> {
    check_opcode(opcode)?;
    check_register(rd)?;
    check_signed(i64::from(imm), 20)?;
    Ok(u32::from(opcode) | (u32::from(rd) << 7) | ((imm as u32 & 0xf_ffff) << 12))
}

pub fn j_instruction(opcode: u8, rd: u8, imm: i32) -> Result<u32> {
    check_opcode(opcode)?;
    check_register(rd)?;
    check_signed(i64::from(imm), 21)?;
    check_multiple_of_two(i64::from(imm), "imm")?;
    let imm = imm as u32;
    let imm_field = (imm >> 12 & 0b1111_1111)
        | ((imm >> 11 & 0b1) << 8)
        | ((imm >> 1 & 0b11_1111_1111) << 9)
        | ((imm >> 20 & 0b1) << 19);
    Ok(u32::from(opcode) | (u32::from(rd) << 7) | (imm_field << 12))
}

// Unpackers

pub fn opcode(word: u32) -> u8 {
    (word & 0b111_1111) as u8
}

pub fn rd(word: u32) -> u8 {
    (word >> 7 & 0b11111) as u8
}

pub fn funct3(word: u32) -> u8 {
    (word >> 12 & 0b111) as u8
}

pub fn rs1(word: u32) -> u8 {
    (word >> 15 & 0b11111) as u8
}

pub fn rs2(word: u32) -> u8 {
    (word >> 20 & 0b11111) as u8
}

pub fn funct7(word: u32) -> u8 {
    (word >> 25) as u8
}

pub fn i_immediate(word: u32) -> i32 {
    sign_extend(word >> 20, 12)
}

pub fn s_immediate(word: u32) -> i32 {
    sign_extend((word >> 25 << 5) | (word >> 7 & 0b11111), 12)
}

/// Reassembles the scrambled B immediate; the low bit is implicitly zero.
pub fn b_immediate(word: u32) -> i32 {
    sign_extend(
        (word >> 31 << 12)
            | ((word >> 7 & 0b1) << 11)
            | ((word >> 25 & 0b11_1111) << 5)
            | ((word >> 8 & 0b1111) << 1),
        13,
    )
}

pub fn u_immediate(word: u32) -> i32 {
    sign_extend(word >> 12, 20)
}

/// Reassembles the scrambled J immediate; the low bit is implicitly zero.
pub fn j_immediate(word: u32) -> i32 {
    sign_extend(
        (word >> 31 << 20)
            | ((word >> 12 & 0b1111_1111) << 12)
            | ((word >> 20 & 0b1) << 11)
            | ((word >> 21 & 0b11_1111_1111) << 1),
        21,
    )
}

pub fn sign_extend(value: u32, width: u32) -> i32 {
    debug_assert!(width >= 1 && width <= 32);
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}

// Boundary conversion to and from the textual form, 32 characters of '0'/'1',
// bit index 0 being the most significant.

pub fn to_bit_string(word: u32) -> String {
    format!("{:032b}", word)
}

pub fn from_bit_string(line: &str) -> Result<u32> {
    if line.len() != WORD_BITS || !line.bytes().all(|byte| byte == b'0' || byte == b'1') {
        return Err(FieldError::BadWord {
            word: line.to_string(),
        });
    }
    Ok(u32::from_str_radix(line, 2).unwrap())
}

/// Checks that `value` fits the two's-complement range of `width` bits.
pub fn check_signed(value: i64, width: u32) -> Result<()> {
    let min = -(1 << (width - 1));
    let max = (1 << (width - 1)) - 1;
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(FieldError::OutOfRange {
            value,
            min,
            max,
            name: "imm",
        })
    }
}

pub fn check_multiple_of_two(value: i64, name: &'static str) -> Result<()> {
    if value & 0b1 == 0 {
        Ok(())
    } else {
        Err(FieldError::NotMultipleOfTwo { value, name })
    }
}

fn check_opcode(opcode: u8) -> Result<()> {
    check_unsigned(opcode, 7, "opcode")
}

fn check_register(register: u8) -> Result<()> {
    check_unsigned(register, 5, "register")
}

fn check_funct3(funct3: u8) -> Result<()> {
    check_unsigned(funct3, 3, "funct3")
}

fn check_funct7(funct7: u8) -> Result<()> {
    check_unsigned(funct7, 7, "funct7")
}

fn check_unsigned(value: u8, width: u32, name: &'static str) -> Result<()> {
    let max = (1 << width) - 1;
    if i64::from(value) <= max {
        Ok(())
    } else {
        Err(FieldError::OutOfRange {
            value: i64::from(value),
            min: 0,
            max,
            name,
        })
    }
}
