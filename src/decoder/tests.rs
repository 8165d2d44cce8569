use super::*;
use crate::assembler::Assembler;
use crate::registers::{RegisterTable, A0, A1, A2, RA, SP, T0};

fn assemble(source: &str) -> Vec<u32> {
    Assembler::new().assemble(source).unwrap()
}

#[test]
fn decode_recovers_every_mnemonic() {
    let expected = [
        ("add a2, a0, a1", Op::Add { rd: A2, rs1: A0, rs2: A1 }),
        ("sub a2, a0, a1", Op::Sub { rd: A2, rs1: A0, rs2: A1 }),
        ("slt a2, a0, a1", Op::Slt { rd: A2, rs1: A0, rs2: A1 }),
        ("srl a2, a0, a1", Op::Srl { rd: A2, rs1: A0, rs2: A1 }),
        ("or a2, a0, a1", Op::Or { rd: A2, rs1: A0, rs2: A1 }),
        ("and a2, a0, a1", Op::And { rd: A2, rs1: A0, rs2: A1 }),
        ("addi a0, zero, -7", Op::Addi { rd: A0, rs1: 0, imm: -7 }),
        ("lw a0, -4(sp)", Op::Lw { rd: A0, rs1: SP, imm: -4 }),
        ("jalr ra, t0, 12", Op::Jalr { rd: RA, rs1: T0, imm: 12 }),
        ("sw a1, 8(sp)", Op::Sw { rs1: SP, rs2: A1, imm: 8 }),
        ("beq a0, a1, -8", Op::Beq { rs1: A0, rs2: A1, imm: -8 }),
        ("bne t0, zero, 16", Op::Bne { rs1: T0, rs2: 0, imm: 16 }),
        ("jal ra, -16", Op::Jal { rd: RA, imm: -16 }),
        ("auipc a0, 16", Op::Auipc { rd: A0, imm: 16 }),
        ("rst", Op::Rst),
        ("halt", Op::Halt),
    ];

    let source = expected
        .iter()
        .map(|(line, _)| *line)
        .collect::<Vec<_>>()
        .join("\n")
        + "\nbeq zero, zero, 0\n";
    let program = assemble(&source);
    assert_eq!(program.len(), expected.len() + 1);

    for (word, (line, op)) in program.iter().zip(&expected) {
        assert_eq!(decode(*word), *op, "{}", line);
    }
    assert_eq!(
        decode(*program.last().unwrap()),
        Op::Beq { rs1: 0, rs2: 0, imm: 0 }
    );
}

#[test]
fn unknown_r_type_operation_decodes_as_unknown() {
    // funct7/funct3 pair with no catalog entry (xor).
    let word = rvbits::r_instruction(rvbits::opcode::OP, 1, 0b100, 2, 3, 0b0000000).unwrap();
    assert_eq!(decode(word), Op::Unknown);
}

#[test]
fn unknown_funct3_decodes_as_unknown() {
    let word = rvbits::i_instruction(rvbits::opcode::OP_IMM, 1, 0b111, 2, 0).unwrap();
    assert_eq!(decode(word), Op::Unknown);
    let word = rvbits::i_instruction(rvbits::opcode::SYSTEM, 0, 0b000, 0, 0).unwrap();
    assert_eq!(decode(word), Op::Unknown);
}

#[test]
fn unknown_opcode_decodes_as_unknown() {
    assert_eq!(decode(0xffff_ffff), Op::Unknown);
    assert_eq!(decode(0), Op::Unknown);
}

#[test]
fn disassembly_uses_abi_names() {
    let registers = RegisterTable::new();
    let program = assemble("loop: addi a0, a0, 1\nbeq zero, zero, loop\nhalt\n");
    assert_eq!(
        decode(program[0]).disassemble(&registers),
        "addi a0, a0, 1"
    );
    assert_eq!(
        decode(program[1]).disassemble(&registers),
        "beq zero, zero, -4"
    );
    assert_eq!(decode(program[2]).disassemble(&registers), "halt");
    assert_eq!(Op::Unknown.disassemble(&registers), "unknown");
}
