use super::*;
use rvbits::to_bit_string;

fn assemble(source: &str) -> Result<Vec<u32>, AssemblyError> {
    Assembler::new().assemble(source)
}

fn assemble_to_strings(source: &str) -> Vec<String> {
    assemble(source).unwrap().iter().map(|&word| to_bit_string(word)).collect()
}

const TERMINATOR: &str = "00000000000000000000000001100011";

#[test]
fn encodes_reference_program() {
    let program = assemble_to_strings(
        "addi a0, zero, 5\n\
         addi a1, zero, 3\n\
         add a2, a0, a1\n\
         beq zero, zero, 0\n",
    );
    assert_eq!(
        program,
        [
            "00000000010100000000010100010011",
            "00000000001100000000010110010011",
            "00000000101101010000011000110011",
            TERMINATOR,
        ]
    );
}

#[test]
fn encodes_one_sample_per_format() {
    let program = assemble_to_strings(
        "sub s0, s1, s2\n\
         lw a0, -4(sp)\n\
         sw a1, 8(sp)\n\
         jal ra, 8\n\
         auipc a0, 16\n\
         rst\n\
         halt\n",
    );
    assert_eq!(
        program,
        [
            "01000001001001001000010000110011",
            "11111111110000010010010100000011",
            "00000000101100010010010000100011",
            "00000000100000000000000011101111",
            "00000000000000010000010100010111",
            "00000000000000000001000001110011",
            "00000000000000000010000001110011",
        ]
    );
}

#[test]
fn tokenization_accepts_mixed_commas_and_whitespace() {
    let with_commas = assemble("add a2, a0, a1\nbeq zero, zero, 0\n").unwrap();
    let without = assemble("  add a2 a0 a1  \nbeq zero zero 0\n").unwrap();
    assert_eq!(with_commas, without);
}

#[test]
fn labels_resolve_to_byte_offsets() {
    let program = assemble(
        "start: addi t0, zero, 3\n\
         loop: addi t0, t0, -1\n\
         bne t0, zero, loop\n\
         beq zero, zero, done\n\
         jal ra, start\n\
         done: beq zero, zero, 0\n",
    )
    .unwrap();
    // bne at pc 8, loop at 4.
    assert_eq!(rvbits::b_immediate(program[2]), -4);
    // beq at pc 12, done at 20.
    assert_eq!(rvbits::b_immediate(program[3]), 8);
    // jal at pc 16, start at 0.
    assert_eq!(rvbits::j_immediate(program[4]), -16);
}

#[test]
fn label_may_share_a_line_or_stand_alone() {
    let shared = assemble("loop: addi a0, a0, 1\nbeq zero, zero, loop\nhalt\n").unwrap();
    let standalone = assemble("loop:\naddi a0, a0, 1\nbeq zero, zero, loop\nhalt\n").unwrap();
    assert_eq!(shared, standalone);
}

#[test]
fn blank_lines_are_ignored_in_addressing() {
    let spaced = assemble("addi a0, zero, 1\n\n\nend: beq zero, zero, end\n").unwrap();
    let dense = assemble("addi a0, zero, 1\nend: beq zero, zero, end\n").unwrap();
    assert_eq!(spaced, dense);
}

#[test]
fn self_referential_branch_through_label_is_a_terminator() {
    assert!(assemble("addi a0, zero, 1\nend: beq zero, zero, end\n").is_ok());
}

#[test]
fn duplicate_label_is_fatal() {
    assert_eq!(
        assemble("loop: addi a0, zero, 1\nloop: halt\n"),
        Err(AssemblyError::DuplicateLabel {
            line: 2,
            label: "loop".to_string()
        })
    );
}

#[test]
fn label_must_start_with_a_letter() {
    assert_eq!(
        assemble("1loop: halt\n"),
        Err(AssemblyError::BadLabel {
            line: 1,
            label: "1loop".to_string()
        })
    );
}

#[test]
fn unknown_mnemonic_is_fatal_with_line_number() {
    assert_eq!(
        assemble("addi a0, zero, 1\nmul a0, a0, a0\nhalt\n"),
        Err(AssemblyError::UnknownMnemonic {
            line: 2,
            mnemonic: "mul".to_string()
        })
    );
}

#[test]
fn unknown_register_is_fatal() {
    assert_eq!(
        assemble("add a0, a0, x9\nhalt\n"),
        Err(AssemblyError::UnknownRegister {
            line: 1,
            name: "x9".to_string()
        })
    );
}

#[test]
fn wrong_operand_counts_are_fatal() {
    assert!(matches!(
        assemble("add a0, a1\nhalt\n"),
        Err(AssemblyError::BadOperands { line: 1, .. })
    ));
    assert!(matches!(
        assemble("jal ra\nhalt\n"),
        Err(AssemblyError::BadOperands { line: 1, .. })
    ));
    assert!(matches!(
        assemble("halt a0\n"),
        Err(AssemblyError::BadOperands { line: 1, .. })
    ));
}

#[test]
fn malformed_memory_operands_are_fatal() {
    assert!(matches!(
        assemble("lw a0, 4\nhalt\n"),
        Err(AssemblyError::BadOperands { line: 1, .. })
    ));
    assert!(matches!(
        assemble("lw a0, 4(sp\nhalt\n"),
        Err(AssemblyError::BadOperands { line: 1, .. })
    ));
    assert!(matches!(
        assemble("sw a0, (sp)\nhalt\n"),
        Err(AssemblyError::BadImmediate { line: 1, .. })
    ));
}

#[test]
fn immediate_boundaries_per_width() {
    assert!(assemble("addi a0, zero, 2047\nhalt\n").is_ok());
    assert_eq!(
        assemble("addi a0, zero, 2048\nhalt\n"),
        Err(AssemblyError::ImmediateOutOfRange {
            line: 1,
            value: 2048,
            width: 12
        })
    );
    assert!(assemble("addi a0, zero, -2048\nhalt\n").is_ok());
    assert!(assemble("addi a0, zero, -2049\nhalt\n").is_err());

    assert!(assemble("beq a0, a1, 4094\nhalt\n").is_ok());
    assert_eq!(
        assemble("beq a0, a1, 4096\nhalt\n"),
        Err(AssemblyError::ImmediateOutOfRange {
            line: 1,
            value: 4096,
            width: 13
        })
    );

    assert!(assemble("jal ra, -1048576\nhalt\n").is_ok());
    assert_eq!(
        assemble("jal ra, 1048576\nhalt\n"),
        Err(AssemblyError::ImmediateOutOfRange {
            line: 1,
            value: 1048576,
            width: 21
        })
    );
}

#[test]
fn odd_branch_and_jump_offsets_are_fatal() {
    assert_eq!(
        assemble("beq a0, a1, 3\nhalt\n"),
        Err(AssemblyError::OddOffset { line: 1, value: 3 })
    );
    assert_eq!(
        assemble("jal ra, -7\nhalt\n"),
        Err(AssemblyError::OddOffset { line: 1, value: -7 })
    );
}

#[test]
fn unresolved_label_is_fatal() {
    assert_eq!(
        assemble("beq a0, a1, nowhere\nhalt\n"),
        Err(AssemblyError::BadImmediate {
            line: 1,
            token: "nowhere".to_string()
        })
    );
}

#[test]
fn missing_terminator_is_fatal() {
    assert_eq!(
        assemble("addi a0, zero, 1\nadd a1, a0, a0\n"),
        Err(AssemblyError::MissingTerminator)
    );
    assert_eq!(assemble(""), Err(AssemblyError::MissingTerminator));
}

#[test]
fn misplaced_terminator_is_fatal() {
    assert_eq!(
        assemble("halt\naddi a0, zero, 1\n"),
        Err(AssemblyError::MisplacedTerminator)
    );
    assert_eq!(
        assemble("beq zero, zero, 0\naddi a0, zero, 1\n"),
        Err(AssemblyError::MisplacedTerminator)
    );
}

#[test]
fn branch_on_zero_with_nonzero_offset_is_not_a_terminator() {
    assert_eq!(
        assemble("beq zero, zero, 8\naddi a0, zero, 1\n"),
        Err(AssemblyError::MissingTerminator)
    );
}
