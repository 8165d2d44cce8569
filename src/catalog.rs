use rustc_hash::FxHashMap;
use rvbits::opcode;

/// Instruction format, fixing the bit-field layout of the encoded word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    S,
    B,
    J,
    U,
    NoOperand,
}

/// Catalog entry for one mnemonic.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub mnemonic: &'static str,
    pub format: Format,
    pub opcode: u8,
    pub funct3: Option<u8>,
    pub funct7: Option<u8>,
}

macro_rules! descriptors {
    ($($mnemonic: literal => $format: ident, $opcode: path, $funct3: expr, $funct7: expr;)+) => {
        &[$(Descriptor {
            mnemonic: $mnemonic,
            format: Format::$format,
            opcode: $opcode,
            funct3: $funct3,
            funct7: $funct7,
        },)+]
    }
}

const DESCRIPTORS: &[Descriptor] = descriptors![
    "add"   => R, opcode::OP, Some(0b000), Some(0b0000000);
    "sub"   => R, opcode::OP, Some(0b000), Some(0b0100000);
    "slt"   => R, opcode::OP, Some(0b010), Some(0b0000000);
    "srl"   => R, opcode::OP, Some(0b101), Some(0b0000000);
    "or"    => R, opcode::OP, Some(0b110), Some(0b0000000);
    "and"   => R, opcode::OP, Some(0b111), Some(0b0000000);
    "lw"    => I, opcode::LOAD, Some(0b010), None;
    "addi"  => I, opcode::OP_IMM, Some(0b000), None;
    "jalr"  => I, opcode::JALR, Some(0b000), None;
    "sw"    => S, opcode::STORE, Some(0b010), None;
    "beq"   => B, opcode::BRANCH, Some(0b000), None;
    "bne"   => B, opcode::BRANCH, Some(0b001), None;
    "jal"   => J, opcode::JAL, None, None;
    "auipc" => U, opcode::AUIPC, None, None;
    "rst"   => NoOperand, opcode::SYSTEM, Some(0b001), None;
    "halt"  => NoOperand, opcode::SYSTEM, Some(0b010), None;
];

/// Flat mnemonic → descriptor lookup table; read-only after construction.
pub struct Catalog(FxHashMap<&'static str, Descriptor>);

impl Catalog {
    pub fn new() -> Self {
        Self(
            DESCRIPTORS
                .iter()
                .map(|descriptor| (descriptor.mnemonic, *descriptor))
                .collect(),
        )
    }

    pub fn get(&self, mnemonic: &str) -> Option<&Descriptor> {
        self.0.get(mnemonic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_descriptor_per_mnemonic() {
        let catalog = Catalog::new();
        assert_eq!(catalog.0.len(), DESCRIPTORS.len());
        for descriptor in DESCRIPTORS {
            assert_eq!(
                catalog.get(descriptor.mnemonic).unwrap().mnemonic,
                descriptor.mnemonic
            );
        }
        assert!(catalog.get("mul").is_none());
    }
}
