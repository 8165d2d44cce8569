use bimap::BiMap;

pub const REGISTER_COUNT: usize = 32;

pub const ZERO: u8 = 0; // Hard-wired zero
pub const RA: u8 = 1; // Return address
pub const SP: u8 = 2; // Stack pointer
pub const GP: u8 = 3; // Global pointer
pub const TP: u8 = 4; // Thread pointer

// Temporaries
pub const T0: u8 = 5;
pub const T1: u8 = 6;
pub const T2: u8 = 7;
pub const T3: u8 = 28;
pub const T4: u8 = 29;
pub const T5: u8 = 30;
pub const T6: u8 = 31;

// Function arguments/return values
pub const A0: u8 = 10;
pub const A1: u8 = 11;
pub const A2: u8 = 12;
pub const A3: u8 = 13;
pub const A4: u8 = 14;
pub const A5: u8 = 15;
pub const A6: u8 = 16;
pub const A7: u8 = 17;

// Saved registers
pub const S0: u8 = 8;
pub const S1: u8 = 9;
pub const S2: u8 = 18;
pub const S3: u8 = 19;
pub const S4: u8 = 20;
pub const S5: u8 = 21;
pub const S6: u8 = 22;
pub const S7: u8 = 23;
pub const S8: u8 = 24;
pub const S9: u8 = 25;
pub const S10: u8 = 26;
pub const S11: u8 = 27;

pub const ABI_NAMES: [&str; REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Bidirectional map between ABI register names and their 5-bit indices.
pub struct RegisterTable(BiMap<&'static str, u8>);

impl RegisterTable {
    pub fn new() -> Self {
        let mut table = BiMap::new();
        for (index, name) in ABI_NAMES.iter().enumerate() {
            table.insert(*name, index as u8);
        }
        Self(table)
    }

    pub fn index(&self, name: &str) -> Option<u8> {
        self.0.get_by_left(name).copied()
    }

    pub fn name(&self, index: u8) -> Option<&'static str> {
        self.0.get_by_right(&index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_names_map_both_ways() {
        let table = RegisterTable::new();
        assert_eq!(table.index("zero"), Some(ZERO));
        assert_eq!(table.index("sp"), Some(SP));
        assert_eq!(table.index("a0"), Some(A0));
        assert_eq!(table.index("t6"), Some(T6));
        assert_eq!(table.index("x5"), None);
        assert_eq!(table.name(A2), Some("a2"));
        assert_eq!(table.name(S11), Some("s11"));
        assert_eq!(table.name(32), None);
    }
}
