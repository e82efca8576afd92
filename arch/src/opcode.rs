use crate::mode::AddrMode;
use bimap::BiMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Mnemonic {
    ADC,
    AND,
    ASL,
    BCC,
    BCS,
    BEQ,
    BIT,
    BMI,
    BNE,
    BPL,
    BRK,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    CMP,
    CPX,
    CPY,
    DEC,
    DEX,
    DEY,
    EOR,
    INC,
    INX,
    INY,
    JMP,
    JSR,
    LDA,
    LDX,
    LDY,
    LSR,
    NOP,
    ORA,
    PHA,
    PHP,
    PLA,
    PLP,
    ROL,
    ROR,
    RTI,
    RTS,
    SBC,
    SEC,
    SED,
    SEI,
    STA,
    STX,
    STY,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
}

// Documented NMOS 6502 encodings
#[rustfmt::skip]
const ENCODINGS: &[(Mnemonic, &[(AddrMode, u8)])] = {
    use AddrMode::*;
    use Mnemonic::*;
    &[
        (ADC, &[(Imm, 0x69), (Zp, 0x65), (Zpx, 0x75), (Abs, 0x6D), (Absx, 0x7D), (Absy, 0x79), (Indx, 0x61), (Indy, 0x71)]),
        (AND, &[(Imm, 0x29), (Zp, 0x25), (Zpx, 0x35), (Abs, 0x2D), (Absx, 0x3D), (Absy, 0x39), (Indx, 0x21), (Indy, 0x31)]),
        (ASL, &[(Acc, 0x0A), (Zp, 0x06), (Zpx, 0x16), (Abs, 0x0E), (Absx, 0x1E)]),
        (BCC, &[(Rel, 0x90)]),
        (BCS, &[(Rel, 0xB0)]),
        (BEQ, &[(Rel, 0xF0)]),
        (BIT, &[(Zp, 0x24), (Abs, 0x2C)]),
        (BMI, &[(Rel, 0x30)]),
        (BNE, &[(Rel, 0xD0)]),
        (BPL, &[(Rel, 0x10)]),
        (BRK, &[(Imp, 0x00)]),
        (BVC, &[(Rel, 0x50)]),
        (BVS, &[(Rel, 0x70)]),
        (CLC, &[(Imp, 0x18)]),
        (CLD, &[(Imp, 0xD8)]),
        (CLI, &[(Imp, 0x58)]),
        (CLV, &[(Imp, 0xB8)]),
        (CMP, &[(Imm, 0xC9), (Zp, 0xC5), (Zpx, 0xD5), (Abs, 0xCD), (Absx, 0xDD), (Absy, 0xD9), (Indx, 0xC1), (Indy, 0xD1)]),
        (CPX, &[(Imm, 0xE0), (Zp, 0xE4), (Abs, 0xEC)]),
        (CPY, &[(Imm, 0xC0), (Zp, 0xC4), (Abs, 0xCC)]),
        (DEC, &[(Zp, 0xC6), (Zpx, 0xD6), (Abs, 0xCE), (Absx, 0xDE)]),
        (DEX, &[(Imp, 0xCA)]),
        (DEY, &[(Imp, 0x88)]),
        (EOR, &[(Imm, 0x49), (Zp, 0x45), (Zpx, 0x55), (Abs, 0x4D), (Absx, 0x5D), (Absy, 0x59), (Indx, 0x41), (Indy, 0x51)]),
        (INC, &[(Zp, 0xE6), (Zpx, 0xF6), (Abs, 0xEE), (Absx, 0xFE)]),
        (INX, &[(Imp, 0xE8)]),
        (INY, &[(Imp, 0xC8)]),
        (JMP, &[(Abs, 0x4C), (Ind, 0x6C)]),
        (JSR, &[(Abs, 0x20)]),
        (LDA, &[(Imm, 0xA9), (Zp, 0xA5), (Zpx, 0xB5), (Abs, 0xAD), (Absx, 0xBD), (Absy, 0xB9), (Indx, 0xA1), (Indy, 0xB1)]),
        (LDX, &[(Imm, 0xA2), (Zp, 0xA6), (Zpy, 0xB6), (Abs, 0xAE), (Absy, 0xBE)]),
        (LDY, &[(Imm, 0xA0), (Zp, 0xA4), (Zpx, 0xB4), (Abs, 0xAC), (Absx, 0xBC)]),
        (LSR, &[(Acc, 0x4A), (Zp, 0x46), (Zpx, 0x56), (Abs, 0x4E), (Absx, 0x5E)]),
        (NOP, &[(Imp, 0xEA)]),
        (ORA, &[(Imm, 0x09), (Zp, 0x05), (Zpx, 0x15), (Abs, 0x0D), (Absx, 0x1D), (Absy, 0x19), (Indx, 0x01), (Indy, 0x11)]),
        (PHA, &[(Imp, 0x48)]),
        (PHP, &[(Imp, 0x08)]),
        (PLA, &[(Imp, 0x68)]),
        (PLP, &[(Imp, 0x28)]),
        (ROL, &[(Acc, 0x2A), (Zp, 0x26), (Zpx, 0x36), (Abs, 0x2E), (Absx, 0x3E)]),
        (ROR, &[(Acc, 0x6A), (Zp, 0x66), (Zpx, 0x76), (Abs, 0x6E), (Absx, 0x7E)]),
        (RTI, &[(Imp, 0x40)]),
        (RTS, &[(Imp, 0x60)]),
        (SBC, &[(Imm, 0xE9), (Zp, 0xE5), (Zpx, 0xF5), (Abs, 0xED), (Absx, 0xFD), (Absy, 0xF9), (Indx, 0xE1), (Indy, 0xF1)]),
        (SEC, &[(Imp, 0x38)]),
        (SED, &[(Imp, 0xF8)]),
        (SEI, &[(Imp, 0x78)]),
        (STA, &[(Zp, 0x85), (Zpx, 0x95), (Abs, 0x8D), (Absx, 0x9D), (Absy, 0x99), (Indx, 0x81), (Indy, 0x91)]),
        (STX, &[(Zp, 0x86), (Zpy, 0x96), (Abs, 0x8E)]),
        (STY, &[(Zp, 0x84), (Zpx, 0x94), (Abs, 0x8C)]),
        (TAX, &[(Imp, 0xAA)]),
        (TAY, &[(Imp, 0xA8)]),
        (TSX, &[(Imp, 0xBA)]),
        (TXA, &[(Imp, 0x8A)]),
        (TXS, &[(Imp, 0x9A)]),
        (TYA, &[(Imp, 0x98)]),
    ]
};

static OPCODES: Lazy<BiMap<(Mnemonic, AddrMode), u8>> = Lazy::new(|| {
    let mut map = BiMap::new();
    for (mnemonic, modes) in ENCODINGS {
        for (mode, byte) in modes.iter() {
            map.insert((*mnemonic, *mode), *byte);
        }
    }
    map
});

impl Mnemonic {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(m) => Ok(m),
            Err(_) => Err(format!("Unknown mnemonic: {s}")),
        }
    }

    /// Opcode byte for this mnemonic in `mode`, if the CPU has one.
    pub fn opcode(&self, mode: AddrMode) -> Option<u8> {
        OPCODES.get_by_left(&(*self, mode)).copied()
    }

    pub fn supports(&self, mode: AddrMode) -> bool {
        self.opcode(mode).is_some()
    }

    pub fn modes(&self) -> Vec<AddrMode> {
        AddrMode::iter().filter(|mode| self.supports(*mode)).collect()
    }

    pub fn is_branch(&self) -> bool {
        self.supports(AddrMode::Rel)
    }
}

/// Reverse lookup of an opcode byte.
pub fn decode(opcode: u8) -> Option<(Mnemonic, AddrMode)> {
    OPCODES.get_by_right(&opcode).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Mnemonic::parse("lda"), Ok(Mnemonic::LDA));
        assert_eq!(Mnemonic::parse("Rts"), Ok(Mnemonic::RTS));
        assert!(Mnemonic::parse("hoge").is_err());
    }

    #[test]
    fn table_is_complete() {
        assert_eq!(OPCODES.len(), 151);
        assert_eq!(Mnemonic::iter().count(), 56);
        for mnemonic in Mnemonic::iter() {
            assert!(!mnemonic.modes().is_empty(), "{mnemonic} has no encoding");
        }
    }

    #[test]
    fn lookup_both_ways() {
        assert_eq!(Mnemonic::LDA.opcode(AddrMode::Imm), Some(0xA9));
        assert_eq!(Mnemonic::STA.opcode(AddrMode::Abs), Some(0x8D));
        assert_eq!(Mnemonic::STA.opcode(AddrMode::Imm), None);
        assert_eq!(Mnemonic::JMP.opcode(AddrMode::Ind), Some(0x6C));
        assert_eq!(decode(0x60), Some((Mnemonic::RTS, AddrMode::Imp)));
        assert_eq!(decode(0xB6), Some((Mnemonic::LDX, AddrMode::Zpy)));
        assert_eq!(decode(0x02), None);
    }

    #[test]
    fn branches() {
        assert!(Mnemonic::BNE.is_branch());
        assert!(!Mnemonic::JMP.is_branch());
        assert_eq!(Mnemonic::ASL.modes().first(), Some(&AddrMode::Zp));
    }
}
