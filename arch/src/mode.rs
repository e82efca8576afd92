use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Operand encoding form of a 6502 instruction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AddrMode {
    Imm,
    Zp,
    Zpx,
    Zpy,
    Abs,
    Absx,
    Absy,
    Indx,
    Indy,
    Ind,
    Rel,
    Acc,
    Imp,
}

impl AddrMode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().parse::<Self>() {
            Ok(mode) => Ok(mode),
            Err(_) => Err(format!("Unknown addressing mode: {s}")),
        }
    }

    /// Encoded instruction length in bytes, opcode included.
    pub fn len(&self) -> u16 {
        use AddrMode::*;
        match self {
            Imp | Acc => 1,
            Imm | Zp | Zpx | Zpy | Indx | Indy | Rel => 2,
            Abs | Absx | Absy | Ind => 3,
        }
    }

    pub fn is_zero_page(&self) -> bool {
        matches!(
            self,
            AddrMode::Zp | AddrMode::Zpx | AddrMode::Zpy | AddrMode::Indx | AddrMode::Indy
        )
    }

    /// Render the operand of an encoded instruction located at `pc`.
    /// `raw` holds the whole instruction, opcode first.
    pub fn format_operand(&self, pc: u16, raw: &[u8]) -> String {
        let byte = || raw.get(1).copied().unwrap_or(0);
        let word = || u16::from_le_bytes([byte(), raw.get(2).copied().unwrap_or(0)]);
        match self {
            AddrMode::Imp => String::new(),
            AddrMode::Acc => "A".to_string(),
            AddrMode::Imm => format!("#${:02X}", byte()),
            AddrMode::Zp => format!("${:02X}", byte()),
            AddrMode::Zpx => format!("${:02X},X", byte()),
            AddrMode::Zpy => format!("${:02X},Y", byte()),
            AddrMode::Abs => format!("${:04X}", word()),
            AddrMode::Absx => format!("${:04X},X", word()),
            AddrMode::Absy => format!("${:04X},Y", word()),
            AddrMode::Ind => format!("(${:04X})", word()),
            AddrMode::Indx => format!("(${:02X},X)", byte()),
            AddrMode::Indy => format!("(${:02X}),Y", byte()),
            AddrMode::Rel => {
                let target = pc.wrapping_add(2).wrapping_add(byte() as i8 as u16);
                format!("${:04X}", target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags() {
        assert_eq!(AddrMode::parse("absx"), Ok(AddrMode::Absx));
        assert_eq!(AddrMode::parse("IMM"), Ok(AddrMode::Imm));
        assert!(AddrMode::parse("hoge").is_err());
        assert_eq!(AddrMode::Indy.to_string(), "indy");
    }

    #[test]
    fn lengths() {
        assert_eq!(AddrMode::Imp.len(), 1);
        assert_eq!(AddrMode::Rel.len(), 2);
        assert_eq!(AddrMode::Ind.len(), 3);
    }

    #[test]
    fn branch_operand_wraps_backwards() {
        assert_eq!(AddrMode::Rel.format_operand(0x1000, &[0xD0, 0xFE]), "$1000");
        assert_eq!(AddrMode::Rel.format_operand(0x1000, &[0xD0, 0x7F]), "$1081");
        assert_eq!(AddrMode::Indy.format_operand(0, &[0xB1, 0xFB]), "($FB),Y");
    }
}
