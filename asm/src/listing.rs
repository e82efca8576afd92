//! PRG decompiler: BASIC detokenizer and linear 6502 disassembler.

use crate::basic::BASIC_START;
use crate::error::{ErrorKind, Result};
use crate::prg::Prg;
use arch::{opcode, petscii, Keyword};
use std::fmt;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ListMode {
    Auto,
    Basic,
    Disasm,
}

impl ListMode {
    /// Resolve `Auto` by looking at the load address.
    pub fn resolve(self, prg: &Prg) -> ListMode {
        match self {
            ListMode::Auto if prg.load_address == BASIC_START && prg.payload.len() >= 6 => {
                ListMode::Basic
            }
            ListMode::Auto => ListMode::Disasm,
            mode => mode,
        }
    }
}

fn printable(byte: u8) -> char {
    match byte {
        0x20..=0x7E => byte as char,
        _ => '.',
    }
}

// ----------------------------------------------------------------------------
// BASIC

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLine {
    pub address: u16,
    pub number: u16,
    pub text: String,
}

impl fmt::Display for BasicLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.text)
    }
}

/// Render the token bytes of one line (between the line number and the
/// terminating zero) as text.
pub fn detokenize_line(body: &[u8]) -> String {
    let mut text = String::new();
    let mut in_string = false;
    let mut in_rem = false;

    for &byte in body {
        if in_rem || in_string {
            text.push(printable(byte));
            in_string = in_string && byte != b'"';
            continue;
        }
        if byte == b'"' {
            text.push('"');
            in_string = true;
            continue;
        }
        if byte >= 0x80 {
            let word = match Keyword::from_byte(byte) {
                Some(keyword) => keyword.text().to_string(),
                None => format!("{{TOK:{byte:02X}}}"),
            };
            // Keep `PRINT A` from reading back as `PRINTA`
            let glued = text.chars().last().is_some_and(petscii::is_ident_char)
                && word.chars().next().is_some_and(petscii::is_ident_char);
            if glued {
                text.push(' ');
            }
            text.push_str(&word);
            in_rem = byte == Keyword::Rem.byte();
            continue;
        }
        text.push(printable(byte));
    }
    text.trim_end().to_string()
}

/// Walk the line chain of a BASIC program.
///
/// Returns the lines and the address just past the `00 00` end marker.
pub fn parse_basic_prg(prg: &Prg) -> Result<(Vec<BasicLine>, u32)> {
    let data = &prg.payload;
    if data.len() < 4 {
        return Err(ErrorKind::InvalidPrg("too small to be a BASIC program".to_string()).into());
    }
    let base = prg.load_address as u32;
    let max = prg.end_address();
    let offset = |addr: u32| (addr - base) as usize;
    let word = |addr: u32| u16::from_le_bytes([data[offset(addr)], data[offset(addr) + 1]]);

    let mut lines = Vec::new();
    let mut addr = base;
    loop {
        if addr + 2 > max {
            return Err(ErrorKind::InvalidPrg("truncated BASIC line link".to_string()).into());
        }
        let link = word(addr) as u32;
        if link == 0 {
            return Ok((lines, addr + 2));
        }
        if addr + 4 > max {
            return Err(ErrorKind::InvalidPrg("truncated BASIC line header".to_string()).into());
        }
        let number = word(addr + 2);
        let body = &data[offset(addr + 4)..];
        let Some(len) = body.iter().position(|b| *b == 0x00) else {
            return Err(ErrorKind::InvalidPrg("truncated BASIC line body".to_string()).into());
        };
        lines.push(BasicLine {
            address: addr as u16,
            number,
            text: detokenize_line(&body[..len]),
        });

        if link <= addr || link > max {
            return Err(ErrorKind::InvalidPrg(format!(
                "invalid BASIC link ${link:04X} at ${addr:04X}"
            ))
            .into());
        }
        addr = link;
    }
}

// ----------------------------------------------------------------------------
// 6502

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasmRow {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl fmt::Display for DisasmRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes: Vec<String> = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{:04X}  {:<9}  {}", self.address, bytes.join(" "), self.text)
    }
}

fn byte_row(address: u16, raw: &[u8]) -> DisasmRow {
    let values: Vec<String> = raw.iter().map(|b| format!("${b:02X}")).collect();
    DisasmRow {
        address,
        bytes: raw.to_vec(),
        text: format!(".byte {}", values.join(",")),
    }
}

/// Linear sweep over the payload from `start` (default: load address) for
/// `length` bytes (default: to the end).
pub fn disassemble(prg: &Prg, start: Option<u16>, length: Option<usize>) -> Result<Vec<DisasmRow>> {
    let data = &prg.payload;
    let base = prg.load_address as u32;
    let start = start.map_or(base, u32::from);
    if start < base || start > prg.end_address() {
        return Err(ErrorKind::InvalidPrg(format!(
            "start address ${start:04X} is outside ${base:04X}-${:04X}",
            prg.end_address().saturating_sub(1)
        ))
        .into());
    }

    let first = (start - base) as usize;
    let end = match length {
        Some(length) => data.len().min(first.saturating_add(length)),
        None => data.len(),
    };

    let mut rows = Vec::new();
    let mut pos = first;
    let mut addr = start as u16;
    while pos < end {
        let op = data[pos];
        let Some((mnemonic, mode)) = opcode::decode(op) else {
            rows.push(byte_row(addr, &[op]));
            pos += 1;
            addr = addr.wrapping_add(1);
            continue;
        };

        let size = mode.len() as usize;
        if pos + size > end {
            rows.push(byte_row(addr, &data[pos..end]));
            break;
        }
        let raw = &data[pos..pos + size];
        let operand = mode.format_operand(addr, raw);
        let text = if operand.is_empty() {
            mnemonic.to_string()
        } else {
            format!("{mnemonic} {operand}")
        };
        rows.push(DisasmRow {
            address: addr,
            bytes: raw.to_vec(),
            text,
        });
        pos += size;
        addr = addr.wrapping_add(size as u16);
    }
    Ok(rows)
}
