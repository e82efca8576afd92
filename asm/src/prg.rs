use crate::assembler::{assemble, AssembledImage};
use crate::basic::{compile_program, BASIC_START};
use crate::error::{Error, ErrorKind, Result};
use serde::Serialize;
use strum::Display;

/// Bytes per `DATA` line of the poke loader.
pub const DATA_CHUNK: usize = 16;

const STUB_ITERATIONS: usize = 8;

// ----------------------------------------------------------------------------
// Container

/// Commodore program file: little-endian load address, then the memory image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prg {
    pub load_address: u16,
    pub payload: Vec<u8>,
}

impl Prg {
    pub fn new(load_address: u16, payload: Vec<u8>) -> Self {
        Prg {
            load_address,
            payload,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Prg> {
        match bytes {
            [lo, hi, payload @ ..] => {
                Ok(Prg::new(u16::from_le_bytes([*lo, *hi]), payload.to_vec()))
            }
            _ => Err(ErrorKind::InvalidPrg(format!(
                "{} byte(s), too short for a load address",
                bytes.len()
            ))
            .into()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bin = Vec::with_capacity(self.payload.len() + 2);
        bin.extend(self.load_address.to_le_bytes());
        bin.extend(&self.payload);
        bin
    }

    /// Address one past the last payload byte.
    pub fn end_address(&self) -> u32 {
        self.load_address as u32 + self.payload.len() as u32
    }
}

// ----------------------------------------------------------------------------
// Strategy selector

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Machine code placed right after the auto-run stub.
    Append,
    /// BASIC loader that pokes the code to its declared origin.
    Poke,
}

#[derive(Debug, Clone)]
pub struct RunnablePrg {
    pub prg: Vec<u8>,
    pub entry: u16,
    pub size_bytes: usize,
    pub strategy: Strategy,
    pub image: AssembledImage,
}

/// The `10 SYS <addr>` stub whose target is the first byte after itself.
pub fn auto_run_stub() -> Result<(Prg, u16)> {
    let mut entry = BASIC_START as u32;
    for _ in 0..STUB_ITERATIONS {
        let stub = compile_program(&format!("10 SYS {entry}"))?;
        let end = stub.end_address();
        if end == entry {
            return Ok((stub, entry as u16));
        }
        entry = end;
    }
    Err(Error::new(ErrorKind::Internal(
        "auto-run stub address did not converge".to_string(),
    )))
}

/// BASIC source that copies `bytes` to `origin` and jumps there.
pub fn poke_loader(origin: u16, bytes: &[u8]) -> String {
    let mut lines = Vec::new();
    if !bytes.is_empty() {
        lines.push(format!(
            "10 FOR I=0 TO {}:READ B:POKE {}+I,B:NEXT I",
            bytes.len() - 1,
            origin
        ));
    }
    lines.push(format!("20 SYS {origin}"));
    for (i, chunk) in bytes.chunks(DATA_CHUNK).enumerate() {
        let values: Vec<String> = chunk.iter().map(u8::to_string).collect();
        lines.push(format!("{} DATA {}", 100 + i * 10, values.join(",")));
    }
    lines.join("\n")
}

/// Assemble `source` into a PRG that runs when loaded and `RUN`.
pub fn build_runnable_prg(source: &str) -> Result<RunnablePrg> {
    let (stub, stub_entry) = auto_run_stub()?;
    let image = assemble(source, Some(stub_entry), false)?;

    let (prg, entry, strategy) = if !image.explicit_origin || image.origin == stub_entry {
        let mut payload = stub.payload;
        payload.extend(&image.bytes);
        (Prg::new(BASIC_START, payload), stub_entry, Strategy::Append)
    } else {
        let loader = compile_program(&poke_loader(image.origin, &image.bytes))?;
        (loader, image.origin, Strategy::Poke)
    };

    let prg = prg.to_bytes();
    Ok(RunnablePrg {
        size_bytes: prg.len(),
        prg,
        entry,
        strategy,
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container() {
        let prg = Prg::parse(&[0x00, 0xC0, 0xEA]).unwrap();
        assert_eq!(prg.load_address, 0xC000);
        assert_eq!(prg.payload, [0xEA]);
        assert_eq!(prg.end_address(), 0xC001);
        assert_eq!(prg.to_bytes(), [0x00, 0xC0, 0xEA]);
        assert!(Prg::parse(&[0x01]).is_err());
    }

    #[test]
    fn stub_is_fixed_point() {
        let (stub, entry) = auto_run_stub().unwrap();
        assert_eq!(entry, 2062);
        assert_eq!(stub.end_address(), 2062);
        assert_eq!(&stub.payload[4..11], [0x9E, b' ', b'2', b'0', b'6', b'2', 0x00]);
    }

    #[test]
    fn loader_text() {
        let loader = poke_loader(0xC000, &[1; 17]);
        let lines: Vec<&str> = loader.lines().collect();
        assert_eq!(lines[0], "10 FOR I=0 TO 16:READ B:POKE 49152+I,B:NEXT I");
        assert_eq!(lines[1], "20 SYS 49152");
        assert_eq!(lines[3], "110 DATA 1");
        assert_eq!(poke_loader(0x1000, &[]), "20 SYS 4096");
    }

    #[test]
    fn strategy_name() {
        assert_eq!(Strategy::Append.to_string(), "append");
        assert_eq!(Strategy::Poke.to_string(), "poke");
    }
}
