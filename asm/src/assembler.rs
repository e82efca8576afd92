use crate::error::{Error, ErrorKind, Result, Warning};
use crate::expr::Expr;
use crate::operand::{select_mode, Operand};
use crate::parser::{Body, DataArg, DataKind, Line};
use crate::prg::Prg;
use crate::symbol::{SymbolKind, SymbolTable};
use arch::{AddrMode, Mnemonic};
use serde::Serialize;

/// Origin used when the caller supplies none.
pub const DEFAULT_ORIGIN: u16 = 0xC000;

const ADDRESS_SPACE: u32 = 0x1_0000;

/// Output of one successful assembly.
#[derive(Debug, Clone)]
pub struct AssembledImage {
    pub origin: u16,
    /// True if the source placed itself with `.org` / `*=`.
    pub explicit_origin: bool,
    pub bytes: Vec<u8>,
    pub symbols: SymbolTable,
    pub listing: Vec<ListingRow>,
    pub warnings: Vec<Warning>,
}

/// One byte-emitting statement, for listings and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub line: usize,
    pub pc: u16,
    pub bytes: Vec<u8>,
    pub source: String,
}

impl AssembledImage {
    /// Address one past the last emitted byte.
    pub fn end(&self) -> u32 {
        self.origin as u32 + self.bytes.len() as u32
    }

    pub fn to_prg(&self) -> Prg {
        Prg::new(self.origin, self.bytes.clone())
    }
}

// ----------------------------------------------------------------------------
// Statement

#[derive(Debug, Clone)]
struct Stmt {
    line: usize,
    pc: u32,
    kind: StmtKind,
}

#[derive(Debug, Clone)]
enum StmtKind {
    Label(String),
    Equ(String, i32),
    Data {
        kind: DataKind,
        size: u32,
        args: Vec<DataArg>,
    },
    Instruction {
        mnemonic: Mnemonic,
        mode: AddrMode,
        operand: Operand,
    },
}

impl StmtKind {
    fn size(&self) -> u32 {
        match self {
            StmtKind::Label(_) | StmtKind::Equ(_, _) => 0,
            StmtKind::Data { size, .. } => *size,
            StmtKind::Instruction { mode, .. } => mode.len() as u32,
        }
    }
}

// ----------------------------------------------------------------------------
// Pass 1: placement

struct Placement {
    pc: u32,
    origin: u32,
    explicit_origin: bool,
    emitted: bool,
    forbid_origin: bool,
    symbols: SymbolTable,
    stmts: Vec<Stmt>,
    warnings: Vec<Warning>,
}

impl Placement {
    fn new(origin: u16, forbid_origin: bool) -> Self {
        Placement {
            pc: origin as u32,
            origin: origin as u32,
            explicit_origin: false,
            emitted: false,
            forbid_origin,
            symbols: SymbolTable::new(),
            stmts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn place(&mut self, line: usize, code: &str) -> std::result::Result<(), ErrorKind> {
        let Line { label, body } = Line::parse(code)?;
        let pc = self.pc as i32;

        if let Some(name) = label {
            self.symbols.define(&name, pc, SymbolKind::Label, line)?;
            self.push(line, StmtKind::Label(name))?;
        }

        match body {
            None => Ok(()),
            Some(Body::Equ(name, expr)) => {
                let value = expr.eval(&self.symbols, pc)?;
                self.symbols.define(&name, value, SymbolKind::Constant, line)?;
                self.push(line, StmtKind::Equ(name, value))
            }
            Some(Body::Org(expr)) => self.set_origin(line, &expr),
            Some(Body::Data(kind, args)) => {
                let size = kind.size(&args);
                self.push(line, StmtKind::Data { kind, size, args })
            }
            Some(Body::Instruction(mnemonic, operand)) => {
                let mode = select_mode(mnemonic, &operand, pc)?;
                self.push(
                    line,
                    StmtKind::Instruction {
                        mnemonic,
                        mode,
                        operand,
                    },
                )
            }
        }
    }

    fn set_origin(&mut self, line: usize, expr: &Expr) -> std::result::Result<(), ErrorKind> {
        if self.forbid_origin {
            return Err(ErrorKind::OriginForbidden);
        }
        let value = expr.eval(&self.symbols, self.pc as i32)?;
        if !(0..ADDRESS_SPACE as i32).contains(&value) {
            return Err(ErrorKind::OriginOutOfRange(value));
        }
        if self.emitted {
            // Output is one contiguous block: a later origin may only restate the PC
            if value as u32 != self.pc {
                return Err(ErrorKind::OriginMismatch(value, self.pc));
            }
            return Ok(());
        }
        if value as u32 != self.pc {
            // Labels above a moving origin still hold the old PC
            for stmt in self.stmts.iter().filter(|stmt| stmt.pc == self.pc) {
                if let StmtKind::Label(name) = &stmt.kind {
                    self.warnings.push(Warning {
                        line,
                        message: format!(
                            "label `{name}` (line {}) keeps ${:04X} from before the origin moved",
                            stmt.line, stmt.pc
                        ),
                    });
                }
            }
        }
        self.pc = value as u32;
        self.origin = value as u32;
        self.explicit_origin = true;
        Ok(())
    }

    fn push(&mut self, line: usize, kind: StmtKind) -> std::result::Result<(), ErrorKind> {
        let size = kind.size();
        if self.pc + size > ADDRESS_SPACE {
            return Err(ErrorKind::AddressOverflow);
        }
        self.stmts.push(Stmt {
            line,
            pc: self.pc,
            kind,
        });
        if size > 0 {
            self.emitted = true;
            self.pc += size;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Pass 2: encoding

fn encode_instruction(
    mnemonic: Mnemonic,
    mode: AddrMode,
    operand: &Operand,
    symbols: &SymbolTable,
    pc: i32,
) -> std::result::Result<Vec<u8>, ErrorKind> {
    let opcode = mnemonic
        .opcode(mode)
        .ok_or_else(|| ErrorKind::UnsupportedMode(mnemonic.to_string(), mode.to_string()))?;
    let value = match operand.expr() {
        Some(expr) => expr.eval(symbols, pc)?,
        None => 0,
    };

    let mut bin = vec![opcode];
    match mode {
        AddrMode::Imp | AddrMode::Acc => {}
        AddrMode::Imm => bin.push(value as u8),
        AddrMode::Rel => {
            let offset = value.wrapping_sub(pc + 2);
            if !(-128..=127).contains(&offset) {
                return Err(ErrorKind::BranchOutOfRange(offset));
            }
            bin.push(offset as i8 as u8);
        }
        mode if mode.is_zero_page() => {
            if !(0..=0xFF).contains(&value) {
                return Err(ErrorKind::ZeroPageOverflow(value));
            }
            bin.push(value as u8);
        }
        _ => bin.extend((value as u16).to_le_bytes()),
    }
    Ok(bin)
}

fn encode_data(
    kind: DataKind,
    args: &[DataArg],
    symbols: &SymbolTable,
    pc: i32,
) -> std::result::Result<Vec<u8>, ErrorKind> {
    let mut bin = Vec::new();
    for arg in args {
        match arg {
            DataArg::Text(text) => bin.extend(text),
            DataArg::Expr(expr) => {
                let value = expr.eval(symbols, pc)?;
                match kind {
                    DataKind::Word => bin.extend((value as u16).to_le_bytes()),
                    DataKind::Byte | DataKind::Text => bin.push(value as u8),
                }
            }
        }
    }
    Ok(bin)
}

fn internal(stmt: &Stmt, what: String) -> Error {
    Error::new(ErrorKind::Internal(what)).at_line(stmt.line)
}

/// A statement that defined `name` must find it unchanged in the final table.
fn check_symbol(
    stmt: &Stmt,
    symbols: &SymbolTable,
    name: &str,
    value: i32,
    kind: SymbolKind,
) -> Result<()> {
    match symbols.symbol(name) {
        Some(sym) if sym.value == value && sym.kind == kind && sym.line == stmt.line => Ok(()),
        Some(sym) => Err(internal(
            stmt,
            format!("symbol `{name}` recorded as {value} but table holds {}", sym.value),
        )),
        None => Err(internal(stmt, format!("symbol `{name}` missing from table"))),
    }
}

// ----------------------------------------------------------------------------
// Entry point

/// Assemble `source` into a flat image.
///
/// `origin` seeds the program counter (default [`DEFAULT_ORIGIN`]). With
/// `forbid_origin`, any `.org` / `*=` in the source is an error.
pub fn assemble(source: &str, origin: Option<u16>, forbid_origin: bool) -> Result<AssembledImage> {
    let lines: Vec<&str> = source.lines().collect();

    // 1. Place statements and define symbols
    let mut placement = Placement::new(origin.unwrap_or(DEFAULT_ORIGIN), forbid_origin);
    for (idx, code) in lines.iter().enumerate() {
        placement
            .place(idx + 1, code)
            .map_err(|e| Error::from(e).at_line(idx + 1))?;
    }
    let Placement {
        pc: end,
        origin,
        explicit_origin,
        symbols,
        stmts,
        warnings,
        ..
    } = placement;

    // 2. Encode with the complete symbol table
    let mut bytes = Vec::with_capacity((end - origin) as usize);
    let mut listing = Vec::new();
    let mut pc = origin;
    for stmt in &stmts {
        let bin = match &stmt.kind {
            StmtKind::Label(name) => {
                check_symbol(stmt, &symbols, name, stmt.pc as i32, SymbolKind::Label)?;
                continue;
            }
            StmtKind::Equ(name, value) => {
                check_symbol(stmt, &symbols, name, *value, SymbolKind::Constant)?;
                continue;
            }
            StmtKind::Data { kind, args, .. } => encode_data(*kind, args, &symbols, pc as i32),
            StmtKind::Instruction {
                mnemonic,
                mode,
                operand,
            } => {
                let reselected = select_mode(*mnemonic, operand, pc as i32)
                    .map_err(|e| Error::from(e).at_line(stmt.line))?;
                if reselected != *mode {
                    return Err(internal(
                        stmt,
                        format!("addressing mode changed between passes ({mode} -> {reselected})"),
                    ));
                }
                encode_instruction(*mnemonic, *mode, operand, &symbols, pc as i32)
            }
        }
        .map_err(|e| Error::from(e).at_line(stmt.line))?;

        if stmt.pc != pc {
            return Err(internal(
                stmt,
                format!("placed at ${:04X} in pass 1 but ${:04X} in pass 2", stmt.pc, pc),
            ));
        }
        if bin.len() as u32 != stmt.kind.size() {
            return Err(internal(
                stmt,
                format!("sized {} bytes but encoded {}", stmt.kind.size(), bin.len()),
            ));
        }

        listing.push(ListingRow {
            line: stmt.line,
            pc: pc as u16,
            bytes: bin.clone(),
            source: lines[stmt.line - 1].to_string(),
        });
        pc += bin.len() as u32;
        bytes.extend(bin);
    }

    Ok(AssembledImage {
        origin: origin as u16,
        explicit_origin,
        bytes,
        symbols,
        listing,
        warnings,
    })
}
