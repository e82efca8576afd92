use crate::error::ErrorKind;
use crate::expr::Expr;
use crate::symbol::SymbolTable;
use arch::{AddrMode, Mnemonic};

/// Operand as written, before an addressing mode is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    /// `A`
    Acc,
    /// `#expr`
    Imm(Expr),
    /// `expr`
    Direct(Expr),
    /// `expr,X`
    IndexX(Expr),
    /// `expr,Y`
    IndexY(Expr),
    /// `(expr)`
    Ind(Expr),
    /// `(expr,X)`
    IndX(Expr),
    /// `(expr),Y`
    IndY(Expr),
}

impl Operand {
    pub fn parse(mnemonic: Mnemonic, text: &str) -> Result<Operand, ErrorKind> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Operand::None);
        }
        if text.eq_ignore_ascii_case("A") && mnemonic.supports(AddrMode::Acc) {
            return Ok(Operand::Acc);
        }
        if let Some(imm) = text.strip_prefix('#') {
            return Ok(Operand::Imm(Expr::parse(imm)?));
        }

        // (expr) / (expr,X)
        if text.starts_with('(') && closing_paren(text) == Some(text.len() - 1) {
            let inner = &text[1..text.len() - 1];
            return match split_index(inner) {
                Some((base, reg)) if reg.eq_ignore_ascii_case("X") => {
                    Ok(Operand::IndX(Expr::parse(base)?))
                }
                Some((_, reg)) => Err(ErrorKind::Syntax(format!(
                    "Invalid index register `{reg}` in indexed-indirect operand"
                ))),
                None => Ok(Operand::Ind(Expr::parse(inner)?)),
            };
        }

        match split_index(text) {
            Some((base, reg)) => {
                let base = base.trim();
                if reg.eq_ignore_ascii_case("Y") {
                    // (expr),Y
                    if base.starts_with('(') && closing_paren(base) == Some(base.len() - 1) {
                        return Ok(Operand::IndY(Expr::parse(&base[1..base.len() - 1])?));
                    }
                    Ok(Operand::IndexY(Expr::parse(base)?))
                } else if reg.eq_ignore_ascii_case("X") {
                    Ok(Operand::IndexX(Expr::parse(base)?))
                } else {
                    Err(ErrorKind::Syntax(format!("Invalid index register `{reg}`")))
                }
            }
            None => Ok(Operand::Direct(Expr::parse(text)?)),
        }
    }

    pub fn expr(&self) -> Option<&Expr> {
        match self {
            Operand::None | Operand::Acc => None,
            Operand::Imm(e)
            | Operand::Direct(e)
            | Operand::IndexX(e)
            | Operand::IndexY(e)
            | Operand::Ind(e)
            | Operand::IndX(e)
            | Operand::IndY(e) => Some(e),
        }
    }
}

/// Byte index of the `)` closing the `(` at the start of `s`.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `base,REG` at the last comma.
fn split_index(s: &str) -> Option<(&str, &str)> {
    s.rsplit_once(',').map(|(base, reg)| (base, reg.trim()))
}

/// Choose the addressing mode for `mnemonic` with `operand` at `pc`.
///
/// Called with identical arguments in both passes, so it must not look at
/// symbols: an operand that names any symbol gets the absolute form whenever
/// the mnemonic has one, otherwise its zero-page form. Symbol-free operands
/// are evaluated on the spot and take the zero-page form only when they fit;
/// a wide one asks for the absolute form even if the mnemonic lacks it.
pub fn select_mode(mnemonic: Mnemonic, operand: &Operand, pc: i32) -> Result<AddrMode, ErrorKind> {
    let mode = match operand {
        Operand::None if mnemonic.supports(AddrMode::Imp) => AddrMode::Imp,
        Operand::None if mnemonic.supports(AddrMode::Acc) => AddrMode::Acc,
        Operand::None => return Err(ErrorKind::MissingOperand(mnemonic.to_string())),
        Operand::Acc => AddrMode::Acc,
        Operand::Imm(_) => AddrMode::Imm,
        Operand::Ind(_) => AddrMode::Ind,
        Operand::IndX(_) => AddrMode::Indx,
        Operand::IndY(_) => AddrMode::Indy,
        Operand::Direct(_) if mnemonic.is_branch() => AddrMode::Rel,
        Operand::Direct(e) => width(mnemonic, e, pc, AddrMode::Zp, AddrMode::Abs),
        Operand::IndexX(e) => width(mnemonic, e, pc, AddrMode::Zpx, AddrMode::Absx),
        Operand::IndexY(e) => width(mnemonic, e, pc, AddrMode::Zpy, AddrMode::Absy),
    };
    if !mnemonic.supports(mode) {
        return Err(ErrorKind::UnsupportedMode(
            mnemonic.to_string(),
            mode.to_string(),
        ));
    }
    Ok(mode)
}

fn width(mnemonic: Mnemonic, expr: &Expr, pc: i32, zp: AddrMode, abs: AddrMode) -> AddrMode {
    let fits_zp = !expr.has_symbols()
        && matches!(expr.eval(&SymbolTable::new(), pc), Ok(v) if (0..=0xFF).contains(&v));
    match (mnemonic.supports(zp), mnemonic.supports(abs)) {
        (true, true) if fits_zp => zp,
        (true, false) if fits_zp || expr.has_symbols() => zp,
        _ => abs,
    }
}
