use crate::error::ErrorKind;
use crate::expr::{is_ident, Expr};
use crate::operand::Operand;
use arch::{petscii, Mnemonic};
use once_cell::sync::Lazy;
use std::collections::HashMap;

// ----------------------------------------------------------------------------
// Source line

/// One source line: an optional `name:` label followed by an optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: Option<String>,
    pub body: Option<Body>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `name = expr`
    Equ(String, Expr),
    /// `* = expr` / `.org expr`
    Org(Expr),
    Data(DataKind, Vec<DataArg>),
    Instruction(Mnemonic, Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Byte,
    Word,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataArg {
    Expr(Expr),
    Text(Vec<u8>),
}

#[derive(Debug, Clone, Copy)]
enum Directive {
    Org,
    Data(DataKind),
}

static DIRECTIVES: Lazy<HashMap<&'static str, Directive>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for name in [".org", "!org"] {
        map.insert(name, Directive::Org);
    }
    for name in [".byte", ".db", ".by", "!byte", "!by"] {
        map.insert(name, Directive::Data(DataKind::Byte));
    }
    for name in [".word", ".dw", ".wo", "!word", "!wo"] {
        map.insert(name, Directive::Data(DataKind::Word));
    }
    for name in [".text", ".ascii", ".tx", "!text", "!tx"] {
        map.insert(name, Directive::Data(DataKind::Text));
    }
    map
});

impl Line {
    pub fn parse(code: &str) -> Result<Line, ErrorKind> {
        let code = strip_comment(code).trim();
        let (label, rest) = split_label(code);
        let rest = rest.trim();
        let body = if rest.is_empty() {
            None
        } else {
            Some(Body::parse(rest)?)
        };
        Ok(Line { label, body })
    }
}

impl Body {
    fn parse(code: &str) -> Result<Body, ErrorKind> {
        // * = expr
        if let Some(rest) = code.strip_prefix('*') {
            if let Some(expr) = rest.trim_start().strip_prefix('=') {
                return Ok(Body::Org(Expr::parse(expr)?));
            }
        }

        let (head, args) = match code.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (code, ""),
        };

        // name = expr
        if let Some((name, expr)) = code.split_once('=') {
            let name = name.trim();
            if is_ident(name) && !DIRECTIVES.contains_key(name.to_ascii_lowercase().as_str()) {
                return Ok(Body::Equ(name.to_string(), Expr::parse(expr)?));
            }
        }

        if head.starts_with('.') || head.starts_with('!') {
            return match DIRECTIVES.get(head.to_ascii_lowercase().as_str()) {
                Some(Directive::Org) => {
                    if args.is_empty() {
                        return Err(ErrorKind::MissingOperand(head.to_string()));
                    }
                    Ok(Body::Org(Expr::parse(args)?))
                }
                Some(Directive::Data(kind)) => {
                    Ok(Body::Data(*kind, parse_data(*kind, head, args)?))
                }
                None => Err(ErrorKind::UnknownMnemonic(head.to_string())),
            };
        }

        let mnemonic =
            Mnemonic::parse(head).map_err(|_| ErrorKind::UnknownMnemonic(head.to_string()))?;
        Ok(Body::Instruction(mnemonic, Operand::parse(mnemonic, args)?))
    }
}

// ----------------------------------------------------------------------------
// Data directives

fn parse_data(kind: DataKind, head: &str, args: &str) -> Result<Vec<DataArg>, ErrorKind> {
    if args.is_empty() {
        return Err(ErrorKind::MissingOperand(head.to_string()));
    }
    split_args(args)?
        .into_iter()
        .map(|arg| {
            let arg = arg.trim();
            if arg.is_empty() {
                return Err(ErrorKind::Syntax(format!("Empty argument in `{head}`")));
            }
            match arg.strip_prefix('"') {
                Some(quoted) => {
                    if kind == DataKind::Word {
                        return Err(ErrorKind::Syntax(format!(
                            "String argument not allowed in `{head}`"
                        )));
                    }
                    let text = quoted.strip_suffix('"').ok_or(ErrorKind::UnterminatedString)?;
                    Ok(DataArg::Text(text.chars().map(petscii::passthrough).collect()))
                }
                None => Ok(DataArg::Expr(Expr::parse(arg)?)),
            }
        })
        .collect()
}

impl DataKind {
    /// Bytes emitted for `args`.
    pub fn size(&self, args: &[DataArg]) -> u32 {
        args.iter()
            .map(|arg| match (self, arg) {
                (_, DataArg::Text(bytes)) => bytes.len() as u32,
                (DataKind::Word, DataArg::Expr(_)) => 2,
                (_, DataArg::Expr(_)) => 1,
            })
            .sum()
    }
}

/// Split at commas outside double quotes.
fn split_args(args: &str) -> Result<Vec<&str>, ErrorKind> {
    let mut items = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (idx, ch) in args.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(&args[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err(ErrorKind::UnterminatedString);
    }
    items.push(&args[start..]);
    Ok(items)
}

// ----------------------------------------------------------------------------
// Helpers

/// Drop a `;` comment, ignoring semicolons inside double quotes.
pub(crate) fn strip_comment(code: &str) -> &str {
    let mut quoted = false;
    for (idx, ch) in code.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ';' if !quoted => return &code[..idx],
            _ => {}
        }
    }
    code
}

/// `main: rest` -> (Some("main"), "rest")
fn split_label(code: &str) -> (Option<String>, &str) {
    if let Some((label, rest)) = code.split_once(':') {
        let label = label.trim();
        if is_ident(label) {
            return (Some(label.to_string()), rest);
        }
    }
    (None, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> Line {
        Line::parse(code).unwrap()
    }

    #[test]
    fn blank_and_comment() {
        assert_eq!(parse("   ; nothing here"), Line { label: None, body: None });
        assert_eq!(parse(""), Line { label: None, body: None });
    }

    #[test]
    fn label_alone_and_with_statement() {
        assert_eq!(parse("start:").label.as_deref(), Some("start"));
        let line = parse("loop: dex ; count down");
        assert_eq!(line.label.as_deref(), Some("loop"));
        assert_eq!(
            line.body,
            Some(Body::Instruction(Mnemonic::DEX, Operand::None))
        );
    }

    #[test]
    fn constants_and_origin() {
        assert_eq!(
            parse("chrout = $FFD2").body,
            Some(Body::Equ("chrout".into(), Expr::Number(0xFFD2)))
        );
        assert_eq!(parse("*=$C000").body, Some(Body::Org(Expr::Number(0xC000))));
        assert_eq!(parse("  * = $1000").body, Some(Body::Org(Expr::Number(0x1000))));
        assert_eq!(parse(".ORG 4096").body, Some(Body::Org(Expr::Number(4096))));
    }

    #[test]
    fn data_directives() {
        match parse(r#"msg: .text "HI; there", 13, 0"#).body {
            Some(Body::Data(DataKind::Text, args)) => {
                assert_eq!(DataKind::Text.size(&args), 11);
                assert_eq!(args[0], DataArg::Text(b"HI; there".to_vec()));
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse("!word start, $0400").body {
            Some(Body::Data(DataKind::Word, args)) => assert_eq!(DataKind::Word.size(&args), 4),
            other => panic!("unexpected {other:?}"),
        }
        match parse(".db 1,2,3").body {
            Some(Body::Data(DataKind::Byte, args)) => assert_eq!(DataKind::Byte.size(&args), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn errors() {
        assert!(matches!(Line::parse("foo #1"), Err(ErrorKind::UnknownMnemonic(_))));
        assert!(matches!(Line::parse(".macro x"), Err(ErrorKind::UnknownMnemonic(_))));
        assert!(matches!(Line::parse(".byte"), Err(ErrorKind::MissingOperand(_))));
        assert!(matches!(Line::parse(".byte 1,,2"), Err(ErrorKind::Syntax(_))));
        assert!(matches!(Line::parse(r#".word "AB""#), Err(ErrorKind::Syntax(_))));
        assert!(matches!(Line::parse(r#".text "AB"#), Err(ErrorKind::UnterminatedString)));
        assert!(matches!(Line::parse("lda #"), Err(ErrorKind::Expr(_))));
    }
}
