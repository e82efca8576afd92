use crate::error::{Error, ErrorKind, Result};
use crate::prg::Prg;
use arch::keyword::TOKENS;
use arch::{petscii, Keyword};

/// Load address of a BASIC program.
pub const BASIC_START: u16 = 0x0801;

pub const MAX_LINE_NUMBER: u32 = 63999;

const AUTO_STEP: u32 = 10;

// ----------------------------------------------------------------------------
// Source lines

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: u32,
    pub text: String,
    /// 1-based line in the source text, for diagnostics.
    pub line: usize,
}

/// Split `source` into numbered lines, sorted by number.
///
/// Lines without a leading number get the previous number plus 10
/// (the first one gets 10).
pub fn parse_lines(source: &str) -> Result<Vec<SourceLine>> {
    let source = source.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<SourceLine> = Vec::new();
    let mut next = AUTO_STEP;
    for (idx, raw) in source.split('\n').enumerate() {
        let code = raw.trim_end();
        if code.trim_start().is_empty() {
            continue;
        }
        let code = code.trim_start();
        let digits = code.len() - code.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let number = if digits == 0 {
            next
        } else {
            code[..digits]
                .parse::<u32>()
                .ok()
                .filter(|n| *n <= MAX_LINE_NUMBER)
                .ok_or_else(|| {
                    Error::new(ErrorKind::LineNumberOutOfRange(code[..digits].to_string()))
                        .at_line(idx + 1)
                })?
        };
        if number > MAX_LINE_NUMBER {
            let kind = ErrorKind::LineNumberOutOfRange(number.to_string());
            return Err(Error::new(kind).at_line(idx + 1));
        }
        next = number + AUTO_STEP;
        lines.push(SourceLine {
            number,
            text: code[digits..].trim_start().to_string(),
            line: idx + 1,
        });
    }

    lines.sort_by_key(|l| l.number);
    for pair in lines.windows(2) {
        if pair[0].number == pair[1].number {
            let line = pair[0].line.max(pair[1].line);
            return Err(Error::new(ErrorKind::DuplicateLineNumber(pair[1].number)).at_line(line));
        }
    }
    Ok(lines)
}

// ----------------------------------------------------------------------------
// Tokenizer

fn match_keyword(chars: &[char], pos: usize) -> Option<(usize, u8)> {
    let prev = pos.checked_sub(1).map(|i| chars[i]);
    TOKENS.iter().find_map(|(text, byte)| {
        let len = text.chars().count();
        let candidate = chars.get(pos..pos + len)?;
        if !candidate
            .iter()
            .zip(text.chars())
            .all(|(c, t)| c.to_ascii_uppercase() == t)
        {
            return None;
        }
        let first = text.chars().next()?;
        let last = text.chars().last()?;
        if first.is_ascii_alphabetic() && prev.is_some_and(petscii::is_ident_char) {
            return None;
        }
        let follow = chars.get(pos + len).copied();
        if petscii::is_ident_char(last) && follow.is_some_and(petscii::is_ident_char) {
            return None;
        }
        Some((len, *byte))
    })
}

/// Tokenize the text of one line (without its number).
pub fn tokenize_line(text: &str) -> Vec<u8> {
    let chars: Vec<char> = text.chars().collect();
    let mut bin = Vec::with_capacity(chars.len());
    let mut in_string = false;
    let mut in_rem = false;

    let mut pos = 0;
    while pos < chars.len() {
        let ch = chars[pos];
        if in_rem {
            bin.push(petscii::passthrough(ch));
        } else if in_string {
            bin.push(petscii::passthrough(ch));
            in_string = ch != '"';
        } else if ch == '"' {
            bin.push(b'"');
            in_string = true;
        } else if ch == '?' {
            bin.push(Keyword::Print.byte());
        } else if let Some((len, byte)) = match_keyword(&chars, pos) {
            bin.push(byte);
            in_rem = byte == Keyword::Rem.byte();
            pos += len;
            continue;
        } else {
            bin.push(petscii::fold(ch));
        }
        pos += 1;
    }
    bin
}

// ----------------------------------------------------------------------------
// Packer

/// Link the tokenized lines into a program image loaded at [`BASIC_START`].
pub fn pack(lines: &[SourceLine]) -> Result<Prg> {
    let mut payload = Vec::new();
    let mut addr = BASIC_START as u32;
    for line in lines {
        let number = line.number as u16;
        let mut body = number.to_le_bytes().to_vec();
        body.extend(tokenize_line(&line.text));
        body.push(0x00);

        let link = addr + 2 + body.len() as u32;
        // Leave room for the end marker
        if link + 2 > 0x1_0000 {
            return Err(Error::new(ErrorKind::AddressOverflow).at_line(line.line));
        }
        payload.extend((link as u16).to_le_bytes());
        payload.extend(body);
        addr = link;
    }
    payload.extend([0x00, 0x00]);
    Ok(Prg::new(BASIC_START, payload))
}

pub fn compile_program(source: &str) -> Result<Prg> {
    pack(&parse_lines(source)?)
}

/// Compile BASIC V2 source to PRG bytes (load address header included).
pub fn compile_basic_v2(source: &str) -> Result<Vec<u8>> {
    Ok(compile_program(source)?.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let prg = compile_basic_v2("10 PRINT").unwrap();
        assert_eq!(
            prg,
            [0x01, 0x08, 0x07, 0x08, 0x0A, 0x00, 0x99, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn boundary() {
        assert_eq!(tokenize_line("PRINTA=1"), [b'P', b'R', b'I', b'N', b'T', b'A', 0xB2, b'1']);
        assert_eq!(tokenize_line("GOTO10"), b"GOTO10");
        assert_eq!(tokenize_line("print a"), [0x99, b' ', b'A']);
        assert_eq!(tokenize_line("PRINT#1"), [0x98, b'1']);
        assert_eq!(tokenize_line("A=LEN(B$)"), [b'A', 0xB2, 0xC3, b'(', b'B', b'$', b')']);
    }

    #[test]
    fn strings_and_rem() {
        assert_eq!(
            tokenize_line("? \"hi?\""),
            [0x99, b' ', b'"', b'h', b'i', b'?', b'"']
        );
        assert_eq!(
            tokenize_line("REM print x"),
            [0x8F, b' ', b'p', b'r', b'i', b'n', b't', b' ', b'x']
        );
        assert_eq!(tokenize_line("PRINT \"\t\""), [0x99, b' ', b'"', b'?', b'"']);
    }

    #[test]
    fn auto_numbering() {
        let lines = parse_lines("PRINT 1\nPRINT 2\n\n  \r\n100 END\nSTOP").unwrap();
        let numbers: Vec<u32> = lines.iter().map(|l| l.number).collect();
        assert_eq!(numbers, [10, 20, 100, 110]);
        assert_eq!(lines[2].text, "END");
    }

    #[test]
    fn sorted() {
        let lines = parse_lines("20 B\n10 A").unwrap();
        assert_eq!(lines[0].text, "A");
        assert_eq!(lines[1].line, 1);
    }

    #[test]
    fn line_number_errors() {
        let err = compile_basic_v2("10 PRINT 1\n10 PRINT 2").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateLineNumber(10)));
        assert_eq!(err.line, Some(2));

        let err = compile_basic_v2("64000 END").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::LineNumberOutOfRange(_)));
        assert_eq!(err.to_string(), "Line 1: Line number out of range: 64000 (must be 0-63999)");

        let err = compile_basic_v2("63999 END\nSTOP").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::LineNumberOutOfRange(_)));
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn program_past_top_of_memory() {
        let source = format!("10 REM {}\n20 REM {}", "X".repeat(0xF000), "X".repeat(0x1000));
        let err = compile_basic_v2(&source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AddressOverflow));
        assert_eq!(err.line, Some(2));
        assert_eq!(err.category(), crate::error::Category::Constraint);

        let fits = format!("10 REM {}", "X".repeat(0xF000));
        assert!(compile_basic_v2(&fits).is_ok());
    }

    #[test]
    fn empty_program() {
        assert_eq!(compile_basic_v2("").unwrap(), [0x01, 0x08, 0x00, 0x00]);
    }
}
