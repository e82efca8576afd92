use c64asm::basic::{parse_lines, tokenize_line};
use c64asm::compile_basic_v2;
use c64asm::error::{Category, ErrorKind};

fn assert(code: &str, expect: &[u8]) {
    assert_eq!(tokenize_line(code), expect, "{code}");
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            assert($code, &$expect);
        }
    };
}

case!(print_keyword, "PRINT", [0x99]);
case!(
    print_glued_to_identifier,
    "PRINTA=1",
    [b'P', b'R', b'I', b'N', b'T', b'A', 0xB2, b'1']
);
case!(question_mark, "?\"X\"", [0x99, b'"', b'X', b'"']);
case!(lowercase_folds, "print x", [0x99, b' ', b'X']);
case!(string_keeps_case, "PRINT \"Hi\"", [0x99, b' ', b'"', b'H', b'i', b'"']);
case!(keyword_in_string, "\"PRINT\"", [b'"', b'P', b'R', b'I', b'N', b'T', b'"']);
case!(rem_is_verbatim, "REM goto", [0x8F, b' ', b'g', b'o', b't', b'o']);
case!(print_file, "PRINT#1", [0x98, b'1']);
case!(goto_before_go, "GOTO 10", [0x89, b' ', b'1', b'0']);
case!(go_to, "GO TO 10", [0xCB, b' ', 0xA4, b' ', b'1', b'0']);
case!(dollar_function, "A$=STR$(1)", [b'A', b'$', 0xB2, 0xC4, b'(', b'1', b')']);
case!(tab_paren, "PRINT TAB(5)", [0x99, b' ', 0xA3, b'5', b')']);
case!(operators, "A=1+2*3", [b'A', 0xB2, b'1', 0xAA, b'2', 0xAC, b'3']);
case!(
    statements,
    "FOR I=1 TO 9:NEXT",
    [0x81, b' ', b'I', 0xB2, b'1', b' ', 0xA4, b' ', b'9', b':', 0x82]
);
case!(non_ascii, "PRINT \"é\"", [0x99, b' ', b'"', b'?', b'"']);
case!(pi_is_not_spelled, "PI", [b'P', b'I']);

#[test]
fn layout() {
    let prg = compile_basic_v2("10 PRINT \"HI\"\n20 GOTO 10").unwrap();
    #[rustfmt::skip]
    let expect = [
        0x01, 0x08,
        0x0C, 0x08, 0x0A, 0x00, 0x99, 0x20, 0x22, 0x48, 0x49, 0x22, 0x00,
        0x15, 0x08, 0x14, 0x00, 0x89, 0x20, 0x31, 0x30, 0x00,
        0x00, 0x00,
    ];
    assert_eq!(prg, expect);
}

#[test]
fn length_formula() {
    let source = "10 PRINT \"HELLO\"\n20 FOR I=1 TO 10:PRINT I:NEXT\n30 REM done\n40 END";
    let lines = parse_lines(source).unwrap();
    let tokens: usize = lines.iter().map(|l| tokenize_line(&l.text).len()).sum();
    let prg = compile_basic_v2(source).unwrap();
    assert_eq!(prg.len(), 2 + lines.len() * 5 + tokens + 2);

    // Follow the links to the end marker
    let mut addr = 0x0801usize;
    loop {
        let offset = addr - 0x0801 + 2;
        let link = u16::from_le_bytes([prg[offset], prg[offset + 1]]) as usize;
        if link == 0 {
            assert_eq!(offset + 2, prg.len());
            break;
        }
        assert!(link > addr);
        addr = link;
    }
}

#[test]
fn idempotent() {
    let source = "print \"a\"\ngoto 10";
    assert_eq!(compile_basic_v2(source).unwrap(), compile_basic_v2(source).unwrap());
}

#[test]
fn auto_numbering() {
    let lines = parse_lines("PRINT 1\nPRINT 2\nPRINT 3").unwrap();
    let numbers: Vec<u32> = lines.iter().map(|l| l.number).collect();
    assert_eq!(numbers, [10, 20, 30]);
}

#[test]
fn sorted_by_number() {
    let a = compile_basic_v2("20 END\n10 PRINT").unwrap();
    let b = compile_basic_v2("10 PRINT\n20 END").unwrap();
    assert_eq!(a, b);
}

#[test]
fn duplicate_line_number() {
    let err = compile_basic_v2("10 PRINT 1\n10 PRINT 2").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateLineNumber(10)));
    assert_eq!(err.category(), Category::Semantic);
    assert_eq!(err.to_string(), "Line 2: Duplicate line number: 10");
}

#[test]
fn line_number_range() {
    assert!(compile_basic_v2("0 END\n63999 END").is_ok());
    let err = compile_basic_v2("99999999999 END").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LineNumberOutOfRange(_)));
}
