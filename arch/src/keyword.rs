use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

/// Commodore BASIC V2 keyword and operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(TryFromPrimitive, IntoPrimitive, EnumIter, IntoStaticStr)]
#[repr(u8)]
pub enum Keyword {
    #[strum(serialize = "END")]
    End = 0x80,
    #[strum(serialize = "FOR")]
    For,
    #[strum(serialize = "NEXT")]
    Next,
    #[strum(serialize = "DATA")]
    Data,
    #[strum(serialize = "INPUT#")]
    InputFile,
    #[strum(serialize = "INPUT")]
    Input,
    #[strum(serialize = "DIM")]
    Dim,
    #[strum(serialize = "READ")]
    Read,
    #[strum(serialize = "LET")]
    Let,
    #[strum(serialize = "GOTO")]
    Goto,
    #[strum(serialize = "RUN")]
    Run,
    #[strum(serialize = "IF")]
    If,
    #[strum(serialize = "RESTORE")]
    Restore,
    #[strum(serialize = "GOSUB")]
    Gosub,
    #[strum(serialize = "RETURN")]
    Return,
    #[strum(serialize = "REM")]
    Rem,
    #[strum(serialize = "STOP")]
    Stop,
    #[strum(serialize = "ON")]
    On,
    #[strum(serialize = "WAIT")]
    Wait,
    #[strum(serialize = "LOAD")]
    Load,
    #[strum(serialize = "SAVE")]
    Save,
    #[strum(serialize = "VERIFY")]
    Verify,
    #[strum(serialize = "DEF")]
    Def,
    #[strum(serialize = "POKE")]
    Poke,
    #[strum(serialize = "PRINT#")]
    PrintFile,
    #[strum(serialize = "PRINT")]
    Print,
    #[strum(serialize = "CONT")]
    Cont,
    #[strum(serialize = "LIST")]
    List,
    #[strum(serialize = "CLR")]
    Clr,
    #[strum(serialize = "CMD")]
    Cmd,
    #[strum(serialize = "SYS")]
    Sys,
    #[strum(serialize = "OPEN")]
    Open,
    #[strum(serialize = "CLOSE")]
    Close,
    #[strum(serialize = "GET")]
    Get,
    #[strum(serialize = "NEW")]
    New,
    #[strum(serialize = "TAB(")]
    Tab,
    #[strum(serialize = "TO")]
    To,
    #[strum(serialize = "FN")]
    Fn,
    #[strum(serialize = "SPC(")]
    Spc,
    #[strum(serialize = "THEN")]
    Then,
    #[strum(serialize = "NOT")]
    Not,
    #[strum(serialize = "STEP")]
    Step,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "^")]
    Power,
    #[strum(serialize = "AND")]
    And,
    #[strum(serialize = "OR")]
    Or,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "SGN")]
    Sgn,
    #[strum(serialize = "INT")]
    Int,
    #[strum(serialize = "ABS")]
    Abs,
    #[strum(serialize = "USR")]
    Usr,
    #[strum(serialize = "FRE")]
    Fre,
    #[strum(serialize = "POS")]
    Pos,
    #[strum(serialize = "SQR")]
    Sqr,
    #[strum(serialize = "RND")]
    Rnd,
    #[strum(serialize = "LOG")]
    Log,
    #[strum(serialize = "EXP")]
    Exp,
    #[strum(serialize = "COS")]
    Cos,
    #[strum(serialize = "SIN")]
    Sin,
    #[strum(serialize = "TAN")]
    Tan,
    #[strum(serialize = "ATN")]
    Atn,
    #[strum(serialize = "PEEK")]
    Peek,
    #[strum(serialize = "LEN")]
    Len,
    #[strum(serialize = "STR$")]
    Str,
    #[strum(serialize = "VAL")]
    Val,
    #[strum(serialize = "ASC")]
    Asc,
    #[strum(serialize = "CHR$")]
    Chr,
    #[strum(serialize = "LEFT$")]
    Left,
    #[strum(serialize = "RIGHT$")]
    Right,
    #[strum(serialize = "MID$")]
    Mid,
    #[strum(serialize = "GO")]
    Go,
    // Entered as a single glyph on the C64, never spelled out
    #[strum(serialize = "PI")]
    Pi = 0xFF,
}

/// Keyword texts ordered so that longer texts come before their prefixes
/// (`PRINT#` before `PRINT`, `GOTO` before `GO`).
pub static TOKENS: Lazy<Vec<(&'static str, u8)>> = Lazy::new(|| {
    let mut table: Vec<(&'static str, u8)> = Keyword::iter()
        .filter(|kw| *kw != Keyword::Pi)
        .map(|kw| (kw.text(), kw.into()))
        .collect();
    table.sort_by(|(a, ta), (b, tb)| b.len().cmp(&a.len()).then(ta.cmp(tb)));
    table
});

impl Keyword {
    pub fn text(&self) -> &'static str {
        self.into()
    }

    pub fn byte(&self) -> u8 {
        (*self).into()
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Keyword::try_from(byte).ok()
    }
}
