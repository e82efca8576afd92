use crate::expr::ExprError;
use color_print::cprintln;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Syntax,
    Semantic,
    Constraint,
    Internal,
    Io,
}

/// A non-fatal diagnostic; the image is still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

impl Warning {
    pub fn print(&self) {
        cprintln!("<y,s>warning</>: {}", self);
    }
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    // Syntax
    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Missing operand for `{0}`")]
    MissingOperand(String),

    #[error("Unterminated string literal")]
    UnterminatedString,

    // Semantic
    #[error("Unknown mnemonic or directive: `{0}`")]
    UnknownMnemonic(String),

    #[error("Addressing mode `{1}` not supported for `{0}`")]
    UnsupportedMode(String, String),

    #[error("Duplicate symbol: `{0}`")]
    DuplicateSymbol(String),

    #[error("Duplicate line number: {0}")]
    DuplicateLineNumber(u32),

    #[error("Line number out of range: {0} (must be 0-63999)")]
    LineNumberOutOfRange(String),

    // Constraint
    #[error("Branch target out of range: offset {0} (must be -128..127)")]
    BranchOutOfRange(i32),

    #[error("Operand ${0:X} does not fit in zero page")]
    ZeroPageOverflow(i32),

    #[error("Origin ${0:04X} does not match program counter ${1:04X} after output started")]
    OriginMismatch(i32, u32),

    #[error("Origin directive is not allowed here")]
    OriginForbidden,

    #[error("Origin ${0:X} is outside the 16-bit address space")]
    OriginOutOfRange(i32),

    #[error("Program counter overflow past $FFFF")]
    AddressOverflow,

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),

    // Io (front-end only)
    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Invalid PRG: {0}")]
    InvalidPrg(String),

    #[error("Failed to write report: {0}")]
    Report(#[from] serde_yaml::Error),
}

impl ErrorKind {
    pub fn category(&self) -> Category {
        use ErrorKind::*;
        match self {
            Expr(ExprError::UnknownSymbol(_)) => Category::Semantic,
            Expr(_) | Syntax(_) | MissingOperand(_) | UnterminatedString => Category::Syntax,
            UnknownMnemonic(_)
            | UnsupportedMode(_, _)
            | DuplicateSymbol(_)
            | DuplicateLineNumber(_)
            | LineNumberOutOfRange(_) => Category::Semantic,
            BranchOutOfRange(_)
            | ZeroPageOverflow(_)
            | OriginMismatch(_, _)
            | OriginForbidden
            | OriginOutOfRange(_)
            | AddressOverflow => Category::Constraint,
            Internal(_) => Category::Internal,
            FileOpen(_, _) | FileWrite(_, _) | InvalidPrg(_) | Report(_) => Category::Io,
        }
    }
}

/// Compile error, optionally tagged with the 1-based source line it concerns.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub line: Option<usize>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind, line: None }
    }

    /// Tag with `line` unless a deeper call already did.
    pub fn at_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn is_internal(&self) -> bool {
        self.category() == Category::Internal
    }

    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, file: &str, source: &str) {
        cprintln!("<red,bold>error</>: {}", self.kind);

        let Some(line_num) = self.line else {
            cprintln!("     <blue>--></> <underline>{}</>", file);
            return;
        };
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
        cprintln!("      <blue>|</>");

        let line_content = source
            .lines()
            .nth(line_num.saturating_sub(1))
            .unwrap_or("");

        cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
        cprintln!("      <blue>|</>");
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<ExprError> for Error {
    fn from(err: ExprError) -> Self {
        Error::new(err.into())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::new(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_tag_wins() {
        let err = Error::new(ErrorKind::DuplicateSymbol("loop".into()))
            .at_line(3)
            .at_line(7);
        assert_eq!(err.line, Some(3));
        assert_eq!(err.to_string(), "Line 3: Duplicate symbol: `loop`");
    }

    #[test]
    fn untagged_display() {
        let err = Error::from(ErrorKind::AddressOverflow);
        assert_eq!(err.line, None);
        assert_eq!(err.to_string(), "Program counter overflow past $FFFF");
    }

    #[test]
    fn internal_is_distinct() {
        let err = Error::new(ErrorKind::Internal("mode changed".into())).at_line(1);
        assert_eq!(err.category(), Category::Internal);
        assert!(err.is_internal());

        let user = Error::new(ErrorKind::BranchOutOfRange(200));
        assert_eq!(user.category(), Category::Constraint);
        assert!(!user.is_internal());
    }

    #[test]
    fn expr_errors_convert() {
        let err = Error::from(ExprError::UnknownSymbol("foo".into()));
        assert_eq!(err.category(), Category::Semantic);
        let err = Error::from(ExprError::Parse("Empty expression".into()));
        assert_eq!(err.category(), Category::Syntax);
    }
}
