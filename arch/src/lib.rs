pub mod keyword;
pub mod mode;
pub mod opcode;
pub mod petscii;

pub use keyword::Keyword;
pub use mode::AddrMode;
pub use opcode::Mnemonic;
