pub mod assembler;
pub mod basic;
pub mod error;
pub mod expr;
pub mod listing;
pub mod operand;
pub mod parser;
pub mod prg;
pub mod symbol;
pub mod util;

pub use assembler::{assemble, AssembledImage, DEFAULT_ORIGIN};
pub use basic::compile_basic_v2;
pub use error::{Error, ErrorKind, Result};
pub use expr::evaluate;
pub use prg::{build_runnable_prg, Prg, RunnablePrg, Strategy};
