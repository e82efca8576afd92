use crate::assembler::AssembledImage;
use crate::parser::strip_comment;
use crate::symbol::SymbolKind;
use color_print::{cformat, cprintln};

const RULE: &str = "-------------------+-----------------------------------------------------";

fn hex(bytes: &[u8]) -> String {
    let head: Vec<String> = bytes.iter().take(3).map(|b| format!("{b:02X}")).collect();
    let more = if bytes.len() > 3 { "+" } else { "" };
    format!("{}{}", head.join(" "), more)
}

fn highlight(code: &str) -> String {
    let body = strip_comment(code);
    let comment = &code[body.len()..];
    match body.split_once(':') {
        Some((label, rest)) if crate::expr::is_ident(label.trim()) => {
            cformat!("<g>{}:</>{}<dim>{}</>", label, rest, comment)
        }
        _ => cformat!("{}<dim>{}</>", body, comment),
    }
}

/// Print the source side by side with the addresses and bytes it assembled to.
pub fn print_dump(image: &AssembledImage, source: &str) {
    let mut rows = image.listing.iter().peekable();
    println!("{RULE}");
    for (idx, code) in source.lines().enumerate() {
        let line = idx + 1;
        match rows.next_if(|row| row.line == line) {
            Some(row) => println!(
                "[{:04X}] {:<12}| {:>4}: {}",
                row.pc,
                hex(&row.bytes),
                line,
                highlight(code)
            ),
            None => println!("{:19}| {:>4}: {}", "", line, highlight(code)),
        }
    }
    println!("{RULE}");
}

pub fn print_symbols(image: &AssembledImage) {
    for (name, symbol) in image.symbols.iter() {
        match symbol.kind {
            SymbolKind::Label => cprintln!("  <g>{:<16}</> ${:04X}", name, symbol.value),
            SymbolKind::Constant => cprintln!("  <y>{:<16}</> ${:04X}", name, symbol.value),
        }
    }
}
