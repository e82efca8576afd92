use c64asm::error::{Error, ErrorKind, Result, Warning};
use c64asm::listing::{disassemble, parse_basic_prg, ListMode};
use c64asm::symbol::SymbolTable;
use c64asm::util::{print_dump, print_symbols};
use c64asm::{assemble, build_runnable_prg, compile_basic_v2, Prg, Strategy};
use color_print::cprintln;
use serde::Serialize;
use std::path::Path;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Compile BASIC V2 source to a PRG
    Basic {
        /// Input file
        input: String,

        /// Output file [default: input with .prg extension]
        #[clap(short, long)]
        output: Option<String>,
    },

    /// Assemble 6502 source to a PRG loaded at its origin
    Asm {
        /// Input file
        input: String,

        /// Output file [default: input with .prg extension]
        #[clap(short, long)]
        output: Option<String>,

        /// Origin when the source sets none ($C000, 0xC000 or decimal)
        #[clap(long, value_parser = parse_address)]
        origin: Option<u16>,

        /// Reject `.org` / `*=` in the source
        #[clap(long)]
        no_org: bool,

        /// Dump assembly listing
        #[clap(short, long)]
        dump: bool,
    },

    /// Assemble 6502 source into a PRG that starts with `RUN`
    Run {
        /// Input file
        input: String,

        /// Output file [default: input with .prg extension]
        #[clap(short, long)]
        output: Option<String>,

        /// Write a YAML build report
        #[clap(long)]
        report: Option<String>,

        /// Dump assembly listing
        #[clap(short, long)]
        dump: bool,
    },

    /// Decompile a PRG
    List {
        /// Input PRG file
        input: String,

        /// auto, basic or disasm
        #[clap(short, long, default_value = "auto")]
        mode: ListMode,

        /// First address to disassemble
        #[clap(long, value_parser = parse_address)]
        start: Option<u16>,

        /// Number of bytes to disassemble
        #[clap(long, value_parser = parse_count)]
        length: Option<usize>,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    entry: u16,
    size_bytes: usize,
    strategy: Strategy,
    origin: u16,
    explicit_origin: bool,
    symbols: &'a SymbolTable,
}

// ----------------------------------------------------------------------------

fn parse_number(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix('$') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|e| format!("`{s}`: {e}"))
}

fn parse_address(s: &str) -> std::result::Result<u16, String> {
    let value = parse_number(s)?;
    u16::try_from(value).map_err(|_| format!("`{s}` is outside $0000-$FFFF"))
}

fn parse_count(s: &str) -> std::result::Result<usize, String> {
    parse_number(s).map(|n| n as usize)
}

fn output_path(input: &str, output: Option<String>) -> String {
    output.unwrap_or_else(|| Path::new(input).with_extension("prg").display().to_string())
}

fn read_source(path: &str) -> Result<String> {
    println!("  < {}", path);
    std::fs::read_to_string(path).map_err(|e| ErrorKind::FileOpen(path.to_string(), e).into())
}

fn write_file(path: &str, contents: &[u8]) -> Result<()> {
    println!("  > {}", path);
    std::fs::write(path, contents).map_err(|e| ErrorKind::FileWrite(path.to_string(), e).into())
}

// ----------------------------------------------------------------------------

fn basic(source: &str, output: &str) -> Result<()> {
    println!("2. Tokenize & Link Lines");
    let prg = compile_basic_v2(source)?;
    println!("3. Write PRG ({} bytes)", prg.len());
    write_file(output, &prg)
}

fn asm(source: &str, output: &str, origin: Option<u16>, no_org: bool, dump: bool) -> Result<()> {
    println!("2. Assemble");
    let image = assemble(source, origin, no_org)?;
    image.warnings.iter().for_each(Warning::print);
    println!(
        "  origin ${:04X}{}, {} bytes",
        image.origin,
        if image.explicit_origin { " (source)" } else { "" },
        image.bytes.len()
    );
    if dump {
        print_dump(&image, source);
        print_symbols(&image);
    }
    println!("3. Write PRG");
    write_file(output, &image.to_prg().to_bytes())
}

fn run(source: &str, output: &str, report: Option<String>, dump: bool) -> Result<()> {
    println!("2. Assemble & Select Strategy");
    let runnable = build_runnable_prg(source)?;
    runnable.image.warnings.iter().for_each(Warning::print);
    println!(
        "  strategy {}, entry ${:04X}, {} bytes",
        runnable.strategy, runnable.entry, runnable.size_bytes
    );
    if runnable.strategy == Strategy::Poke {
        cprintln!(
            "<y,s>warning</>: source sets origin ${:04X}; using a DATA loader",
            runnable.image.origin
        );
    }
    if dump {
        print_dump(&runnable.image, source);
        print_symbols(&runnable.image);
    }
    println!("3. Write PRG");
    write_file(output, &runnable.prg)?;

    if let Some(path) = report {
        let report = Report {
            entry: runnable.entry,
            size_bytes: runnable.size_bytes,
            strategy: runnable.strategy,
            origin: runnable.image.origin,
            explicit_origin: runnable.image.explicit_origin,
            symbols: &runnable.image.symbols,
        };
        write_file(&path, serde_yaml::to_string(&report)?.as_bytes())?;
    }
    Ok(())
}

fn list(input: &str, mode: ListMode, start: Option<u16>, length: Option<usize>) -> Result<()> {
    let bytes = std::fs::read(input).map_err(|e| ErrorKind::FileOpen(input.to_string(), e))?;
    let prg = Prg::parse(&bytes)?;
    println!("; load ${:04X}, {} bytes", prg.load_address, prg.payload.len());

    match mode.resolve(&prg) {
        ListMode::Basic => {
            let (lines, end) = parse_basic_prg(&prg)?;
            for line in &lines {
                println!("{line}");
            }
            println!("; end ${:04X}", end);
        }
        _ => {
            for row in disassemble(&prg, start, length)? {
                println!("{row}");
            }
        }
    }
    Ok(())
}

impl Command {
    fn input(&self) -> &str {
        match self {
            Command::Basic { input, .. }
            | Command::Asm { input, .. }
            | Command::Run { input, .. }
            | Command::List { input, .. } => input,
        }
    }
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    let input = args.command.input().to_string();

    if let Command::List {
        mode,
        start,
        length,
        ..
    } = args.command
    {
        if let Err(err) = list(&input, mode, start, length) {
            fail(&input, "", err);
        }
        return;
    }

    println!("C64 Toolchain by kanade-k-1228");
    println!("1. Read Source");
    let source = read_source(&input).unwrap_or_else(|err| fail(&input, "", err));

    let result = match args.command {
        Command::Basic { output, .. } => basic(&source, &output_path(&input, output)),
        Command::Asm {
            output,
            origin,
            no_org,
            dump,
            ..
        } => asm(&source, &output_path(&input, output), origin, no_org, dump),
        Command::Run {
            output,
            report,
            dump,
            ..
        } => run(&source, &output_path(&input, output), report, dump),
        Command::List { .. } => Ok(()),
    };
    if let Err(err) = result {
        fail(&input, &source, err);
    }
}

fn fail(file: &str, source: &str, err: Error) -> ! {
    err.print_diag(file, source);
    if err.is_internal() {
        cprintln!("<y,s>note</>: this is an assembler bug, not a problem with the source");
    }
    std::process::exit(1);
}
