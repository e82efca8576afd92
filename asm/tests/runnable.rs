use c64asm::listing::{disassemble, parse_basic_prg};
use c64asm::prg::auto_run_stub;
use c64asm::{build_runnable_prg, Prg, Strategy};

#[test]
fn append_after_stub() {
    let runnable = build_runnable_prg("lda #$41\nsta $0400\nrts").unwrap();
    let (_, stub_entry) = auto_run_stub().unwrap();
    assert_eq!(runnable.strategy, Strategy::Append);
    assert_eq!(runnable.entry, stub_entry);
    assert_eq!(runnable.size_bytes, runnable.prg.len());

    let prg = Prg::parse(&runnable.prg).unwrap();
    assert_eq!(prg.load_address, 0x0801);
    let (lines, end) = parse_basic_prg(&prg).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].to_string(), format!("10 SYS {stub_entry}"));
    assert_eq!(end, stub_entry as u32);

    let code = &runnable.prg[runnable.prg.len() - 6..];
    assert_eq!(code, [0xA9, 0x41, 0x8D, 0x00, 0x04, 0x60]);
}

#[test]
fn labels_resolve_at_stub_entry() {
    let runnable = build_runnable_prg("start: jmp start").unwrap();
    let entry = runnable.entry.to_le_bytes();
    assert_eq!(runnable.prg[runnable.prg.len() - 3..], [0x4C, entry[0], entry[1]]);
    assert_eq!(runnable.image.symbols.get("start"), Some(runnable.entry as i32));
}

#[test]
fn origin_at_stub_entry_appends() {
    let (_, stub_entry) = auto_run_stub().unwrap();
    let runnable = build_runnable_prg(&format!("* = {stub_entry}\nrts")).unwrap();
    assert_eq!(runnable.strategy, Strategy::Append);
}

#[test]
fn explicit_origin_pokes() {
    let runnable = build_runnable_prg("*=$C000\nlda #$41\nsta $0400\nrts").unwrap();
    assert_eq!(runnable.strategy, Strategy::Poke);
    assert_eq!(runnable.entry, 0xC000);

    let prg = Prg::parse(&runnable.prg).unwrap();
    let (lines, _) = parse_basic_prg(&prg).unwrap();
    let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    assert_eq!(
        text,
        [
            "10 FOR I=0 TO 5:READ B:POKE 49152+I,B:NEXT I",
            "20 SYS 49152",
            "100 DATA 169,65,141,0,4,96",
        ]
    );
}

#[test]
fn loader_chunks_data() {
    let source = format!("*=$C000\n.text \"{}\"", "A".repeat(40));
    let runnable = build_runnable_prg(&source).unwrap();
    let prg = Prg::parse(&runnable.prg).unwrap();
    let (lines, _) = parse_basic_prg(&prg).unwrap();
    let numbers: Vec<u16> = lines.iter().map(|l| l.number).collect();
    assert_eq!(numbers, [10, 20, 100, 110, 120]);
}

#[test]
fn assembly_errors_propagate() {
    let err = build_runnable_prg("nop\njmp nowhere").unwrap_err();
    assert_eq!(err.line, Some(2));
}

#[test]
fn disassembles_appended_code() {
    let runnable = build_runnable_prg("ldx #0\nloop: inx\nbne loop\nrts").unwrap();
    let prg = Prg::parse(&runnable.prg).unwrap();
    let rows = disassemble(&prg, Some(runnable.entry), None).unwrap();
    let text: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
    let target = format!("BNE ${:04X}", runnable.entry + 2);
    assert_eq!(text, ["LDX #$00", "INX", target.as_str(), "RTS"]);
}

#[test]
fn strategy_serializes_lowercase() {
    assert_eq!(serde_yaml::to_string(&Strategy::Poke).unwrap(), "poke\n");
}
