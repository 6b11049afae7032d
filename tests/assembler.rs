use graphite::assembler::{
    self,
    model::EncodedInst,
    phases::{
        encode, parse,
        types::{Loc, Located},
    },
    Error,
};

fn line(inst: &EncodedInst) -> String {
    inst.to_string()
}

#[test]
fn mov_between_registers() {
    let listing = assembler::assemble("mov ax bx;").unwrap();
    assert_eq!(listing, vec![EncodedInst::new(0b10001, 0b001, 1, 2)]);
    assert_eq!(line(&listing[0]), "10001 001 00000001 00000010");
}

#[test]
fn loadimm_into_a_writable_register() {
    assert_eq!(
        assembler::assemble("loadimm 5 ax;").unwrap(),
        vec![EncodedInst::new(0b10010, 0b001, 5, 1)]
    );
}

#[test]
fn backward_label_resolves_to_its_declaration_address() {
    assert_eq!(
        assembler::assemble("label: jmp label;").unwrap(),
        vec![EncodedInst::new(0b11101, 0b001, 0, 0)]
    );
}

#[test]
fn forward_references_are_unsupported() {
    let failure = assembler::assemble("jmp forward; forward: nop;").unwrap_err();
    assert!(failure.listing.is_empty());
    assert_eq!(
        failure.error,
        Error::Encode(Located::with_loc(
            Loc::new(1, 1),
            encode::Error::UnresolvedLabel("forward".to_owned())
        ))
    );
}

#[test]
fn address_counter_skips_label_lines() {
    // Three instruction lines, two label lines: addresses 0, 1, 2.
    let listing = assembler::assemble("nop; first: add ax 1; second: jmp first;").unwrap();
    assert_eq!(listing.len(), 3);
    assert_eq!(listing[2], EncodedInst::new(0b11101, 0b001, 1, 0));
}

#[test]
fn unmatched_character_is_reported_with_its_original_message() {
    let failure = assembler::assemble("nop; @ hlt;").unwrap_err();
    // The line before the bad character still made it out.
    assert_eq!(failure.listing.len(), 1);
    assert_eq!(
        failure.error,
        Error::Parse(Located::with_loc(
            Loc::new(1, 6),
            parse::Error::Scan("was not able to match character '@'".to_owned())
        ))
    );
}

#[test]
fn missing_operands_fail_cleanly() {
    let failure = assembler::assemble("push;").unwrap_err();
    assert_eq!(
        failure.error,
        Error::Encode(Located::with_loc(
            Loc::new(1, 1),
            encode::Error::MissingOperands {
                mnemonic: "push",
                expected: 1,
                found: 0
            }
        ))
    );
}

#[test]
fn memory_and_port_addresses_are_distinct_modes() {
    // `[n]` is an immediate memory address, `([n])` an immediate port.
    assert_eq!(
        assembler::assemble("add ax [5];").unwrap(),
        vec![EncodedInst::new(0b00001, 0b100, 1, 5)]
    );
    assert_eq!(
        assembler::assemble("add ax ([5]);").unwrap(),
        vec![EncodedInst::new(0b00001, 0b011, 1, 5)]
    );
}

#[test]
fn conditional_jump_carries_its_flag_literal() {
    assert_eq!(
        assembler::assemble("top: nop; cjmp top 6;").unwrap(),
        vec![
            EncodedInst::new(0b00000, 0, 0, 0),
            EncodedInst::new(0b11110, 0b001, 0, 6),
        ]
    );
}

#[test]
fn listings_are_deterministic() {
    let source = "start: loadimm 0 ax; loop: add ax 1; mov ax [7]; cjmp loop 2; hlt;";
    let first = assembler::assemble(source).unwrap();
    let second = assembler::assemble(source).unwrap();
    assert_eq!(
        assembler::render_listing(&first),
        assembler::render_listing(&second)
    );
}

#[test]
fn a_small_program_end_to_end() {
    let listing = assembler::assemble(
        "loadimm 10 ax;\n\
         loop: sub ax 1;\n\
         push ax;\n\
         cjmp loop 2;\n\
         reset stack;\n\
         hlt;\n",
    )
    .unwrap();

    assert_eq!(
        assembler::render_listing(&listing),
        "10010 001 00001010 00000001\n\
         00010 010 00000001 00000001\n\
         10011 001 00000001 00000000\n\
         11110 001 00000001 00000010\n\
         10101 011 00000000 00000000\n\
         11111 000 00000000 00000000"
    );
}
