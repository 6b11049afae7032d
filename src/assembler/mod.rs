pub mod model;
pub mod phases;

use crate::spec::lang::{Lang, Mnemonic};
use itertools::Itertools;
use model::{EncodedInst, SymbolTable};
use phases::parse::{self, Cursor};
use phases::tokenize::Token;
use phases::types::{Loc, Located};
use phases::{encode, tokenize};
use std::fmt::{self, Display};

/*
    The translation pipeline, leaves first:

        1.  Tokenization: the whole source is scanned once into a flat,
            `Eof`-terminated token sequence. Unmatched characters become
            in-stream scan-error tokens rather than aborting the scan.

        2.  Driving: the token sequence is walked line by line. A leading
            identifier either names a mnemonic (an instruction line) or is
            followed by ':' (a label declaration). Instruction lines hand
            their remaining tokens to the operand parser, then their
            operands to the mnemonic's encoder; the encoded records
            accumulate in order. Label declarations bind the name to the
            current record count and emit nothing.

    Translation is fail-fast: the first parse or code-generation error
    aborts the walk. The records emitted before the failure are handed
    back alongside the error so callers can still surface the partial
    listing.
*/

#[derive(Debug, PartialEq)]
pub enum Error {
    Parse(Located<parse::Error>),
    Encode(Located<encode::Error>),
}

impl From<Located<parse::Error>> for Error {
    fn from(err: Located<parse::Error>) -> Self {
        Error::Parse(err)
    }
}

impl From<Located<encode::Error>> for Error {
    fn from(err: Located<encode::Error>) -> Self {
        Error::Encode(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parse error: {}", err),
            Error::Encode(err) => write!(f, "code generation error: {}", err),
        }
    }
}

/// A failed run: the records successfully encoded before the error, plus
/// the error itself.
#[derive(Debug, PartialEq)]
pub struct Failure {
    pub listing: Vec<EncodedInst>,
    pub error: Error,
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

pub fn assemble(source: &str) -> Result<Vec<EncodedInst>, Failure> {
    let tokens = tokenize(source);
    let mut cursor = Cursor::new(&tokens);
    let mut labels = SymbolTable::new();
    let mut listing = Vec::new();

    while cursor.peek().value() != &Token::Eof {
        if let Err(error) = translate_line(&mut cursor, &mut labels, &mut listing) {
            return Err(Failure { listing, error });
        }
    }

    Ok(listing)
}

/// Renders the listing as it appears on stdout, one bit-field line per
/// instruction.
pub fn render_listing(listing: &[EncodedInst]) -> String {
    listing.iter().map(ToString::to_string).join("\n")
}

fn translate_line(
    cursor: &mut Cursor<'_>,
    labels: &mut SymbolTable,
    listing: &mut Vec<EncodedInst>,
) -> Result<(), Error> {
    let first = cursor.peek();
    match first.value() {
        Token::Ident(name) => match Lang::get().lookup_mnemonic(name) {
            Some(mn) => {
                let loc = first.loc();
                cursor.advance();
                let inst = instruction_line(cursor, mn, loc, labels)?;
                listing.push(inst);
                Ok(())
            }
            None => {
                let name = name.clone();
                cursor.advance();
                if !cursor.eat(&Token::Colon) {
                    let found = cursor.peek();
                    return Err(Located::with_loc(
                        found.loc(),
                        parse::Error::MissingLabelColon(name, found.value().clone()),
                    )
                    .into());
                }
                // The label binds to the address the *next* instruction
                // will occupy; declarations never advance the counter.
                if !labels.declare(name.clone(), listing.len()) {
                    return Err(
                        Located::with_loc(first.loc(), parse::Error::DuplicateLabel(name)).into(),
                    );
                }
                Ok(())
            }
        },
        Token::ScanError(msg) => {
            Err(Located::with_loc(first.loc(), parse::Error::Scan(msg.clone())).into())
        }
        token => {
            Err(Located::with_loc(first.loc(), parse::Error::UnexpectedToken(token.clone())).into())
        }
    }
}

fn instruction_line(
    cursor: &mut Cursor<'_>,
    mn: &'static Mnemonic,
    loc: Loc,
    labels: &SymbolTable,
) -> Result<EncodedInst, Error> {
    let operands = parse::parse_operand_list(cursor)?;
    encode::encode(mn, &operands, labels)
        .map_err(|err| Located::with_loc(loc, err))
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(source: &str) -> Vec<String> {
        assemble(source)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn one_record_per_instruction_line() {
        assert_eq!(
            listing("nop; add ax 1; hlt;"),
            vec![
                "00000 000 00000000 00000000",
                "00001 010 00000001 00000001",
                "11111 000 00000000 00000000",
            ]
        );
    }

    #[test]
    fn labels_do_not_advance_the_address_counter() {
        // `nop` sits at 0, so both labels bind to 1: the `jmp` itself.
        let insts = assemble("nop; here: also: jmp here; hlt;").unwrap();
        assert_eq!(insts.len(), 3);
        assert_eq!(insts[1].params(), (1, 0));
    }

    #[test]
    fn partial_listing_survives_a_late_error() {
        let failure = assemble("nop; push;").unwrap_err();
        assert_eq!(failure.listing.len(), 1);
        match failure.error {
            Error::Encode(err) => assert_eq!(
                err.into_value(),
                encode::Error::MissingOperands {
                    mnemonic: "push",
                    expected: 1,
                    found: 0
                }
            ),
            err => panic!("expected a code generation error, got {}", err),
        }
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let failure = assemble("spot: nop; spot: hlt;").unwrap_err();
        match failure.error {
            Error::Parse(err) => assert_eq!(
                err.into_value(),
                parse::Error::DuplicateLabel("spot".to_owned())
            ),
            err => panic!("expected a parse error, got {}", err),
        }
    }

    #[test]
    fn label_without_colon_is_a_parse_error() {
        let failure = assemble("oops nop;").unwrap_err();
        match failure.error {
            Error::Parse(err) => assert_eq!(
                err.into_value(),
                parse::Error::MissingLabelColon("oops".to_owned(), Token::Ident("nop".to_owned()))
            ),
            err => panic!("expected a parse error, got {}", err),
        }
    }

    #[test]
    fn stray_leading_token_is_a_parse_error() {
        let failure = assemble("; nop;").unwrap_err();
        match failure.error {
            Error::Parse(err) => {
                assert_eq!(
                    err.into_value(),
                    parse::Error::UnexpectedToken(Token::Semicolon)
                );
            }
            err => panic!("expected a parse error, got {}", err),
        }
    }

    #[test]
    fn render_joins_lines() {
        let insts = assemble("push 1; push 2;").unwrap();
        assert_eq!(
            render_listing(&insts),
            "10011 010 00000001 00000000\n10011 010 00000010 00000000"
        );
    }
}
