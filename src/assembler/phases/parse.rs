use super::tokenize::Token;
use super::types::{Loc, Located};
use crate::assembler::model::Operand;
use bitflags::bitflags;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No operand parse handler for the token (or its precedence was too
    /// low for the position it appeared in).
    NoOperandHandler(Token),
    /// An unmatched character reached the parser; carries the scanner's
    /// original diagnostic verbatim.
    Scan(String),
    ExpectedClosing(char, Token),
    PortWithoutDeref,
    MissingLabelColon(String, Token),
    UnexpectedToken(Token),
    DuplicateLabel(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoOperandHandler(tk) => {
                write!(f, "was not able to find an operand handler for {}", tk)
            }
            Error::Scan(msg) => write!(f, "{}", msg),
            Error::ExpectedClosing(ch, tk) => {
                write!(f, "expected '{}' after inner operand value, found {}", ch, tk)
            }
            Error::PortWithoutDeref => {
                write!(f, "a port qualifier requires a dereferenced operand")
            }
            Error::MissingLabelColon(name, tk) => write!(
                f,
                "identifier '{}' is neither a mnemonic nor a label declaration (expected ':', found {})",
                name, tk
            ),
            Error::UnexpectedToken(tk) => {
                write!(f, "expected a mnemonic or a label declaration, found {}", tk)
            }
            Error::DuplicateLabel(name) => write!(f, "label '{}' is already declared", name),
        }
    }
}

/// Read cursor over the token sequence. The sequence always ends with
/// `Eof` and the cursor never advances past it.
pub struct Cursor<'a> {
    tokens: &'a [Located<Token>],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Located<Token>]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(Located::value),
            Some(&Token::Eof)
        ));
        Cursor { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &'a Located<Token> {
        &self.tokens[self.pos]
    }

    pub fn advance(&mut self) -> &'a Located<Token> {
        let current = &self.tokens[self.pos];
        if current.value() != &Token::Eof {
            self.pos += 1;
        }
        current
    }

    /// Consumes the current token if it equals `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().value() == expected {
            self.advance();
            true
        } else {
            false
        }
    }
}

bitflags! {
    /// Addressing-mode bits accumulated while descending through the
    /// bracketing syntax; classified into an `Operand` once the descent
    /// returns.
    #[derive(Default)]
    struct AddrFlags: u8 {
        const DEREFERENCE = 1 << 0;
        const PORT        = 1 << 1;
        const IDENTIFIER  = 1 << 2;
    }
}

#[derive(Default)]
struct OperandBuilder {
    flags: AddrFlags,
    number: f64,
    name: Option<String>,
}

impl OperandBuilder {
    fn classify(self, loc: Loc) -> Result<Operand, Located<Error>> {
        const D: AddrFlags = AddrFlags::DEREFERENCE;
        const P: AddrFlags = AddrFlags::PORT;
        const I: AddrFlags = AddrFlags::IDENTIFIER;

        match (self.flags, self.name) {
            (f, None) if f == AddrFlags::empty() => Ok(Operand::Immediate(self.number)),
            (f, Some(name)) if f == I => Ok(Operand::Name(name)),
            (f, Some(name)) if f == I | D => Ok(Operand::DerefName(name)),
            (f, None) if f == D => Ok(Operand::ImmediateMem(self.number)),
            (f, None) if f == D | P => Ok(Operand::ImmediatePort(self.number)),
            (f, Some(name)) if f == I | D | P => Ok(Operand::DerefPort(name)),
            // The only combinations left carry PORT without DEREFERENCE.
            _ => Err(Located::with_loc(loc, Error::PortWithoutDeref)),
        }
    }
}

/// Precedence levels of the operand grammar, lowest first. Each bracketing
/// handler reparses its interior at the next level up, so nesting only
/// tightens: a parenthesis may wrap a bracket form, a bracket only a
/// primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Parenthesis,
    SqBrace,
    Primary,
}

enum Handler {
    Paren,
    Bracket,
    Primary,
}

fn handler_for(token: &Token) -> Option<(Handler, Precedence)> {
    match token {
        Token::LParen => Some((Handler::Paren, Precedence::Parenthesis)),
        Token::LSqBrace => Some((Handler::Bracket, Precedence::SqBrace)),
        Token::Ident(_) | Token::Number(_) => Some((Handler::Primary, Precedence::Primary)),
        _ => None,
    }
}

fn unhandled(token: &Located<Token>) -> Located<Error> {
    let err = match token.value() {
        Token::ScanError(msg) => Error::Scan(msg.clone()),
        tk => Error::NoOperandHandler(tk.clone()),
    };
    Located::with_loc(token.loc(), err)
}

fn parse_operand(
    cursor: &mut Cursor<'_>,
    out: &mut OperandBuilder,
    min: Precedence,
) -> Result<(), Located<Error>> {
    let current = cursor.peek();
    let (handler, precedence) = match handler_for(current.value()) {
        Some(entry) => entry,
        None => return Err(unhandled(current)),
    };
    if precedence < min {
        return Err(unhandled(current));
    }

    match handler {
        Handler::Paren => {
            cursor.advance();
            out.flags |= AddrFlags::PORT;
            parse_operand(cursor, out, Precedence::SqBrace)?;
            expect_closing(cursor, &Token::RParen, ')')
        }
        Handler::Bracket => {
            cursor.advance();
            out.flags |= AddrFlags::DEREFERENCE;
            parse_operand(cursor, out, Precedence::Primary)?;
            expect_closing(cursor, &Token::RSqBrace, ']')
        }
        Handler::Primary => {
            match cursor.advance().value() {
                Token::Ident(name) => {
                    out.name = Some(name.clone());
                    out.flags |= AddrFlags::IDENTIFIER;
                }
                Token::Number(v) => out.number = *v,
                _ => unreachable!(),
            }
            Ok(())
        }
    }
}

fn expect_closing(
    cursor: &mut Cursor<'_>,
    expected: &Token,
    ch: char,
) -> Result<(), Located<Error>> {
    if cursor.eat(expected) {
        Ok(())
    } else {
        let found = cursor.peek();
        Err(Located::with_loc(
            found.loc(),
            Error::ExpectedClosing(ch, found.value().clone()),
        ))
    }
}

/// Parses the operands of one instruction line: everything up to and
/// including a terminating `;`, or up to (but not including) `Eof`.
pub fn parse_operand_list(cursor: &mut Cursor<'_>) -> Result<Vec<Operand>, Located<Error>> {
    let mut operands = Vec::new();
    loop {
        match cursor.peek().value() {
            Token::Semicolon => {
                cursor.advance();
                return Ok(operands);
            }
            Token::Eof => return Ok(operands),
            _ => {
                let loc = cursor.peek().loc();
                let mut builder = OperandBuilder::default();
                parse_operand(cursor, &mut builder, Precedence::None)?;
                operands.push(builder.classify(loc)?);
            }
        }
    }
}
