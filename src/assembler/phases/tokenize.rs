use super::types::{Loc, Located};
use std::fmt::{self, Display};
use std::iter::Peekable;
use std::str::CharIndices;

/// The kinds of tokens the scanner can produce. Whether an identifier is a
/// mnemonic, a register, or a label is inferred later from context.
/// Scan failures are not raised here: an unmatched character becomes an
/// in-stream `ScanError` token carrying its diagnostic, and scanning
/// continues, so the error is reported only if translation reaches it.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Star,
    LBrace,
    RBrace,
    LSqBrace,
    RSqBrace,
    LParen,
    RParen,
    Semicolon,
    Colon,
    Ident(String),
    Number(f64),
    ScanError(String),
    Eof,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Star => write!(f, "'*'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LSqBrace => write!(f, "'['"),
            Token::RSqBrace => write!(f, "']'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Colon => write!(f, "':'"),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Number(v) => write!(f, "number {}", v),
            Token::ScanError(msg) => write!(f, "scan error ({})", msg),
            Token::Eof => write!(f, "end of file"),
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    line_start: usize,
    tokens: Vec<Located<Token>>,
}

/// Scans the whole source in one pass. Infallible: the result always ends
/// with exactly one `Eof` token.
pub fn tokenize(source: &str) -> Vec<Located<Token>> {
    Lexer {
        source,
        chars: source.char_indices().peekable(),
        line: 1,
        line_start: 0,
        tokens: Vec::new(),
    }
    .run()
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Vec<Located<Token>> {
        while let Some((idx, ch)) = self.chars.next() {
            match ch {
                '\n' => {
                    self.line += 1;
                    self.line_start = idx + 1;
                }
                ' ' | '\t' | '\r' => (),

                '*' => self.push(idx, Token::Star),
                '{' => self.push(idx, Token::LBrace),
                '}' => self.push(idx, Token::RBrace),
                '[' => self.push(idx, Token::LSqBrace),
                ']' => self.push(idx, Token::RSqBrace),
                '(' => self.push(idx, Token::LParen),
                ')' => self.push(idx, Token::RParen),
                ';' => self.push(idx, Token::Semicolon),
                ':' => self.push(idx, Token::Colon),

                ch if ch.is_ascii_alphabetic() => self.identifier(idx),
                ch if ch.is_ascii_digit() => self.number(idx),
                ch => self.push(
                    idx,
                    Token::ScanError(format!("was not able to match character '{}'", ch)),
                ),
            }
        }

        let end = self.source.len();
        self.push(end, Token::Eof);
        self.tokens
    }

    fn loc(&self, idx: usize) -> Loc {
        Loc::new(self.line, idx - self.line_start + 1)
    }

    fn push(&mut self, idx: usize, token: Token) {
        let loc = self.loc(idx);
        self.tokens.push(Located::with_loc(loc, token));
    }

    /// Consumes characters while `keep` holds and returns the end index of
    /// the run (the start character has already been consumed).
    fn run_end(&mut self, keep: fn(char) -> bool) -> usize {
        loop {
            match self.chars.peek().copied() {
                Some((_, ch)) if keep(ch) => {
                    self.chars.next();
                }
                Some((idx, _)) => return idx,
                None => return self.source.len(),
            }
        }
    }

    fn identifier(&mut self, start: usize) {
        let end = self.run_end(|ch| ch.is_ascii_alphanumeric());
        let name = self.source[start..end].to_owned();
        self.push(start, Token::Ident(name));
    }

    fn number(&mut self, start: usize) {
        let end = self.run_end(|ch| ch.is_ascii_digit());
        let raw = &self.source[start..end];
        let token = match raw.parse::<f64>() {
            Ok(v) => Token::Number(v),
            Err(err) => Token::ScanError(format!("could not parse numeric '{}': {}", raw, err)),
        };
        self.push(start, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .map(Located::into_value)
            .collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![Token::Eof]);
    }

    #[test]
    fn instruction_line() {
        assert_eq!(
            kinds("mov ax bx;"),
            vec![
                Token::Ident("mov".to_owned()),
                Token::Ident("ax".to_owned()),
                Token::Ident("bx".to_owned()),
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn addressing_punctuation() {
        assert_eq!(
            kinds("loadimm 5 ([ax]);"),
            vec![
                Token::Ident("loadimm".to_owned()),
                Token::Number(5.0),
                Token::LParen,
                Token::LSqBrace,
                Token::Ident("ax".to_owned()),
                Token::RSqBrace,
                Token::RParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn identifiers_take_trailing_digits() {
        assert_eq!(
            kinds("loop2:"),
            vec![Token::Ident("loop2".to_owned()), Token::Colon, Token::Eof]
        );
    }

    #[test]
    fn numbers_are_decimal_floats() {
        assert_eq!(kinds("255"), vec![Token::Number(255.0), Token::Eof]);
    }

    #[test]
    fn unmatched_character_does_not_stop_the_scan() {
        assert_eq!(
            kinds("@ nop;"),
            vec![
                Token::ScanError("was not able to match character '@'".to_owned()),
                Token::Ident("nop".to_owned()),
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn locations_are_one_based_per_line() {
        let tokens = tokenize("nop;\n  hlt;");
        assert_eq!(tokens[0].loc(), Loc::new(1, 1));
        assert_eq!(tokens[1].loc(), Loc::new(1, 4));
        assert_eq!(tokens[2].loc(), Loc::new(2, 3));
        assert_eq!(tokens[3].loc(), Loc::new(2, 6));
    }

    #[test]
    fn whitespace_variants_are_skipped() {
        assert_eq!(
            kinds("\tnop \r;\n"),
            vec![Token::Ident("nop".to_owned()), Token::Semicolon, Token::Eof]
        );
    }
}
