//! This lexer tokenizes LMC assembly.
use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::Chars;

use super::ast::Mnemonic;

// Tokens carry their lexeme (where one is meaningful) and the
// 1-based source line they appear on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Op(Mnemonic, usize),
    Dat(usize),
    Num(String, usize),
    Label(String, usize),
    Newline(usize),
    Eof(usize),
}

impl Token {
    pub fn line(&self) -> usize {
        use Token::*;
        match self {
            Op(_, line) | Dat(line) | Num(_, line) | Label(_, line) | Newline(line)
            | Eof(line) => *line,
        }
    }
}

/// Scans the whole source in one left-to-right pass. Never fails:
/// unrecognized characters are dropped with a warning, and the stream
/// always ends with exactly one Eof token.
///
/// The only lookahead is the single character needed to spot the
/// two-character comment marker.
pub fn scan(source: &str) -> VecDeque<Token> {
    let mut tokens: VecDeque<Token> = VecDeque::with_capacity(256);
    let mut chars = source.chars().peekable();
    let mut line: usize = 1;

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' => {
                chars.next();
                tokens.push_back(Token::Newline(line));
                line += 1;
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    // Discard the comment up to, but not including,
                    // the next line break.
                    while let Some(&c) = chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    warn!("line {}: skipping unrecognized character `/`", line);
                }
            }
            _ if c.is_ascii_digit() => {
                let tok = number(&mut chars, line);
                tokens.push_back(tok);
            }
            _ if is_ident_start(c) => {
                let tok = identifier(&mut chars, line);
                tokens.push_back(tok);
            }
            _ => {
                warn!("line {}: skipping unrecognized character `{}`", line, c);
                chars.next();
            }
        }
    }

    tokens.push_back(Token::Eof(line));
    tokens
}

/// Consumes a maximal run of decimal digits. No sign handling and no
/// radix prefixes - the lexeme is kept verbatim for the target assembler.
fn number(chars: &mut Peekable<Chars>, line: usize) -> Token {
    let mut lexeme = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        lexeme.push(c);
        chars.next();
    }
    Token::Num(lexeme, line)
}

/// Consumes a maximal identifier run and classifies it against the
/// reserved words. Doing the classification here means the parser only
/// ever tests token kinds.
fn identifier(chars: &mut Peekable<Chars>, line: usize) -> Token {
    let mut lexeme = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_continue(c) {
            break;
        }
        lexeme.push(c);
        chars.next();
    }
    classify(lexeme, line)
}

fn classify(word: String, line: usize) -> Token {
    if word == "DAT" {
        return Token::Dat(line);
    }
    match Mnemonic::parse(&word) {
        Some(op) => Token::Op(op, line),
        None => Token::Label(word, line),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
