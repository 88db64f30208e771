//! The Parser module takes a token stream (VecDeque<Token>) from the
//! lexer and converts it into a Program, one Statement per source line
//! that carries an operation.

use std::collections::VecDeque;

use super::ast::{Operand, Operation, Program, Statement};
use super::lexer::Token;

pub struct Parser {
    tokens: VecDeque<Token>,
    program: Program,
}

impl Parser {
    pub fn new(tokens: VecDeque<Token>) -> Self {
        Parser {
            tokens,
            program: Program::new(),
        }
    }

    /// Run the parser, consuming itself and returning the statement list.
    ///
    /// Never fails: a line with no recognizable operation produces no
    /// statement and is skipped with a warning. Every pass through the
    /// loop consumes at least one token, so the parse always terminates.
    pub fn run(mut self) -> Program {
        // A label alone on its line attaches to the next line that
        // carries an operation, so it has to survive the line boundary.
        let mut pending_label: Option<String> = None;

        loop {
            self.skip_newlines();
            if self.at_eof() {
                break;
            }

            // An optional label opens the line.
            if let Some(Token::Label(name, line)) = self.peek() {
                let (name, line) = (name.clone(), *line);
                self.consume();
                if let Some(old) = pending_label.replace(name) {
                    warn!("line {}: label `{}` was never attached to a statement", line, old);
                }
                // The label may have been alone on its line.
                self.skip_newlines();
            }

            match self.peek() {
                Some(&Token::Op(mnemonic, _)) => {
                    self.consume();
                    let operand = self.operand();
                    self.program.push_back(Statement {
                        label: pending_label.take(),
                        op: Operation::Ins(mnemonic),
                        operand,
                    });
                }
                Some(&Token::Dat(_)) => {
                    self.consume();
                    let operand = self.operand();
                    self.program.push_back(Statement {
                        label: pending_label.take(),
                        op: Operation::Dat,
                        operand,
                    });
                }
                Some(&Token::Eof(_)) | None => {
                    if let Some(label) = pending_label.take() {
                        warn!("label `{}` at end of input was never attached to a statement", label);
                    }
                    break;
                }
                Some(tok) => {
                    let line = tok.line();
                    warn!("line {}: no instruction found, skipping the rest of the line", line);
                    self.consume();
                }
            }

            self.skip_to_line_end();
        }

        self.program
    }

    /// Consumes the next token if it can serve as an operand.
    fn operand(&mut self) -> Option<Operand> {
        let operand = match self.peek() {
            Some(Token::Num(text, _)) => Operand::Num(text.clone()),
            Some(Token::Label(text, _)) => Operand::Label(text.clone()),
            _ => return None,
        };
        self.consume();
        Some(operand)
    }

    fn skip_newlines(&mut self) {
        while let Some(Token::Newline(_)) = self.peek() {
            self.consume();
        }
    }

    /// Drains whatever is left on the current line. The terminating
    /// Newline (or Eof) stays put for the main loop to observe.
    fn skip_to_line_end(&mut self) {
        while !matches!(
            self.peek(),
            Some(Token::Newline(_)) | Some(Token::Eof(_)) | None
        ) {
            self.consume();
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Some(Token::Eof(_)) | None)
    }

    #[inline]
    fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    /// Pops a token off the input stream and returns it.
    /// Returns None if no tokens are left.
    #[inline]
    fn consume(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }
}
