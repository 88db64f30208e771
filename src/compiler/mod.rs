//! The Compiler module is in charge of taking an
//! LMC source file and producing x86-64 NASM text
//! for an external assembler and linker to finish.
//!
//! It does this with a three-stage pipeline: a simple
//! tokenizer, a per-line statement parser, and a
//! template-per-mnemonic code generator.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
