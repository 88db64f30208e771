//! The codegen module lowers a Program into x86-64 NASM text.
//!
//! The output has a fixed shape: a data section holding a one-shot
//! input buffer, a newline constant, and one quadword cell per DAT
//! statement; then a text section holding the decimal print helper,
//! the `_start` entry point, and the translated instructions in source
//! order. Label resolution is left entirely to the target assembler.

use std::io::{self, Write};

use super::ast::{Mnemonic, Operation, Program, Statement};

/// Writes the complete target program to `sink`. Fails only if the
/// sink does; the translation itself is total.
pub fn generate<W: Write>(program: &Program, sink: &mut W) -> io::Result<()> {
    emit_data_section(program, sink)?;
    emit_text_section(program, sink)?;
    Ok(())
}

/// Pass A: the data section. The scratch buffer and newline constant
/// are always present; DAT statements become named quadword cells with
/// their operand text passed through verbatim.
fn emit_data_section<W: Write>(program: &Program, sink: &mut W) -> io::Result<()> {
    writeln!(sink, "section .data")?;
    writeln!(sink, "    input_buffer: resb 2")?;
    writeln!(sink, "    newline_char: db 0xA")?;

    for stmt in program.iter().filter(|s| s.op == Operation::Dat) {
        let name = match &stmt.label {
            Some(name) => name,
            None => {
                warn!("DAT without a label declares nothing; dropped");
                continue;
            }
        };
        let init = match &stmt.operand {
            Some(operand) => operand.text(),
            None => {
                warn!("DAT `{}` has no initializer, defaulting to 0", name);
                "0"
            }
        };
        writeln!(sink, "    {}: dq {}", name, init)?;
    }

    Ok(())
}

/// Pass B: the text section. The print helper and entry point are
/// emitted exactly once regardless of input, then every non-DAT
/// statement in source order.
fn emit_text_section<W: Write>(program: &Program, sink: &mut W) -> io::Result<()> {
    writeln!(sink)?;
    writeln!(sink, "section .text")?;
    writeln!(sink, "global _start")?;

    emit_print_helper(sink)?;

    writeln!(sink, "_start:")?;
    for stmt in program.iter().filter(|s| s.op != Operation::Dat) {
        emit_statement(stmt, sink)?;
    }

    Ok(())
}

/// The one subroutine in every generated program: prints rax as an
/// unsigned decimal followed by a newline, preserving the caller's
/// registers. Digits are pushed onto the stack least-significant
/// first, then popped and written one syscall apiece until the stack
/// pointer is back at the saved base.
fn emit_print_helper<W: Write>(sink: &mut W) -> io::Result<()> {
    writeln!(sink, "print_rax:")?;
    writeln!(sink, "    push rax")?;
    writeln!(sink, "    push rbx")?;
    writeln!(sink, "    push rcx")?;
    writeln!(sink, "    push rdx")?;
    writeln!(sink, "    push rbp")?;
    writeln!(sink, "    mov rbp, rsp")?;
    writeln!(sink, "    mov rbx, 10")?;
    writeln!(sink, "    .loop:")?;
    writeln!(sink, "    xor rdx, rdx")?;
    writeln!(sink, "    div rbx")?;
    writeln!(sink, "    add rdx, '0'")?;
    writeln!(sink, "    push rdx")?;
    writeln!(sink, "    cmp rax, 0")?;
    writeln!(sink, "    jne .loop")?;
    writeln!(sink, "    .print:")?;
    writeln!(sink, "    mov rax, 1")?;
    writeln!(sink, "    mov rdi, 1")?;
    writeln!(sink, "    mov rsi, rsp")?;
    writeln!(sink, "    mov rdx, 1")?;
    writeln!(sink, "    syscall")?;
    writeln!(sink, "    pop rax")?;
    writeln!(sink, "    cmp rsp, rbp")?;
    writeln!(sink, "    jne .print")?;
    writeln!(sink, "    mov rax, 1")?;
    writeln!(sink, "    mov rdi, 1")?;
    writeln!(sink, "    mov rsi, newline_char")?;
    writeln!(sink, "    mov rdx, 1")?;
    writeln!(sink, "    syscall")?;
    writeln!(sink, "    pop rbp")?;
    writeln!(sink, "    pop rdx")?;
    writeln!(sink, "    pop rcx")?;
    writeln!(sink, "    pop rbx")?;
    writeln!(sink, "    pop rax")?;
    writeln!(sink, "    ret")?;
    Ok(())
}

/// Emits one translated statement: its label marker if present, then
/// the fixed template for its mnemonic.
fn emit_statement<W: Write>(stmt: &Statement, sink: &mut W) -> io::Result<()> {
    if let Some(label) = &stmt.label {
        writeln!(sink, "{}:", label)?;
    }

    let mnemonic = match stmt.op {
        Operation::Ins(m) => m,
        // DAT was handled in the data pass.
        Operation::Dat => return Ok(()),
    };

    use Mnemonic::*;
    match mnemonic {
        ADD => {
            if let Some(addr) = address_operand(stmt) {
                writeln!(sink, "    add rax, [{}]", addr)?;
            }
        }
        SUB => {
            if let Some(addr) = address_operand(stmt) {
                writeln!(sink, "    sub rax, [{}]", addr)?;
            }
        }
        STA => {
            if let Some(addr) = address_operand(stmt) {
                writeln!(sink, "    mov [{}], rax", addr)?;
            }
        }
        LDA => {
            if let Some(addr) = address_operand(stmt) {
                writeln!(sink, "    mov rax, [{}]", addr)?;
            }
        }
        BRA => {
            if let Some(target) = address_operand(stmt) {
                writeln!(sink, "    jmp {}", target)?;
            }
        }
        BRZ => {
            if let Some(target) = address_operand(stmt) {
                writeln!(sink, "    cmp rax, 0")?;
                writeln!(sink, "    je {}", target)?;
            }
        }
        BRP => {
            if let Some(target) = address_operand(stmt) {
                writeln!(sink, "    cmp rax, 0")?;
                writeln!(sink, "    jge {}", target)?;
            }
        }
        INP => {
            // read(stdin, input_buffer, 2): the digit plus its newline.
            writeln!(sink, "    mov rax, 0")?;
            writeln!(sink, "    mov rdi, 0")?;
            writeln!(sink, "    mov rsi, input_buffer")?;
            writeln!(sink, "    mov rdx, 2")?;
            writeln!(sink, "    syscall")?;
            writeln!(sink, "    movzx rax, byte [input_buffer]")?;
            writeln!(sink, "    sub rax, '0'")?;
        }
        OUT => {
            writeln!(sink, "    mov rdi, rax")?;
            writeln!(sink, "    call print_rax")?;
        }
        HLT => {
            // exit(0)
            writeln!(sink, "    mov rax, 60")?;
            writeln!(sink, "    xor rdi, rdi")?;
            writeln!(sink, "    syscall")?;
        }
    }

    Ok(())
}

/// Returns the operand text for a mnemonic whose template needs an
/// address or branch target. Missing operands drop the instruction
/// with a warning rather than emitting malformed assembly.
fn address_operand(stmt: &Statement) -> Option<&str> {
    match &stmt.operand {
        Some(operand) => Some(operand.text()),
        None => {
            warn!("{} has no operand, no code emitted", stmt.op);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::scan;
    use crate::compiler::parser::Parser;

    fn compile(src: &str) -> String {
        let program = Parser::new(scan(src)).run();
        let mut out = Vec::new();
        generate(&program, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_fixed_scaffolding_always_present() {
        // Even an empty program carries the full scaffold, each piece
        // exactly once.
        for src in &["", "HLT\n", "INP\nOUT\nHLT\n", "// nothing\n"] {
            let out = compile(src);
            assert_eq!(count_occurrences(&out, "section .data"), 1);
            assert_eq!(count_occurrences(&out, "input_buffer: resb 2"), 1);
            assert_eq!(count_occurrences(&out, "newline_char: db 0xA"), 1);
            assert_eq!(count_occurrences(&out, "section .text"), 1);
            assert_eq!(count_occurrences(&out, "global _start"), 1);
            assert_eq!(count_occurrences(&out, "print_rax:"), 1);
            assert_eq!(count_occurrences(&out, "_start:"), 1);
        }
    }

    #[test]
    fn test_dat_goes_to_data_section_only() {
        let out = compile("LDA VAL\nHLT\nVAL DAT 42\n");
        assert!(out.contains("    VAL: dq 42\n"));

        // The declaration sits in .data; nothing for the DAT statement
        // appears after _start.
        let text_section = out.split("_start:").nth(1).unwrap();
        assert!(!text_section.contains("VAL:"));
        assert!(!text_section.contains("dq"));
    }

    #[test]
    fn test_dat_operand_text_is_verbatim() {
        // No numeric validation: the operand text goes straight
        // through to the target assembler.
        let out = compile("A DAT 007\nB DAT FOO\n");
        assert!(out.contains("    A: dq 007\n"));
        assert!(out.contains("    B: dq FOO\n"));
    }

    #[test]
    fn test_instruction_templates() {
        let out = compile("ADD X\n");
        assert!(out.contains("    add rax, [X]\n"));

        let out = compile("SUB X\n");
        assert!(out.contains("    sub rax, [X]\n"));

        let out = compile("STA X\n");
        assert!(out.contains("    mov [X], rax\n"));

        let out = compile("LDA X\n");
        assert!(out.contains("    mov rax, [X]\n"));

        let out = compile("BRA END\n");
        assert!(out.contains("    jmp END\n"));

        let out = compile("BRZ END\n");
        assert!(out.contains("    cmp rax, 0\n    je END\n"));

        let out = compile("BRP END\n");
        assert!(out.contains("    cmp rax, 0\n    jge END\n"));

        let out = compile("INP\n");
        assert!(out.contains("    movzx rax, byte [input_buffer]\n    sub rax, '0'\n"));

        let out = compile("OUT\n");
        assert!(out.contains("    mov rdi, rax\n    call print_rax\n"));
    }

    #[test]
    fn test_hlt_is_exit_zero_anywhere() {
        let exit_seq = "    mov rax, 60\n    xor rdi, rdi\n    syscall\n";

        let out = compile("HLT\n");
        assert!(out.contains(exit_seq));

        let out = compile("HLT\nOUT\nHLT\n");
        assert_eq!(count_occurrences(&out, exit_seq), 2);
    }

    #[test]
    fn test_labels_become_branch_targets() {
        let out = compile("LOOP SUB ONE\nBRP LOOP\nHLT\nONE DAT 1\n");
        let text_section = out.split("_start:").nth(1).unwrap();
        assert!(text_section.contains("LOOP:\n    sub rax, [ONE]\n"));
        assert!(text_section.contains("    jge LOOP\n"));
    }

    #[test]
    fn test_source_order_preserved() {
        let out = compile("INP\nSTA X\nLDA X\nOUT\nHLT\nX DAT 0\n");
        let text_section = out.split("_start:").nth(1).unwrap();
        let sta = text_section.find("mov [X], rax").unwrap();
        let lda = text_section.find("mov rax, [X]").unwrap();
        let out_call = text_section.find("call print_rax").unwrap();
        let hlt = text_section.find("mov rax, 60").unwrap();
        assert!(sta < lda && lda < out_call && out_call < hlt);
    }

    #[test]
    fn test_missing_operand_emits_nothing() {
        // `ADD` with no operand is dropped instead of producing
        // malformed assembly; the rest of the program is unaffected.
        let out = compile("ADD\nHLT\n");
        assert!(!out.contains("add rax"));
        assert!(out.contains("    mov rax, 60\n"));

        // Same for an unlabelled or uninitialized DAT.
        let out = compile("DAT 5\nVAL DAT\n");
        assert!(!out.contains("dq 5"));
        assert!(out.contains("    VAL: dq 0\n"));
    }

    #[test]
    fn test_idempotence() {
        let src = "// countdown\nLOOP LDA N\nOUT\nSUB ONE\nSTA N\nBRP LOOP\nHLT\nN DAT 9\nONE DAT 1\n";
        assert_eq!(compile(src), compile(src));
    }
}
