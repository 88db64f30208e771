//! This AST describes a parsed LMC source file.
//!
//! Execution begins with the first instruction in the file.
//! Comments are prefixed with double slashes (//) and are single-line only.
//! Statements are delimited by newlines.
//!
//! Supported Instructions:
//!
//! ```nasm
//! ADD ADDR   ; ACC <= ACC + mem[ADDR]
//! SUB ADDR   ; ACC <= ACC - mem[ADDR]
//! STA ADDR   ; mem[ADDR] <= ACC
//! LDA ADDR   ; ACC <= mem[ADDR]
//! BRA LABEL  ; Unconditionally jump to LABEL
//! BRZ LABEL  ; Jump to LABEL if ACC is zero
//! BRP LABEL  ; Jump to LABEL if ACC is zero or positive
//! INP        ; Read one ASCII digit from stdin into ACC
//! OUT        ; Print ACC to stdout in decimal, with a newline
//! HLT        ; Terminate the program with a success status
//! NAME DAT N ; Declare a memory cell NAME initialized to N
//! ```
//!
//! Example source file:
//!
//! ```nasm
//! // Count down from the input digit to zero.
//! LOOP    LDA COUNT
//!         OUT
//!         SUB ONE
//!         STA COUNT
//!         BRP LOOP
//!         HLT
//! COUNT   DAT 9
//! ONE     DAT 1
//! ```
//!
//! A label may sit on the same line as its instruction or alone on a
//! preceding line. Mnemonics and labels are case-sensitive.

use std::collections::VecDeque;
use std::fmt;

/// The ten reserved operation words. Keeping these as a closed enum
/// (rather than comparing strings in the code generator) means the
/// generator's template match is checked for exhaustiveness.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    ADD,
    SUB,
    STA,
    LDA,
    BRA,
    BRZ,
    BRP,
    INP,
    OUT,
    HLT,
}

impl Mnemonic {
    /// Maps a reserved word to its mnemonic. The comparison is
    /// case-sensitive; anything that doesn't match is a label.
    pub fn parse(word: &str) -> Option<Self> {
        use Mnemonic::*;
        match word {
            "ADD" => Some(ADD),
            "SUB" => Some(SUB),
            "STA" => Some(STA),
            "LDA" => Some(LDA),
            "BRA" => Some(BRA),
            "BRZ" => Some(BRZ),
            "BRP" => Some(BRP),
            "INP" => Some(INP),
            "OUT" => Some(OUT),
            "HLT" => Some(HLT),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use Mnemonic::*;
        match self {
            ADD => "ADD",
            SUB => "SUB",
            STA => "STA",
            LDA => "LDA",
            BRA => "BRA",
            BRZ => "BRZ",
            BRP => "BRP",
            INP => "INP",
            OUT => "OUT",
            HLT => "HLT",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a statement does: either one of the ten instructions, or the
/// DAT directive declaring an initialized memory cell.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Operation {
    Ins(Mnemonic),
    Dat,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Ins(m) => write!(f, "{}", m),
            Operation::Dat => write!(f, "DAT"),
        }
    }
}

/// An instruction argument, kept as the verbatim source text. Numeric
/// operands are never parsed here - the target assembler does that.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Num(String),
    Label(String),
}

impl Operand {
    pub fn text(&self) -> &str {
        match self {
            Operand::Num(s) | Operand::Label(s) => s,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// One logical source line: an optional label, an operation, and an
/// optional operand.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Statement {
    pub label: Option<String>,
    pub op: Operation,
    pub operand: Option<Operand>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(f, "{}", self.op)?;
        if let Some(operand) = &self.operand {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// The ordered statement list extracted from one source file. Order is
/// significant: it becomes instruction order in the output.
pub type Program = VecDeque<Statement>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_parse() {
        assert_eq!(Mnemonic::parse("ADD"), Some(Mnemonic::ADD));
        assert_eq!(Mnemonic::parse("SUB"), Some(Mnemonic::SUB));
        assert_eq!(Mnemonic::parse("STA"), Some(Mnemonic::STA));
        assert_eq!(Mnemonic::parse("LDA"), Some(Mnemonic::LDA));
        assert_eq!(Mnemonic::parse("BRA"), Some(Mnemonic::BRA));
        assert_eq!(Mnemonic::parse("BRZ"), Some(Mnemonic::BRZ));
        assert_eq!(Mnemonic::parse("BRP"), Some(Mnemonic::BRP));
        assert_eq!(Mnemonic::parse("INP"), Some(Mnemonic::INP));
        assert_eq!(Mnemonic::parse("OUT"), Some(Mnemonic::OUT));
        assert_eq!(Mnemonic::parse("HLT"), Some(Mnemonic::HLT));

        // Mnemonics are case-sensitive; DAT is not a mnemonic.
        assert_eq!(Mnemonic::parse("add"), None);
        assert_eq!(Mnemonic::parse("DAT"), None);
        assert_eq!(Mnemonic::parse("ADDER"), None);
        assert_eq!(Mnemonic::parse(""), None);
    }

    #[test]
    fn test_statement_display() {
        let stmt = Statement {
            label: Some("LOOP".to_owned()),
            op: Operation::Ins(Mnemonic::ADD),
            operand: Some(Operand::Label("X".to_owned())),
        };
        assert_eq!(format!("{}", stmt), "LOOP: ADD X");

        let stmt = Statement {
            label: None,
            op: Operation::Ins(Mnemonic::HLT),
            operand: None,
        };
        assert_eq!(format!("{}", stmt), "HLT");

        let stmt = Statement {
            label: Some("VAL".to_owned()),
            op: Operation::Dat,
            operand: Some(Operand::Num("42".to_owned())),
        };
        assert_eq!(format!("{}", stmt), "VAL: DAT 42");
    }
}
