// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Line tokenizer for OpenQASM style gate listings.
//!
//! Only the structure needed for translation is extracted: the mnemonic and
//! the comma separated operands. Operands are parsed into [`ChannelRef`]s on
//! demand, so that lines with unknown mnemonics never fail to tokenize.

use crate::{Channel, Error, Result};

/// A `name[index]` operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub register: String,
    pub index: Channel,
}

impl ChannelRef {
    pub fn parse(operand: &str) -> Result<Self> {
        let malformed = || Error::MalformedLine(format!("expected 'name[index]', got '{operand}'"));
        let (register, rest) = operand.split_once('[').ok_or_else(malformed)?;
        let index = rest.strip_suffix(']').ok_or_else(malformed)?;
        let index = index.trim().parse::<Channel>().map_err(|_| malformed())?;
        let register = register.trim();
        if register.is_empty() {
            return Err(malformed());
        }
        Ok(ChannelRef {
            register: register.to_string(),
            index,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Quantum,
    Classical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateLine {
    /// Blank line or comment.
    Empty,
    /// `OPENQASM` version and `include` statements.
    Header,
    Declaration {
        kind: DeclarationKind,
        operands: Vec<String>,
    },
    Gate {
        mnemonic: String,
        operands: Vec<String>,
    },
}

fn split_operands(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn tokenize_line(line: &str) -> GateLine {
    let line = match line.split_once("//") {
        Some((code, _comment)) => code,
        None => line,
    };
    let line = line.trim().trim_end_matches(';').trim_end();
    let Some(mnemonic) = line.split_whitespace().next() else {
        return GateLine::Empty;
    };
    let operands = split_operands(line[mnemonic.len()..].trim());
    match mnemonic {
        "OPENQASM" | "include" => GateLine::Header,
        "qreg" => GateLine::Declaration {
            kind: DeclarationKind::Quantum,
            operands,
        },
        "creg" => GateLine::Declaration {
            kind: DeclarationKind::Classical,
            operands,
        },
        _ => GateLine::Gate {
            mnemonic: mnemonic.to_string(),
            operands,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_gate() {
        assert_eq!(
            tokenize_line("h q[3];"),
            GateLine::Gate {
                mnemonic: "h".to_string(),
                operands: vec!["q[3]".to_string()],
            }
        );
        assert_eq!(
            tokenize_line("  cx q[0], q[1]; // entangle"),
            GateLine::Gate {
                mnemonic: "cx".to_string(),
                operands: vec!["q[0]".to_string(), "q[1]".to_string()],
            }
        );
    }

    #[test]
    fn test_tokenize_non_gates() {
        assert_eq!(tokenize_line(""), GateLine::Empty);
        assert_eq!(tokenize_line("   // comment only"), GateLine::Empty);
        assert_eq!(tokenize_line("OPENQASM 2.0;"), GateLine::Header);
        assert_eq!(tokenize_line("include \"qelib1.inc\";"), GateLine::Header);
        assert!(matches!(
            tokenize_line("creg c[2];"),
            GateLine::Declaration {
                kind: DeclarationKind::Classical,
                ..
            }
        ));
    }

    #[test]
    fn test_channel_ref() {
        assert_eq!(
            ChannelRef::parse("q[12]").unwrap(),
            ChannelRef {
                register: "q".to_string(),
                index: 12
            }
        );
        assert_eq!(ChannelRef::parse("q[ 1 ]").unwrap().index, 1);
        for bad in ["q", "q[]", "q[x]", "[1]", "q[-1]", "q[1"] {
            assert!(
                matches!(ChannelRef::parse(bad), Err(Error::MalformedLine(_))),
                "{bad}"
            );
        }
    }
}
