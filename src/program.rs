use std::fmt;

use log::trace;

use crate::error::{Fault, ScanDirection};

pub const PLUS: u8 = b'+';
pub const MINUS: u8 = b'-';
pub const GREATER: u8 = b'>';
pub const LESS: u8 = b'<';
pub const DOT: u8 = b'.';
pub const COMMA: u8 = b',';
pub const LBRACKET: u8 = b'[';
pub const RBRACKET: u8 = b']';

/// The eight recognised instruction symbols.
pub const ALPHABET: [u8; 8] = [PLUS, MINUS, GREATER, LESS, DOT, COMMA, LBRACKET, RBRACKET];

/// The end marker. Input text is cut at the first occurrence.
const TERMINATOR: u8 = 0;

/// Returns true if the byte is one of the eight instructions (anything else is a no-op).
pub fn is_instruction(byte: u8) -> bool {
    ALPHABET.contains(&byte)
}

/// An immutable instruction sequence.
///
/// Positions `0..len()` hold instructions; `len()` itself is the terminator
/// position, which the program counter may reach but never pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    code: Vec<u8>,
}

impl Program {
    /// Build a program from source text, stopping at the first NUL byte.
    pub fn new(source: impl AsRef<[u8]>) -> Self {
        let source = source.as_ref();
        let end = source
            .iter()
            .position(|&b| b == TERMINATOR)
            .unwrap_or(source.len());
        Self {
            code: source[..end].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// The symbol at `pc`, or `None` at (or past) the terminator.
    pub fn fetch(&self, pc: usize) -> Option<u8> {
        self.code.get(pc).copied()
    }

    /// Find the `]` that closes the `[` at `pc`.
    ///
    /// Walks right with a depth counter: `[` adds one, `]` subtracts one,
    /// counting the starting bracket. Returns the position at which the
    /// counter is back to zero. A `pc` that does not hold `[` has no match.
    pub fn match_forward(&self, pc: usize) -> Result<usize, Fault> {
        let unmatched = Fault::UnmatchedBracket {
            position: pc,
            direction: ScanDirection::Forward,
        };
        if self.fetch(pc) != Some(LBRACKET) {
            return Err(unmatched);
        }
        let mut depth: i64 = 0;
        for (i, &byte) in self.code.iter().enumerate().skip(pc) {
            match byte {
                LBRACKET => depth += 1,
                RBRACKET => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                trace!("forward jump {pc} -> {i}");
                return Ok(i);
            }
        }
        Err(unmatched)
    }

    /// Find the `[` that opens the `]` at `pc`.
    ///
    /// Walks left with a depth counter: `]` adds one, `[` subtracts one,
    /// counting the starting bracket. Running past position 0 means there is
    /// no opener. A `pc` that does not hold `]` has no match.
    pub fn match_backward(&self, pc: usize) -> Result<usize, Fault> {
        let unmatched = Fault::UnmatchedBracket {
            position: pc,
            direction: ScanDirection::Backward,
        };
        if self.fetch(pc) != Some(RBRACKET) {
            return Err(unmatched);
        }
        let mut depth: i64 = 0;
        for i in (0..=pc).rev() {
            match self.code.get(i) {
                Some(&RBRACKET) => depth += 1,
                Some(&LBRACKET) => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                trace!("backward jump {pc} -> {i}");
                return Ok(i);
            }
        }
        Err(unmatched)
    }
}

impl fmt::Display for Program {
    /// Pretty-print the instructions with one loop body per indented line.
    /// No-op bytes are dropped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0usize;
        let mut line = String::new();
        for &byte in &self.code {
            match byte {
                LBRACKET => {
                    flush_line(f, &mut line, depth)?;
                    writeln!(f, "{}[", "  ".repeat(depth))?;
                    depth += 1;
                }
                RBRACKET => {
                    flush_line(f, &mut line, depth)?;
                    depth = depth.saturating_sub(1);
                    writeln!(f, "{}]", "  ".repeat(depth))?;
                }
                b if is_instruction(b) => line.push(b as char),
                _ => {}
            }
        }
        flush_line(f, &mut line, depth)
    }
}

fn flush_line(f: &mut fmt::Formatter<'_>, line: &mut String, depth: usize) -> fmt::Result {
    if !line.is_empty() {
        writeln!(f, "{}{}", "  ".repeat(depth), line)?;
        line.clear();
    }
    Ok(())
}

impl From<&str> for Program {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Balanced bracket programs with straight-line filler between brackets.
    fn balanced() -> impl Strategy<Value = String> {
        let leaf = "[+\\-<>.,a ]{0,4}";
        leaf.prop_recursive(6, 64, 4, |inner| {
            prop::collection::vec(inner, 1..4).prop_map(|parts| {
                let mut s = String::new();
                for (i, p) in parts.iter().enumerate() {
                    if i % 2 == 0 {
                        s.push('[');
                        s.push_str(p);
                        s.push(']');
                    } else {
                        s.push_str(p);
                    }
                }
                s
            })
        })
    }

    proptest! {
        #[test]
        fn scans_round_trip_on_balanced_programs(source in balanced()) {
            let program = Program::new(&source);
            for (pc, &byte) in program.as_bytes().iter().enumerate() {
                if byte == LBRACKET {
                    let close = program.match_forward(pc).unwrap();
                    prop_assert_eq!(program.fetch(close), Some(RBRACKET));
                    prop_assert_eq!(program.match_backward(close).unwrap(), pc);
                }
            }
        }

        #[test]
        fn scans_land_on_opposite_bracket(source in "[\\[\\]+a]{1,64}") {
            let program = Program::new(&source);
            for (pc, &byte) in program.as_bytes().iter().enumerate() {
                match byte {
                    LBRACKET => {
                        if let Ok(close) = program.match_forward(pc) {
                            prop_assert!(close > pc);
                            prop_assert_eq!(program.fetch(close), Some(RBRACKET));
                            prop_assert_eq!(program.match_backward(close), Ok(pc));
                        }
                    }
                    RBRACKET => {
                        if let Ok(open) = program.match_backward(pc) {
                            prop_assert!(open < pc);
                            prop_assert_eq!(program.fetch(open), Some(LBRACKET));
                            prop_assert_eq!(program.match_forward(open), Ok(pc));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
