use std::fmt;
use std::str::FromStr;

use crate::error::Fault;

/// What happens when the data pointer is moved past either end of the tape.
///
/// The policy is fixed per machine. Cell values are unaffected by it: they
/// always use two's-complement wrapping arithmetic.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// Fail the run with [`Fault::OutOfBoundsAccess`].
    #[default]
    Reject,
    /// Wrap modulo the tape capacity.
    Wrap,
    /// Clamp to the first or last cell.
    Saturate,
}

impl BoundsPolicy {
    /// Compute the data pointer after moving `delta` cells from `pointer`.
    ///
    /// `pointer` must already be in `[0, capacity)`.
    pub fn shift(self, pointer: usize, delta: isize, capacity: usize) -> Result<usize, Fault> {
        debug_assert!(pointer < capacity);
        let target = pointer as i64 + delta as i64;
        let cap = capacity as i64;
        if (0..cap).contains(&target) {
            return Ok(target as usize);
        }
        match self {
            Self::Reject => Err(Fault::OutOfBoundsAccess {
                index: target,
                capacity,
            }),
            Self::Wrap => Ok(target.rem_euclid(cap) as usize),
            Self::Saturate => Ok(target.clamp(0, cap - 1) as usize),
        }
    }
}

impl fmt::Display for BoundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Wrap => write!(f, "wrap"),
            Self::Saturate => write!(f, "saturate"),
        }
    }
}

/// An unrecognised bounds policy name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyParseError(String);

impl fmt::Display for PolicyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown bounds policy '{}', expected reject, wrap or saturate",
            self.0
        )
    }
}

impl std::error::Error for PolicyParseError {}

impl FromStr for BoundsPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "wrap" => Ok(Self::Wrap),
            "saturate" => Ok(Self::Saturate),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

/// The machine's linear memory: a fixed number of signed cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<i32>,
}

impl Tape {
    /// A zero-filled tape of `capacity` cells.
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![0; capacity],
        }
    }

    /// A tape with caller-supplied initial contents. Its capacity is `cells.len()`.
    pub fn from_cells(cells: Vec<i32>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<i32> {
        self.cells
    }

    pub fn read(&self, index: usize) -> Result<i32, Fault> {
        self.cells
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn write(&mut self, index: usize, value: i32) -> Result<(), Fault> {
        let fault = self.out_of_bounds(index);
        let cell = self.cells.get_mut(index).ok_or(fault)?;
        *cell = value;
        Ok(())
    }

    pub fn increment(&mut self, index: usize) -> Result<(), Fault> {
        let value = self.read(index)?;
        self.write(index, value.wrapping_add(1))
    }

    pub fn decrement(&mut self, index: usize) -> Result<(), Fault> {
        let value = self.read(index)?;
        self.write(index, value.wrapping_sub(1))
    }

    fn out_of_bounds(&self, index: usize) -> Fault {
        Fault::OutOfBoundsAccess {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            capacity: self.cells.len(),
        }
    }
}

impl fmt::Display for Tape {
    /// Prints the non-zero cells as `[i] value` lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &v) in self.cells.iter().enumerate() {
            if v != 0 {
                writeln!(f, "[{i}] {v}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tape_is_zeroed() {
        let tape = Tape::new(100);
        assert_eq!(tape.len(), 100);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_read_write_in_range() {
        let mut tape = Tape::new(4);
        tape.write(3, -7).unwrap();
        assert_eq!(tape.read(3), Ok(-7));
        assert_eq!(tape.cells(), &[0, 0, 0, -7]);
    }

    #[test]
    fn test_read_write_out_of_range() {
        let mut tape = Tape::new(4);
        let fault = Fault::OutOfBoundsAccess {
            index: 4,
            capacity: 4,
        };
        assert_eq!(tape.read(4), Err(fault));
        assert_eq!(tape.write(4, 1), Err(fault));
        assert_eq!(tape, Tape::new(4));
    }

    #[test]
    fn test_cell_arithmetic_wraps() {
        let mut tape = Tape::from_cells(vec![i32::MAX, i32::MIN]);
        tape.increment(0).unwrap();
        tape.decrement(1).unwrap();
        assert_eq!(tape.cells(), &[i32::MIN, i32::MAX]);
    }

    #[test]
    fn test_shift_in_range_ignores_policy() {
        for policy in [BoundsPolicy::Reject, BoundsPolicy::Wrap, BoundsPolicy::Saturate] {
            assert_eq!(policy.shift(5, 1, 10), Ok(6));
            assert_eq!(policy.shift(5, -1, 10), Ok(4));
        }
    }

    #[test]
    fn test_shift_reject() {
        assert_eq!(
            BoundsPolicy::Reject.shift(0, -1, 10),
            Err(Fault::OutOfBoundsAccess {
                index: -1,
                capacity: 10
            })
        );
        assert_eq!(
            BoundsPolicy::Reject.shift(9, 1, 10),
            Err(Fault::OutOfBoundsAccess {
                index: 10,
                capacity: 10
            })
        );
    }

    #[test]
    fn test_shift_wrap() {
        assert_eq!(BoundsPolicy::Wrap.shift(0, -1, 10), Ok(9));
        assert_eq!(BoundsPolicy::Wrap.shift(9, 1, 10), Ok(0));
    }

    #[test]
    fn test_shift_saturate() {
        assert_eq!(BoundsPolicy::Saturate.shift(0, -1, 10), Ok(0));
        assert_eq!(BoundsPolicy::Saturate.shift(9, 1, 10), Ok(9));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("wrap".parse::<BoundsPolicy>(), Ok(BoundsPolicy::Wrap));
        assert_eq!("Saturate".parse::<BoundsPolicy>(), Ok(BoundsPolicy::Saturate));
        assert_eq!("reject".parse::<BoundsPolicy>(), Ok(BoundsPolicy::Reject));
        assert!("clamp".parse::<BoundsPolicy>().is_err());
        assert_eq!(BoundsPolicy::Wrap.to_string(), "wrap");
    }

    #[test]
    fn test_display_skips_zero_cells() {
        let tape = Tape::from_cells(vec![0, 3, 0, -2]);
        assert_eq!(tape.to_string(), "[1] 3\n[3] -2\n");
    }
}
