// src/core/unit.rs

use super::constants::qspin_constants::{NUM_UNITS, STATE_DIM};
use super::error::{QspinError, Result};
use std::fmt;

/// Index of one binary unit in the register (0, 1 or 2).
///
/// Unit 0 is the most significant bit of an [`Outcome`], so the bitstring
/// `"b0b1b2"` reads left to right in unit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

impl UnitId {
    /// All units of the register in ascending order.
    pub const ALL: [UnitId; NUM_UNITS] = [UnitId(0), UnitId(1), UnitId(2)];

    /// Bit position of this unit inside an outcome index, counted from the right.
    pub(crate) fn bit_position(self) -> Result<usize> {
        if self.0 >= NUM_UNITS {
            return Err(QspinError::InvalidOperation {
                message: format!("{} is outside the {}-unit register", self, NUM_UNITS),
            });
        }
        Ok(NUM_UNITS - 1 - self.0)
    }

    /// Mask selecting this unit's bit inside an outcome index.
    pub(crate) fn mask(self) -> Result<usize> {
        Ok(1 << self.bit_position()?)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U({})", self.0)
    }
}

/// One measured configuration of all three units, `0b000..=0b111`.
/// Defaults to `000`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Outcome(u8);

impl Outcome {
    /// Builds an outcome from its basis index. Fails for indices ≥ 8.
    pub fn new(index: usize) -> Result<Self> {
        if index >= STATE_DIM {
            return Err(QspinError::InvalidOperation {
                message: format!("Outcome index {} exceeds state dimension {}", index, STATE_DIM),
            });
        }
        Ok(Outcome(index as u8))
    }

    /// Every outcome in ascending bitstring order, "000" first.
    pub fn all() -> impl Iterator<Item = Outcome> {
        (0..STATE_DIM as u8).map(Outcome)
    }

    /// Parses a three-character bitstring such as `"101"`.
    pub fn from_bitstring(bits: &str) -> Result<Self> {
        if bits.len() != NUM_UNITS || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(QspinError::InvalidOperation {
                message: format!("'{}' is not a {}-bit outcome", bits, NUM_UNITS),
            });
        }
        let index = usize::from_str_radix(bits, 2).map_err(|e| QspinError::InvalidOperation {
            message: format!("'{}' is not a binary string: {}", bits, e),
        })?;
        Outcome::new(index)
    }

    /// Basis index into the amplitude vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Measured bit of a single unit. Units outside the register read as 0.
    pub fn bit(self, unit: UnitId) -> u8 {
        match unit.bit_position() {
            Ok(pos) => (self.0 >> pos) & 1,
            Err(_) => 0,
        }
    }

    /// Bits in unit order: `[unit0, unit1, unit2]`.
    pub fn bits(self) -> [u8; NUM_UNITS] {
        UnitId::ALL.map(|unit| self.bit(unit))
    }

    /// Bitstring in unit order, e.g. `"011"`.
    pub fn bitstring(self) -> String {
        format!("{:03b}", self.0)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{:03b}>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_zero_is_most_significant() -> Result<()> {
        let outcome = Outcome::new(0b100)?;
        assert_eq!(outcome.bits(), [1, 0, 0]);
        assert_eq!(outcome.bitstring(), "100");
        assert_eq!(outcome.bit(UnitId(0)), 1);
        assert_eq!(outcome.bit(UnitId(2)), 0);
        Ok(())
    }

    #[test]
    fn test_bitstring_parsing() -> Result<()> {
        assert_eq!(Outcome::from_bitstring("011")?.index(), 3);
        assert!(Outcome::from_bitstring("0110").is_err());
        assert!(Outcome::from_bitstring("0a1").is_err());
        assert!(Outcome::new(8).is_err());
        Ok(())
    }

    #[test]
    fn test_unit_outside_register() {
        assert!(matches!(UnitId(3).mask(), Err(QspinError::InvalidOperation { .. })));
        assert_eq!(UnitId(1).mask().ok(), Some(0b010));
    }

    #[test]
    fn test_all_outcomes_ascending() {
        let strings: Vec<String> = Outcome::all().map(Outcome::bitstring).collect();
        assert_eq!(strings, ["000", "001", "010", "011", "100", "101", "110", "111"]);
    }
}
