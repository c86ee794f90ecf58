//! Reel symbols for measured bits.

use crate::core::UnitId;

/// The eight reel symbols, in reel order.
pub const REEL: [&str; 8] = ["🍒", "🍋", "🍊", "🍇", "⭐", "💎", "7️⃣", "🔔"];

/// Turns a measured bit of a unit into its display symbol.
pub trait SymbolMapper: Send + Sync {
    fn symbol_for_bit(&self, unit: UnitId, bit: u8) -> String;

    /// Every symbol this mapper can produce, for status reporting.
    fn symbols(&self) -> Vec<String>;
}

/// The default mapping: bit 0 shows 🍒, bit 1 shows ⭐ on every reel.
///
/// A bit lands half a reel further on, so `bit * 4 mod 8` indexes [`REEL`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ReelSymbols;

impl SymbolMapper for ReelSymbols {
    fn symbol_for_bit(&self, _unit: UnitId, bit: u8) -> String {
        let stride = REEL.len() / 2;
        REEL[(bit as usize * stride) % REEL.len()].to_string()
    }

    fn symbols(&self) -> Vec<String> {
        REEL.iter().map(|s| s.to_string()).collect()
    }
}
