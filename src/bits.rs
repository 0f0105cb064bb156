//! Bit-range helpers for single bytes
//!
//! All multi-bit fields in CTA-861 and DisplayID data blocks live inside one
//! byte, so these two functions cover every extraction the parsers need.

/// Extract the inclusive bit range `[low, high]` of `byte`, shifted down to bit 0.
pub fn extract_bits(byte: u8, high: u8, low: u8) -> u8 {
    debug_assert!(high <= 7);
    debug_assert!(low <= high);
    (byte >> low) & ((1u16 << (high - low + 1)) - 1) as u8
}

/// Test bit `index` of `byte`.
pub fn bit_is_set(byte: u8, index: u8) -> bool {
    debug_assert!(index <= 7);
    byte & (1 << index) != 0
}
