//! Odd parity helpers for line 21 byte pairs.
//!
//! Every EIA-608 byte carries 7 data bits and an odd parity bit in the MSB.

/// Returns true when `byte` has an odd number of set bits.
#[inline(always)]
pub const fn odd_parity(byte: u8) -> bool {
    byte.count_ones() & 1 == 1
}

/// Sets the MSB of a 7-bit value so that the result has odd parity.
#[inline(always)]
pub const fn with_odd_parity(byte: u8) -> u8 {
    let data = byte & 0x7F;
    if odd_parity(data) { data } else { data | 0x80 }
}

/// Strips the parity bit.
#[inline(always)]
pub const fn strip_parity(byte: u8) -> u8 {
    byte & 0x7F
}

#[test]
fn parity_table() {
    assert!(odd_parity(0x20));
    assert!(!odd_parity(0x14));
    assert!(!odd_parity(0x00));

    assert_eq!(with_odd_parity(0x14), 0x94);
    assert_eq!(with_odd_parity(0x20), 0x20);
    assert_eq!(with_odd_parity(b'H'), 0xC8);
    assert_eq!(with_odd_parity(b'i'), 0xE9);
    assert_eq!(with_odd_parity(0x2F), 0x2F);

    for b in 0..0x80u8 {
        let coded = with_odd_parity(b);
        assert!(odd_parity(coded));
        assert_eq!(strip_parity(coded), b);
    }
}
